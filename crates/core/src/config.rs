//! 설정 관리 — layerscan.toml 파싱 및 런타임 설정
//!
//! [`LayerscanConfig`]는 모든 extractor 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LAYERSCAN_DPKG_STATUS_PATH=...` 형식)
//! 2. 설정 파일 (`layerscan.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), layerscan_core::error::LayerscanError> {
//! use layerscan_core::config::LayerscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LayerscanConfig::load("layerscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LayerscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LayerscanError};

/// dpkg 상태 파일의 표준 위치 (레이어 루트 기준)
pub const DEFAULT_DPKG_STATUS_PATH: &str = "var/lib/dpkg/status";

/// 경로 길이 제한
const MAX_PATH_LEN: usize = 4096;

/// layerscan 통합 설정
///
/// `layerscan.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// dpkg extractor 설정
    #[serde(default)]
    pub dpkg: DpkgConfig,
}

impl LayerscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LayerscanError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LayerscanError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LayerscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LayerscanError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LayerscanError> {
        toml::from_str(toml_str).map_err(|e| {
            LayerscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LAYERSCAN_{SECTION}_{FIELD}`
    /// 예: `LAYERSCAN_DPKG_INSTALLED_STATES=installed,triggers-pending`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LAYERSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LAYERSCAN_GENERAL_LOG_FORMAT");

        // dpkg
        override_bool(&mut self.dpkg.enabled, "LAYERSCAN_DPKG_ENABLED");
        override_string(&mut self.dpkg.status_path, "LAYERSCAN_DPKG_STATUS_PATH");
        override_csv(
            &mut self.dpkg.installed_states,
            "LAYERSCAN_DPKG_INSTALLED_STATES",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LayerscanError> {
        self.general.validate()?;
        if self.dpkg.enabled {
            self.dpkg.validate()?;
        }
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

impl GeneralConfig {
    /// 로그 레벨과 형식을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

/// dpkg extractor 설정
///
/// # 필드
///
/// - **enabled**: 기본 레지스트리에 dpkg extractor를 포함할지 여부
/// - **status_path**: 레이어 루트 기준 상태 파일 경로
/// - **installed_states**: "설치됨"으로 간주할 dpkg 상태 단어 허용 목록
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DpkgConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 상태 파일 경로 (선행 `/` 없는 상대 경로)
    pub status_path: String,
    /// 설치됨으로 간주하는 상태 단어 (`Status: want flag state`의 state)
    pub installed_states: Vec<String>,
}

impl Default for DpkgConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            status_path: DEFAULT_DPKG_STATUS_PATH.to_owned(),
            installed_states: vec!["installed".to_owned()],
        }
    }
}

impl DpkgConfig {
    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `status_path`: 비어 있지 않은 상대 경로, `..` 컴포넌트 금지, 4096자 이하
    /// - `installed_states`: 하나 이상, 각 항목은 공백 없는 비어 있지 않은 단어
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.status_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dpkg.status_path".to_owned(),
                reason: "status_path must not be empty".to_owned(),
            });
        }

        if self.status_path.len() > MAX_PATH_LEN {
            return Err(ConfigError::InvalidValue {
                field: "dpkg.status_path".to_owned(),
                reason: format!("status_path exceeds maximum length {MAX_PATH_LEN}"),
            });
        }

        // 레이어 스냅샷 키는 루트 기준 상대 경로
        let path = Path::new(&self.status_path);
        if path.is_absolute() {
            return Err(ConfigError::InvalidValue {
                field: "dpkg.status_path".to_owned(),
                reason: format!(
                    "status_path '{}' must be relative to the layer root",
                    self.status_path
                ),
            });
        }

        if path.components().any(|c| c == Component::ParentDir) {
            return Err(ConfigError::InvalidValue {
                field: "dpkg.status_path".to_owned(),
                reason: format!(
                    "status_path '{}' contains path traversal pattern '..'",
                    self.status_path
                ),
            });
        }

        if self.installed_states.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dpkg.installed_states".to_owned(),
                reason: "at least one installed state required".to_owned(),
            });
        }

        for state in &self.installed_states {
            if state.is_empty() || state.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "dpkg.installed_states".to_owned(),
                    reason: format!("'{state}' must be a single non-empty word"),
                });
            }
        }

        Ok(())
    }
}

/// [`DpkgConfig`] 빌더
///
/// 빌드 시 유효성 검증을 수행합니다.
#[derive(Default)]
pub struct DpkgConfigBuilder {
    config: DpkgConfig,
}

impl DpkgConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화 여부를 설정합니다.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// 상태 파일 경로를 설정합니다.
    pub fn status_path(mut self, path: impl Into<String>) -> Self {
        self.config.status_path = path.into();
        self
    }

    /// 설치됨 상태 허용 목록을 설정합니다.
    pub fn installed_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.installed_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ConfigError::InvalidValue` 반환
    pub fn build(self) -> Result<DpkgConfig, LayerscanError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = LayerscanConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.dpkg.enabled);
        assert_eq!(config.dpkg.status_path, "var/lib/dpkg/status");
        assert_eq!(config.dpkg.installed_states, vec!["installed"]);
    }

    #[test]
    fn default_config_passes_validation() {
        LayerscanConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = LayerscanConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.dpkg.status_path, DEFAULT_DPKG_STATUS_PATH);
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[dpkg]
installed_states = ["installed", "triggers-pending"]
"#;
        let config = LayerscanConfig::parse(toml).unwrap();
        assert_eq!(
            config.dpkg.installed_states,
            vec!["installed", "triggers-pending"]
        );
        // status_path는 기본값 유지
        assert_eq!(config.dpkg.status_path, DEFAULT_DPKG_STATUS_PATH);
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn parse_invalid_toml_fails() {
        let err = LayerscanConfig::parse("[dpkg\nenabled = ").unwrap_err();
        assert!(matches!(
            err,
            LayerscanError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn parse_wrong_type_fails() {
        let err = LayerscanConfig::parse("[dpkg]\ninstalled_states = \"installed\"").unwrap_err();
        assert!(matches!(
            err,
            LayerscanError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = LayerscanConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general.log_level"));
    }

    #[test]
    fn validate_rejects_unknown_log_format() {
        let mut config = LayerscanConfig::default();
        config.general.log_format = "xml".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_absolute_status_path() {
        let config = DpkgConfig {
            status_path: "/var/lib/dpkg/status".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("relative"));
    }

    #[test]
    fn validate_rejects_traversal_in_status_path() {
        let config = DpkgConfig {
            status_path: "var/lib/../../etc/shadow".to_owned(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(".."));
    }

    #[test]
    fn validate_rejects_empty_status_path() {
        let config = DpkgConfig {
            status_path: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_allowlist() {
        let config = DpkgConfig {
            installed_states: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dpkg.installed_states"));
    }

    #[test]
    fn validate_rejects_multi_word_state() {
        let config = DpkgConfig {
            installed_states: vec!["install ok installed".to_owned()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_dpkg_section_is_not_validated() {
        let mut config = LayerscanConfig::default();
        config.dpkg.enabled = false;
        config.dpkg.installed_states.clear();
        config.validate().unwrap();
    }

    #[test]
    fn builder_creates_valid_config() {
        let config = DpkgConfigBuilder::new()
            .status_path("var/lib/dpkg/status")
            .installed_states(["installed", "half-configured"])
            .build()
            .unwrap();
        assert!(config.enabled);
        assert_eq!(config.installed_states, vec!["installed", "half-configured"]);
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let result = DpkgConfigBuilder::new()
            .installed_states(Vec::<String>::new())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = LayerscanConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let back = LayerscanConfig::parse(&toml_str).unwrap();
        assert_eq!(back.dpkg.installed_states, config.dpkg.installed_states);
        assert_eq!(back.general.log_level, config.general.log_level);
    }

    #[tokio::test]
    async fn from_file_missing_returns_file_not_found() {
        let err = LayerscanConfig::from_file("/nonexistent/layerscan.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LayerscanError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layerscan.toml");
        std::fs::write(&path, "[general]\nlog_format = \"pretty\"\n").unwrap();

        let config = LayerscanConfig::from_file(&path).await.unwrap();
        assert_eq!(config.general.log_format, "pretty");
    }
}

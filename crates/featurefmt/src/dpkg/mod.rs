//! dpkg 상태 파일 feature extractor
//!
//! [`DpkgExtractor`]는 레이어의 `var/lib/dpkg/status` 파일에서 설치된 패키지를
//! 읽어 바이너리/소스 feature 집합을 만듭니다.
//!
//! # 바이너리/소스 관계
//!
//! 설치된 바이너리 패키지마다 `Binary` feature 하나와 `Source` feature 하나를
//! 보고합니다. 소스 이름과 버전은 `Source` 필드에서 정해집니다.
//!
//! | `Source` 필드           | 소스 이름  | 소스 버전 |
//! |-------------------------|------------|-----------|
//! | (없음)                  | `Package`  | `Version` |
//! | `perl`                  | `perl`     | `Version` |
//! | `gcc-8 (8-20180414-1)`  | `gcc-8`    | `8-20180414-1` |
//!
//! 여러 바이너리가 같은 소스를 공유하는 경우가 흔하며, 결과 집합에서 하나로 합쳐집니다.

pub mod stanza;
pub mod status;

use layerscan_core::FeatureExtractor;
use layerscan_core::config::{DEFAULT_DPKG_STATUS_PATH, DpkgConfig};
use layerscan_core::metrics as m;
use layerscan_core::types::{FeatureFormat, FeatureKind, FeatureSet, LayerFiles, PackageFeature};
use metrics::counter;
use tracing::debug;

use self::stanza::{Stanza, read_stanzas_bytes};
use self::status::StatusPolicy;

/// dpkg 상태 파일의 표준 위치 (레이어 루트 기준)
pub const DPKG_STATUS_PATH: &str = DEFAULT_DPKG_STATUS_PATH;

/// 스탠자에서 필요한 필드만 뽑은 고정 형태 레코드
///
/// 빈 값은 없는 것으로 취급합니다. 그 밖의 필드는 무시합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DpkgRecord<'a> {
    /// `Package`
    pub package: Option<&'a str>,
    /// `Version`
    pub version: Option<&'a str>,
    /// `Status`
    pub status: Option<&'a str>,
    /// `Source`
    pub source: Option<&'a str>,
}

impl<'a> DpkgRecord<'a> {
    /// 스탠자 필드를 한 번 순회하여 레코드를 채웁니다.
    pub fn from_stanza(stanza: &'a Stanza) -> Self {
        let mut record = Self::default();
        for (key, value) in stanza.iter() {
            let slot = if key.eq_ignore_ascii_case("Package") {
                &mut record.package
            } else if key.eq_ignore_ascii_case("Version") {
                &mut record.version
            } else if key.eq_ignore_ascii_case("Status") {
                // 빈 Status도 "있음"으로 남겨 정책이 판정하게 함
                record.status = Some(value);
                continue;
            } else if key.eq_ignore_ascii_case("Source") {
                &mut record.source
            } else {
                continue;
            };
            *slot = Some(value).filter(|v| !v.is_empty());
        }
        record
    }

    /// 정책을 적용하여 바이너리/소스 feature를 결정합니다.
    pub fn resolve(&self, policy: &StatusPolicy) -> Result<ResolvedPackage, SkipReason> {
        let package = self.package.ok_or(SkipReason::MissingField("Package"))?;
        let version = self.version.ok_or(SkipReason::MissingField("Version"))?;

        if !policy.is_installed(self.status) {
            return Err(SkipReason::NotInstalled);
        }

        if !is_plausible_version(version) {
            return Err(SkipReason::InvalidVersion);
        }

        let binary = PackageFeature::binary(package, version, FeatureFormat::Dpkg);

        let (source_name, source_version) = match self.source {
            Some(value) => {
                let (name, override_version) = parse_source_field(value);
                (name.unwrap_or(package), override_version.unwrap_or(version))
            }
            None => (package, version),
        };

        let source = if is_plausible_version(source_version) {
            Some(PackageFeature::source(
                source_name,
                source_version,
                FeatureFormat::Dpkg,
            ))
        } else {
            debug!(
                package,
                source_version, "ignoring source package with unreadable version"
            );
            None
        };

        Ok(ResolvedPackage { binary, source })
    }
}

/// 하나의 스탠자에서 결정된 feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// 설치된 바이너리 패키지
    pub binary: PackageFeature,
    /// 소스 패키지 (버전을 읽을 수 없으면 `None`)
    pub source: Option<PackageFeature>,
}

/// 스탠자를 건너뛴 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 필수 필드 누락 또는 빈 값
    MissingField(&'static str),
    /// 설치되지 않은 상태
    NotInstalled,
    /// 해석할 수 없는 바이너리 버전
    InvalidVersion,
}

impl SkipReason {
    /// 메트릭 레이블 값
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::MissingField(_) => m::REASON_MISSING_FIELD,
            Self::NotInstalled => m::REASON_NOT_INSTALLED,
            Self::InvalidVersion => m::REASON_INVALID_VERSION,
        }
    }
}

/// `Source` 필드 값을 `(이름, 버전 오버라이드)`로 나눕니다.
///
/// `name` 또는 `name (version)` 형식입니다. 이름이 비면 `None`을 반환하여
/// 호출자가 `Package`로 대체하게 합니다. 닫는 괄호가 없으면 나머지 전체를 버전으로 봅니다.
pub fn parse_source_field(value: &str) -> (Option<&str>, Option<&str>) {
    let (name_part, version) = match value.split_once('(') {
        Some((name, rest)) => {
            let version = rest.split_once(')').map_or(rest, |(v, _)| v).trim();
            (name, Some(version).filter(|v| !v.is_empty()))
        }
        None => (value, None),
    };

    (name_part.split_whitespace().next(), version)
}

/// 버전 문자열이 dpkg 버전 문법(`[epoch:]upstream[-revision]`)을 따르는지 확인합니다.
///
/// 비교나 정규화는 하지 않습니다. 규칙:
/// - 공백 없음
/// - epoch(첫 `:` 앞)가 있으면 비어 있지 않은 숫자
/// - revision은 마지막 `-` 뒤이며, 있으면 비어 있지 않고 영숫자와 `.+~_`만 허용
/// - upstream은 숫자로 시작하고 영숫자와 `.+~-:_`만 허용
pub fn is_plausible_version(version: &str) -> bool {
    if version.is_empty() || version.chars().any(char::is_whitespace) {
        return false;
    }

    let rest = match version.split_once(':') {
        Some((epoch, rest)) => {
            if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            rest
        }
        None => version,
    };

    let upstream = match rest.rsplit_once('-') {
        Some((upstream, revision)) => {
            if revision.is_empty() || !revision.bytes().all(is_revision_byte) {
                return false;
            }
            upstream
        }
        None => rest,
    };

    upstream.starts_with(|c: char| c.is_ascii_digit()) && upstream.bytes().all(is_upstream_byte)
}

fn is_upstream_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'~' | b'-' | b':' | b'_')
}

fn is_revision_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'~' | b'_')
}

/// 스탠자 목록에서 feature 집합을 추출합니다.
///
/// 손상되었거나 설치되지 않은 스탠자는 건너뛰며 에러를 반환하지 않습니다.
pub fn extract_features(stanzas: &[Stanza], policy: &StatusPolicy) -> FeatureSet {
    let format = FeatureFormat::Dpkg.as_str();
    let mut features = FeatureSet::new();

    counter!(m::STANZAS_READ_TOTAL, m::LABEL_FORMAT => format)
        .increment(count_u64(stanzas.len()));

    for stanza in stanzas {
        match DpkgRecord::from_stanza(stanza).resolve(policy) {
            Ok(resolved) => {
                features.insert(resolved.binary);
                if let Some(source) = resolved.source {
                    features.insert(source);
                }
            }
            Err(reason) => {
                debug!(
                    package = stanza.get("Package").unwrap_or_default(),
                    reason = ?reason,
                    "skipping dpkg stanza"
                );
                counter!(
                    m::STANZAS_SKIPPED_TOTAL,
                    m::LABEL_FORMAT => format,
                    m::LABEL_REASON => reason.as_label()
                )
                .increment(1);
            }
        }
    }

    for (kind, count) in kind_counts(&features) {
        counter!(
            m::FEATURES_EXTRACTED_TOTAL,
            m::LABEL_FORMAT => format,
            m::LABEL_KIND => kind
        )
        .increment(count);
    }

    features
}

fn kind_counts(features: &FeatureSet) -> [(&'static str, u64); 2] {
    let binaries = features
        .iter()
        .filter(|f| f.kind == FeatureKind::Binary)
        .count();
    let sources = features.len() - binaries;

    [
        (FeatureKind::Binary.as_str(), count_u64(binaries)),
        (FeatureKind::Source.as_str(), count_u64(sources)),
    ]
}

fn count_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// dpkg feature extractor
///
/// 상태를 갖지 않으며 여러 레이어에 대해 동시에 호출할 수 있습니다.
#[derive(Debug, Clone)]
pub struct DpkgExtractor {
    required_files: Vec<String>,
    policy: StatusPolicy,
}

impl Default for DpkgExtractor {
    fn default() -> Self {
        Self::new(&DpkgConfig::default())
    }
}

impl DpkgExtractor {
    /// 설정으로 extractor를 생성합니다.
    pub fn new(config: &DpkgConfig) -> Self {
        Self::with_policy(config.status_path.clone(), StatusPolicy::from_config(config))
    }

    /// 상태 파일 경로와 정책을 직접 지정하여 생성합니다.
    pub fn with_policy(status_path: impl Into<String>, policy: StatusPolicy) -> Self {
        Self {
            required_files: vec![status_path.into()],
            policy,
        }
    }

    /// 레이어 루트 기준 상태 파일 경로
    pub fn status_path(&self) -> &str {
        &self.required_files[0]
    }

    /// 설치 상태 정책
    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// 상태 파일 원본 바이트에서 feature를 추출합니다.
    pub fn extract_from_bytes(&self, raw: &[u8]) -> FeatureSet {
        let stanzas = read_stanzas_bytes(raw);
        let features = extract_features(&stanzas, &self.policy);
        debug!(
            stanzas = stanzas.len(),
            features = features.len(),
            "dpkg status extracted"
        );
        features
    }
}

impl FeatureExtractor for DpkgExtractor {
    fn format(&self) -> FeatureFormat {
        FeatureFormat::Dpkg
    }

    fn required_files(&self) -> &[String] {
        &self.required_files
    }

    fn extract(&self, files: &LayerFiles) -> FeatureSet {
        counter!(m::EXTRACTIONS_TOTAL, m::LABEL_FORMAT => FeatureFormat::Dpkg.as_str())
            .increment(1);

        match files.get(self.status_path()) {
            Some(raw) => self.extract_from_bytes(raw),
            None => {
                debug!(path = self.status_path(), "dpkg status file not present in layer");
                FeatureSet::new()
            }
        }
    }
}

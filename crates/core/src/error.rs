//! 에러 타입 — 도메인별 에러 정의
//!
//! 패키지 데이터베이스 파싱 자체는 에러를 반환하지 않습니다.
//! 손상된 입력은 라인/스탠자 단위로 복구되며, 여기 정의된 에러는
//! 설정 로딩과 레지스트리 조회처럼 호출자 쪽 실수를 나타냅니다.

use crate::types::FeatureFormat;

/// layerscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LayerscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// extractor 레지스트리 에러
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// 로깅 초기화 에러
    #[error("logging init failed: {0}")]
    Logging(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// extractor 레지스트리 에러
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// 같은 형식의 extractor가 이미 등록됨
    #[error("extractor already registered for format '{format}'")]
    AlreadyRegistered { format: FeatureFormat },

    /// 등록되지 않은 형식
    #[error("no extractor registered for format '{format}'")]
    NotFound { format: FeatureFormat },
}

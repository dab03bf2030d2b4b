#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LayerscanError, RegistryError};

// 설정
pub use config::{DpkgConfig, DpkgConfigBuilder, GeneralConfig, LayerscanConfig};

// extractor trait / 레지스트리
pub use extractor::FeatureExtractor;
pub use registry::{ExtractorRegistry, ExtractorRegistryBuilder};

// 도메인 타입
pub use types::{FeatureFormat, FeatureKind, FeatureSet, LayerFiles, PackageFeature};

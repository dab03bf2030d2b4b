#![doc = include_str!("../README.md")]

pub mod dpkg;

use std::sync::Arc;

use layerscan_core::config::DpkgConfig;
use layerscan_core::{ExtractorRegistry, ExtractorRegistryBuilder, LayerscanError};
use tracing::info;

pub use dpkg::stanza::{Stanza, read_stanzas, read_stanzas_bytes};
pub use dpkg::status::StatusPolicy;
pub use dpkg::{DPKG_STATUS_PATH, DpkgExtractor, extract_features};

/// 설정에 따라 기본 extractor들을 등록한 레지스트리를 생성합니다.
///
/// 비활성화된 형식은 등록하지 않습니다. 설정은 먼저 검증됩니다.
pub fn default_registry(dpkg: &DpkgConfig) -> Result<ExtractorRegistry, LayerscanError> {
    let mut builder = ExtractorRegistryBuilder::new();

    if dpkg.enabled {
        dpkg.validate()?;
        builder = builder.register(Arc::new(DpkgExtractor::new(dpkg)))?;
    }

    let registry = builder.build();
    info!(formats = ?registry.formats(), "extractor registry built");
    Ok(registry)
}

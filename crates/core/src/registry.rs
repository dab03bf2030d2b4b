//! Extractor 레지스트리 — 형식 식별자에서 extractor로의 불변 매핑
//!
//! [`ExtractorRegistryBuilder`]로 프로세스 시작 시 한 번 구성하고,
//! 완성된 [`ExtractorRegistry`]를 디스패처에 값으로 전달합니다.
//! 전역 가변 상태를 두지 않으며 빌드 이후에는 등록/해제가 불가능합니다.
//!
//! # 사용 예시
//! ```ignore
//! let registry = ExtractorRegistryBuilder::new()
//!     .register(Arc::new(DpkgExtractor::default()))?
//!     .build();
//!
//! let features = registry.extract(FeatureFormat::Dpkg, &layer_files)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{LayerscanError, RegistryError};
use crate::extractor::FeatureExtractor;
use crate::types::{FeatureFormat, FeatureSet, LayerFiles};

// ─── ExtractorRegistryBuilder ────────────────────────────────────────

/// [`ExtractorRegistry`] 빌더
///
/// 형식마다 extractor 하나만 등록할 수 있습니다.
#[derive(Default)]
pub struct ExtractorRegistryBuilder {
    extractors: BTreeMap<FeatureFormat, Arc<dyn FeatureExtractor>>,
}

impl ExtractorRegistryBuilder {
    /// 빈 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// extractor를 등록합니다.
    ///
    /// 동일한 형식의 extractor가 이미 등록되어 있으면 에러를 반환합니다.
    pub fn register(
        mut self,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> Result<Self, LayerscanError> {
        let format = extractor.format();
        if self.extractors.contains_key(&format) {
            return Err(RegistryError::AlreadyRegistered { format }.into());
        }
        debug!(%format, "extractor registered");
        self.extractors.insert(format, extractor);
        Ok(self)
    }

    /// 불변 레지스트리를 생성합니다.
    pub fn build(self) -> ExtractorRegistry {
        ExtractorRegistry {
            extractors: Arc::new(self.extractors),
        }
    }
}

// ─── ExtractorRegistry ───────────────────────────────────────────────

/// 형식별 extractor 레지스트리
///
/// 복제 비용이 작고(`Arc`) 여러 워커 스레드에서 공유할 수 있습니다.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: Arc<BTreeMap<FeatureFormat, Arc<dyn FeatureExtractor>>>,
}

impl ExtractorRegistry {
    /// 형식으로 extractor를 조회합니다.
    pub fn get(&self, format: FeatureFormat) -> Option<&dyn FeatureExtractor> {
        self.extractors.get(&format).map(|e| e.as_ref())
    }

    /// 형식이 등록되어 있는지 확인합니다.
    pub fn contains(&self, format: FeatureFormat) -> bool {
        self.extractors.contains_key(&format)
    }

    /// 등록된 형식 목록 (정렬됨)
    pub fn formats(&self) -> Vec<FeatureFormat> {
        self.extractors.keys().copied().collect()
    }

    /// 등록된 extractor 수
    pub fn count(&self) -> usize {
        self.extractors.len()
    }

    /// 모든 extractor가 요구하는 파일 경로의 합집합 (정렬, 중복 제거)
    ///
    /// 레이어 리더는 이 목록의 파일만 스냅샷에 담으면 됩니다.
    pub fn required_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .extractors
            .values()
            .flat_map(|e| e.required_files().iter().cloned())
            .collect();
        files.sort();
        files.dedup();
        files
    }

    /// 지정한 형식의 extractor로 feature를 추출합니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 형식이면 `RegistryError::NotFound`
    pub fn extract(
        &self,
        format: FeatureFormat,
        files: &LayerFiles,
    ) -> Result<FeatureSet, LayerscanError> {
        let extractor = self
            .get(format)
            .ok_or(RegistryError::NotFound { format })?;
        Ok(extractor.extract(files))
    }

    /// 등록된 모든 extractor를 실행하여 형식별 결과를 반환합니다.
    ///
    /// 형식 간 병합이나 중복 제거는 하지 않습니다.
    pub fn extract_all(&self, files: &LayerFiles) -> BTreeMap<FeatureFormat, FeatureSet> {
        self.extractors
            .iter()
            .map(|(format, extractor)| (*format, extractor.extract(files)))
            .collect()
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

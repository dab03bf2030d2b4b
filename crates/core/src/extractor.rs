//! Extractor trait — 패키지 형식별 확장 포인트 정의

use crate::types::{FeatureFormat, FeatureSet, LayerFiles};

/// 패키지 데이터베이스에서 feature를 추출하는 trait
///
/// 새로운 패키지 관리자 형식을 지원하려면 이 trait을 구현하고
/// [`ExtractorRegistryBuilder`](crate::registry::ExtractorRegistryBuilder)에 등록합니다.
///
/// 구현체는 상태를 갖지 않아야 하며, 서로 다른 레이어에 대해
/// 여러 스레드에서 동시에 호출될 수 있습니다.
pub trait FeatureExtractor: Send + Sync {
    /// 이 extractor가 담당하는 형식
    fn format(&self) -> FeatureFormat;

    /// 추출에 필요한 레이어 내부 파일 경로 목록 (선행 `/` 없음)
    fn required_files(&self) -> &[String];

    /// 레이어 파일 스냅샷에서 feature 집합을 추출합니다.
    ///
    /// 필요한 파일이 스냅샷에 없으면 빈 집합을 반환합니다.
    /// 손상된 입력은 에러가 아니라 부분 결과로 처리해야 합니다.
    fn extract(&self, files: &LayerFiles) -> FeatureSet;
}

//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 extractor는 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 전역 레코더가 설치되지 않았으면 카운터 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `layerscan_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use layerscan_core::metrics;
//! use metrics::counter;
//!
//! counter!(metrics::STANZAS_READ_TOTAL, metrics::LABEL_FORMAT => "dpkg").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 패키지 형식 레이블 키 (dpkg, rpm, apk)
pub const LABEL_FORMAT: &str = "format";

/// feature 종류 레이블 키 (binary, source)
pub const LABEL_KIND: &str = "kind";

/// 스탠자 건너뜀 사유 레이블 키
pub const LABEL_REASON: &str = "reason";

// ─── 건너뜀 사유 레이블 값 ──────────────────────────────────────────

/// 필수 필드(Package/Version) 누락
pub const REASON_MISSING_FIELD: &str = "missing_field";

/// 설치되지 않은 상태
pub const REASON_NOT_INSTALLED: &str = "not_installed";

/// 해석할 수 없는 버전 문자열
pub const REASON_INVALID_VERSION: &str = "invalid_version";

// ─── Extractor 메트릭 ───────────────────────────────────────────────

/// 실행된 추출 횟수 (counter, label: format)
pub const EXTRACTIONS_TOTAL: &str = "layerscan_extractions_total";

/// 읽은 스탠자 수 (counter, label: format)
pub const STANZAS_READ_TOTAL: &str = "layerscan_stanzas_read_total";

/// 건너뛴 스탠자 수 (counter, labels: format, reason)
pub const STANZAS_SKIPPED_TOTAL: &str = "layerscan_stanzas_skipped_total";

/// 추출된 feature 수, 중복 제거 후 (counter, labels: format, kind)
pub const FEATURES_EXTRACTED_TOTAL: &str = "layerscan_features_extracted_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        EXTRACTIONS_TOTAL,
        "Total number of package database extractions performed"
    );
    describe_counter!(
        STANZAS_READ_TOTAL,
        "Total number of package database records read"
    );
    describe_counter!(
        STANZAS_SKIPPED_TOTAL,
        "Total number of package database records skipped, by reason"
    );
    describe_counter!(
        FEATURES_EXTRACTED_TOTAL,
        "Total number of deduplicated package features extracted"
    );
}

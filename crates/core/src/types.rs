//! 도메인 타입 — 패키지 feature, 형식, 레이어 파일 스냅샷
//!
//! [`PackageFeature`]는 하나의 레이어에서 추출된 정규화된 패키지 레코드입니다.
//! 하위 단계(버전 범위 매칭)는 `(name, version, format, kind)` 네 값만 봅니다.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 레이어 파일 스냅샷
///
/// 레이어 내부 경로(선행 `/` 없음, 예: `var/lib/dpkg/status`)에서
/// 해당 파일의 원본 바이트로의 매핑입니다. 레이어 파일시스템 리더가 채웁니다.
pub type LayerFiles = HashMap<String, Bytes>;

/// 추출 결과 집합
///
/// `(name, version, kind)` 중복이 없는 집합입니다. 정렬은 출력 안정성을 위한
/// 것일 뿐이며 호출자는 순서에 의존하면 안 됩니다.
pub type FeatureSet = BTreeSet<PackageFeature>;

/// 패키지 관리자 형식
///
/// 각 extractor가 생성하는 feature에 고정으로 붙는 식별자입니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureFormat {
    /// Debian/Ubuntu (`var/lib/dpkg/status`)
    Dpkg,
    /// RHEL/Fedora (`var/lib/rpm/Packages`)
    Rpm,
    /// Alpine (`lib/apk/db/installed`)
    Apk,
}

impl fmt::Display for FeatureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FeatureFormat {
    /// 형식 식별자 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dpkg => "dpkg",
            Self::Rpm => "rpm",
            Self::Apk => "apk",
        }
    }
}

/// feature 종류
///
/// 취약점 피드는 소스 패키지 기준으로 발행되는 경우가 많으므로,
/// 설치된 바이너리 패키지와 그 소스 패키지를 각각 보고합니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// 파일시스템에 실제로 설치된 바이너리 패키지
    Binary,
    /// 바이너리를 빌드한 업스트림 소스 패키지
    Source,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FeatureKind {
    /// 종류 식별자 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Source => "source",
        }
    }
}

/// 정규화된 패키지 feature
///
/// 버전 문자열은 원본 그대로 보존되며 정규화나 비교를 하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageFeature {
    /// 패키지 이름 (비어 있지 않음)
    pub name: String,
    /// 업스트림 버전 문자열
    pub version: String,
    /// 패키지 관리자 형식
    pub format: FeatureFormat,
    /// 바이너리/소스 구분
    pub kind: FeatureKind,
}

impl PackageFeature {
    /// 바이너리 feature를 생성합니다.
    pub fn binary(
        name: impl Into<String>,
        version: impl Into<String>,
        format: FeatureFormat,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            format,
            kind: FeatureKind::Binary,
        }
    }

    /// 소스 feature를 생성합니다.
    pub fn source(
        name: impl Into<String>,
        version: impl Into<String>,
        format: FeatureFormat,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            format,
            kind: FeatureKind::Source,
        }
    }
}

impl fmt::Display for PackageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({}, {})",
            self.name, self.version, self.format, self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_display() {
        assert_eq!(FeatureFormat::Dpkg.to_string(), "dpkg");
        assert_eq!(FeatureFormat::Rpm.to_string(), "rpm");
        assert_eq!(FeatureFormat::Apk.to_string(), "apk");
    }

    #[test]
    fn kind_display() {
        assert_eq!(FeatureKind::Binary.to_string(), "binary");
        assert_eq!(FeatureKind::Source.to_string(), "source");
    }

    #[test]
    fn feature_display() {
        let f = PackageFeature::binary("sed", "4.4-2", FeatureFormat::Dpkg);
        assert_eq!(f.to_string(), "sed@4.4-2 (dpkg, binary)");
    }

    #[test]
    fn feature_set_collapses_duplicates() {
        let mut set = FeatureSet::new();
        set.insert(PackageFeature::source("glibc", "2.27-3ubuntu1", FeatureFormat::Dpkg));
        set.insert(PackageFeature::source("glibc", "2.27-3ubuntu1", FeatureFormat::Dpkg));
        set.insert(PackageFeature::binary("glibc", "2.27-3ubuntu1", FeatureFormat::Dpkg));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn feature_serializes_lowercase_enums() {
        let f = PackageFeature::source("perl", "5.26.1-6ubuntu0.2", FeatureFormat::Dpkg);
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains(r#""format":"dpkg""#));
        assert!(json.contains(r#""kind":"source""#));

        let back: PackageFeature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}

//! dpkg `Status` 필드 해석
//!
//! `Status` 값은 `want flag state` 세 단어입니다 (예: `install ok installed`,
//! `deinstall ok config-files`). 설치 여부는 마지막 단어인 state로 판단하며,
//! 어떤 state를 "설치됨"으로 볼지는 [`StatusPolicy`]의 허용 목록이 결정합니다.

use layerscan_core::config::DpkgConfig;
use tracing::warn;

/// dpkg가 기록하는 state 단어 목록
pub const KNOWN_STATES: &[&str] = &[
    "not-installed",
    "config-files",
    "half-installed",
    "unpacked",
    "half-configured",
    "triggers-awaited",
    "triggers-pending",
    "installed",
];

/// `Status` 값에서 state 단어(마지막 토큰)를 꺼냅니다.
pub fn state_word(status: &str) -> Option<&str> {
    status.split_whitespace().next_back()
}

/// 설치 상태 판정 정책
///
/// `Status` 필드가 없으면 설치됨으로 봅니다 (일부 최소 형식 DB는 생략함).
/// 허용 목록에 없는 state, 빈 `Status` 값은 설치되지 않은 것으로 봅니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    installed_states: Vec<String>,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(["installed"])
    }
}

impl StatusPolicy {
    /// 허용 목록으로 정책을 생성합니다.
    pub fn new<I, S>(installed_states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed_states: installed_states.into_iter().map(Into::into).collect(),
        }
    }

    /// dpkg 설정에서 정책을 생성합니다.
    pub fn from_config(config: &DpkgConfig) -> Self {
        Self::new(config.installed_states.iter().cloned())
    }

    /// 설치됨으로 간주하는 state 목록
    pub fn installed_states(&self) -> &[String] {
        &self.installed_states
    }

    /// `Status` 값이 설치된 패키지를 나타내는지 판정합니다.
    ///
    /// dpkg가 모르는 state는 정책 검토 대상이므로 `warn` 로그를 남깁니다.
    pub fn is_installed(&self, status: Option<&str>) -> bool {
        let Some(status) = status else {
            return true;
        };

        let Some(state) = state_word(status) else {
            return false;
        };

        if !KNOWN_STATES.iter().any(|known| known.eq_ignore_ascii_case(state)) {
            warn!(status, state, "unrecognized dpkg package state");
        }

        self.installed_states
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_word_is_last_token() {
        assert_eq!(state_word("install ok installed"), Some("installed"));
        assert_eq!(state_word("deinstall ok config-files"), Some("config-files"));
        assert_eq!(state_word("  installed  "), Some("installed"));
        assert_eq!(state_word(""), None);
    }

    #[test]
    fn absent_status_counts_as_installed() {
        assert!(StatusPolicy::default().is_installed(None));
    }

    #[test]
    fn default_policy_accepts_only_installed() {
        let policy = StatusPolicy::default();
        assert!(policy.is_installed(Some("install ok installed")));
        assert!(policy.is_installed(Some("hold ok installed")));
        assert!(!policy.is_installed(Some("deinstall ok config-files")));
        assert!(!policy.is_installed(Some("purge ok not-installed")));
        assert!(!policy.is_installed(Some("install ok half-configured")));
        assert!(!policy.is_installed(Some("install reinstreq half-installed")));
        assert!(!policy.is_installed(Some("install ok unpacked")));
        assert!(!policy.is_installed(Some("install ok triggers-pending")));
    }

    #[test]
    fn empty_status_value_is_not_installed() {
        assert!(!StatusPolicy::default().is_installed(Some("")));
    }

    #[test]
    fn unknown_state_is_excluded_by_default() {
        assert!(!StatusPolicy::default().is_installed(Some("install ok frobnicated")));
    }

    #[test]
    fn allowlist_is_configurable() {
        let policy = StatusPolicy::new(["installed", "triggers-pending", "half-configured"]);
        assert!(policy.is_installed(Some("install ok triggers-pending")));
        assert!(policy.is_installed(Some("install ok half-configured")));
        assert!(!policy.is_installed(Some("deinstall ok config-files")));
    }

    #[test]
    fn state_comparison_ignores_case() {
        assert!(StatusPolicy::default().is_installed(Some("install ok INSTALLED")));
    }

    #[test]
    fn from_config_copies_allowlist() {
        let config = DpkgConfig {
            installed_states: vec!["installed".to_owned(), "unpacked".to_owned()],
            ..Default::default()
        };
        let policy = StatusPolicy::from_config(&config);
        assert_eq!(policy.installed_states(), &["installed", "unpacked"]);
    }
}

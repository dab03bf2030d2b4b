//! dpkg 상태 파일 스탠자 리더
//!
//! 상태 파일은 빈 줄로 구분된 `Key: Value` 레코드(스탠자)의 나열입니다.
//!
//! ```text
//! Package: libgcc1
//! Status: install ok installed
//! Version: 1:8-20180414-1ubuntu2
//! Source: gcc-8 (8-20180414-1ubuntu2)
//! Description: GCC support library
//!  Shared version of the support library.
//!
//! Package: sed
//! ...
//! ```
//!
//! 공백으로 시작하는 줄은 직전 필드 값의 연속이며 공백 하나로 이어 붙입니다.
//! 콜론이 없는 줄, 스탠자 첫 줄의 연속 줄처럼 해석할 수 없는 줄은 조용히 버립니다.
//! 손상된 한 줄은 한 필드만 잃게 하고 파일 전체 파싱을 멈추지 않습니다.

use tracing::trace;

/// 스탠자 하나 -- 필드명에서 값으로의 순서 있는 매핑
///
/// 필드명 조회는 ASCII 대소문자를 구분하지 않습니다.
/// 같은 필드가 다시 나오면 뒤의 값이 원래 위치의 값을 덮어씁니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stanza {
    fields: Vec<(String, String)>,
}

impl Stanza {
    /// 필드 값을 조회합니다 (대소문자 구분 없음).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.fields[idx].1.as_str())
    }

    /// 필드 존재 여부를 확인합니다.
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// 필드 수
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 파일에 나온 순서대로 `(필드명, 값)`을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// 필드를 삽입하고 그 위치를 반환합니다.
    fn insert(&mut self, key: &str, value: &str) -> usize {
        match self.position(key) {
            Some(idx) => {
                self.fields[idx].1 = value.to_owned();
                idx
            }
            None => {
                self.fields.push((key.to_owned(), value.to_owned()));
                self.fields.len() - 1
            }
        }
    }

    fn append(&mut self, idx: usize, continuation: &str) {
        let value = &mut self.fields[idx].1;
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(continuation);
    }
}

impl<K, V> FromIterator<(K, V)> for Stanza
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut stanza = Stanza::default();
        for (k, v) in iter {
            stanza.insert(k.as_ref().trim(), v.as_ref().trim());
        }
        stanza
    }
}

/// 스탠자 조립기
///
/// 현재 스탠자와 연속 줄을 붙일 필드 위치를 추적합니다.
#[derive(Default)]
struct StanzaBuilder {
    stanzas: Vec<Stanza>,
    current: Stanza,
    /// 연속 줄이 이어 붙을 필드 위치. 해석 불가 줄 뒤에는 `None`
    continuation: Option<usize>,
}

impl StanzaBuilder {
    fn finish(&mut self) {
        let stanza = std::mem::take(&mut self.current);
        self.continuation = None;

        if stanza.contains("Package") {
            self.stanzas.push(stanza);
        } else if !stanza.is_empty() {
            trace!(fields = stanza.len(), "discarding stanza without Package field");
        }
    }

    fn push_line(&mut self, line_no: usize, line: &str) {
        if line.starts_with([' ', '\t']) {
            match self.continuation {
                Some(idx) => self.current.append(idx, line.trim()),
                None => trace!(line = line_no, "skipping orphan continuation line"),
            }
            return;
        }

        let Some((key, value)) = line.split_once(':') else {
            trace!(line = line_no, "skipping line without field separator");
            self.continuation = None;
            return;
        };

        let key = key.trim();
        if key.is_empty() {
            trace!(line = line_no, "skipping line with empty field name");
            self.continuation = None;
            return;
        }

        // 빈 줄 구분자가 빠진 경우: 두 번째 Package는 새 스탠자의 시작
        if key.eq_ignore_ascii_case("Package") && self.current.contains("Package") {
            trace!(line = line_no, "repeated Package field, starting new stanza");
            self.finish();
        }

        self.continuation = Some(self.current.insert(key, value.trim()));
    }

    fn into_stanzas(mut self) -> Vec<Stanza> {
        self.finish();
        self.stanzas
    }
}

/// 상태 파일 텍스트를 스탠자 목록으로 나눕니다.
///
/// 빈 입력이나 공백뿐인 입력은 빈 목록을 반환합니다. `\n`과 `\r\n` 모두 허용합니다.
/// `Package` 필드가 없는 스탠자는 결과에 포함되지 않습니다.
pub fn read_stanzas(text: &str) -> Vec<Stanza> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut builder = StanzaBuilder::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            builder.finish();
        } else {
            builder.push_line(idx + 1, line);
        }
    }

    builder.into_stanzas()
}

/// 원본 바이트에서 스탠자를 읽습니다.
///
/// 잘못된 UTF-8 시퀀스는 U+FFFD로 치환되어 해당 필드만 손상됩니다.
pub fn read_stanzas_bytes(raw: &[u8]) -> Vec<Stanza> {
    read_stanzas(&String::from_utf8_lossy(raw))
}

use crate::core::Collect;
use crate::core::number::{canonical_index, number_to_string};
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};

/// Property name. Canonical array indices are kept numeric so that arrays,
/// arguments objects and string wrappers can find them without reparsing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Collect)]
#[collect(require_static)]
pub enum PropertyKey {
    Index(u32),
    String(Vec<u16>),
}

impl PropertyKey {
    pub fn from_utf16(s: &[u16]) -> Self {
        if !s.is_empty() && s.len() <= 10 && s.iter().all(|c| (b'0' as u16..=b'9' as u16).contains(c)) {
            let text: String = s.iter().map(|&c| c as u8 as char).collect();
            if let Some(i) = canonical_index(&text) {
                return PropertyKey::Index(i);
            }
        }
        PropertyKey::String(s.to_vec())
    }

    pub fn from_number(n: f64) -> Self {
        if n >= 0.0 && n < u32::MAX as f64 && n.fract() == 0.0 {
            PropertyKey::Index(n as u32)
        } else {
            PropertyKey::String(utf8_to_utf16(&number_to_string(n)))
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            PropertyKey::String(_) => None,
        }
    }

    pub fn to_utf16(&self) -> Vec<u16> {
        match self {
            PropertyKey::Index(i) => utf8_to_utf16(&i.to_string()),
            PropertyKey::String(s) => s.clone(),
        }
    }

    pub fn is_str(&self, name: &str) -> bool {
        match self {
            PropertyKey::String(s) => s.len() == name.len() && s.iter().zip(name.bytes()).all(|(a, b)| *a == b as u16),
            PropertyKey::Index(_) => false,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        match canonical_index(s) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(utf8_to_utf16(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<&String> for PropertyKey {
    fn from(s: &String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        if i == u32::MAX {
            PropertyKey::String(utf8_to_utf16(&i.to_string()))
        } else {
            PropertyKey::Index(i)
        }
    }
}

impl From<usize> for PropertyKey {
    fn from(i: usize) -> Self {
        if i < u32::MAX as usize {
            PropertyKey::Index(i as u32)
        } else {
            PropertyKey::String(utf8_to_utf16(&i.to_string()))
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKey::Index(i) => write!(f, "{i}"),
            PropertyKey::String(s) => write!(f, "{}", utf16_to_utf8(s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_indices_are_numeric() {
        assert_eq!(PropertyKey::from("0"), PropertyKey::Index(0));
        assert_eq!(PropertyKey::from("42"), PropertyKey::Index(42));
        assert_eq!(PropertyKey::from_utf16(&utf8_to_utf16("4294967294")), PropertyKey::Index(4294967294));
        assert!(matches!(PropertyKey::from("4294967295"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from("01"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from("-1"), PropertyKey::String(_)));
        assert_eq!(PropertyKey::from_number(3.0), PropertyKey::Index(3));
        assert_eq!(PropertyKey::from_number(1.5), PropertyKey::from("1.5"));
        assert_eq!(PropertyKey::from_number(-0.0), PropertyKey::Index(0));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a subject row. Only persisted subjects have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub u64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SubjectId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Row identifier assigned by the attribute storage on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored attribute row: `(subject_id, key, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRow {
    pub id: RowId,
    pub subject_id: SubjectId,
    pub key: String,
    pub value: Option<String>,
}

/// Attribute row that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttributeRow {
    pub subject_id: SubjectId,
    pub key: String,
    pub value: Option<String>,
}

/// Resolved attribute value as held by the per-resolver cache.
///
/// A stored empty string is `Set(String::new())`, never `Unset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CachedValue {
    Unset,
    Set(String),
}

impl CachedValue {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value.as_str()),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl From<Option<String>> for CachedValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

impl fmt::Display for CachedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("<unset>"),
            Self::Set(value) => f.write_str(value),
        }
    }
}

/// `true` for values a posted form treats as "nothing entered".
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::{CachedValue, is_blank};

    #[test]
    fn empty_string_is_not_unset() {
        let empty = CachedValue::from(Some(String::new()));
        assert!(!empty.is_unset());
        assert_eq!(empty.as_deref(), Some(""));
        assert!(CachedValue::from(None).is_unset());
    }

    #[test]
    fn blank_covers_missing_and_empty_only() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(!is_blank(Some("0")));
        assert!(!is_blank(Some(" ")));
    }
}

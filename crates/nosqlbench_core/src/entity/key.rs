//! Entity keys.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Separator between kind and id in the textual key form.
pub const KEY_DELIMITER: char = ':';

/// Identifies an entity by kind and id.
///
/// Keys are:
/// - Equal only when both kind and id match exactly
/// - Encoded as `kind:id`, parsed by splitting on the first colon
/// - Immutable once an id has been assigned
///
/// A key without an id stands for an entity that has not been given a
/// concrete identity yet. The store assigns one before the entity
/// becomes resident.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    kind: String,
    id: Option<String>,
}

impl Key {
    /// Creates a key of the given kind with no id assigned.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the kind is empty or contains the delimiter.
    pub fn new(kind: impl Into<String>) -> CoreResult<Self> {
        let kind = kind.into();
        validate_part("kind", &kind)?;
        Ok(Self { kind, id: None })
    }

    /// Creates a key with a concrete id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if either part is empty or contains the delimiter.
    pub fn with_id(kind: impl Into<String>, id: impl Into<String>) -> CoreResult<Self> {
        let kind = kind.into();
        let id = id.into();
        validate_part("kind", &kind)?;
        validate_part("id", &id)?;
        Ok(Self { kind, id: Some(id) })
    }

    /// Parses a key from its `kind:id` form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the delimiter is missing, either part is
    /// empty, or the id contains a further delimiter.
    pub fn parse(encoded: &str) -> CoreResult<Self> {
        let (kind, id) = encoded.split_once(KEY_DELIMITER).ok_or_else(|| {
            CoreError::invalid_key(format!("missing '{KEY_DELIMITER}' in key {encoded:?}"))
        })?;
        Self::with_id(kind, id)
    }

    /// Returns the entity kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the id, if one has been assigned.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns true if the key has a concrete id.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.id.is_some()
    }

    /// Encodes the key as `kind:id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if no id has been assigned yet.
    pub fn encode(&self) -> CoreResult<String> {
        match &self.id {
            Some(id) => Ok(format!("{}{KEY_DELIMITER}{id}", self.kind)),
            None => Err(CoreError::invalid_key(format!(
                "key of kind {:?} has no id assigned",
                self.kind
            ))),
        }
    }

    /// Assigns a generated id to an unresolved key.
    pub(crate) fn resolved(self, id: String) -> Self {
        debug_assert!(self.id.is_none(), "key ids are immutable once assigned");
        Self {
            kind: self.kind,
            id: Some(id),
        }
    }
}

fn validate_part(name: &str, value: &str) -> CoreResult<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_key(format!("key {name} must not be empty")));
    }
    if value.contains(KEY_DELIMITER) {
        return Err(CoreError::invalid_key(format!(
            "key {name} {value:?} must not contain '{KEY_DELIMITER}'"
        )));
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}{KEY_DELIMITER}{id}", self.kind),
            None => write!(f, "{}{KEY_DELIMITER}<unassigned>", self.kind),
        }
    }
}

impl FromStr for Key {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_key_has_no_id() {
        let key = Key::new("Test").unwrap();
        assert_eq!(key.kind(), "Test");
        assert!(!key.is_resolved());
        assert!(key.encode().is_err());
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let key = Key::parse("Test:42").unwrap();
        assert_eq!(key.kind(), "Test");
        assert_eq!(key.id(), Some("42"));
        assert_eq!(key.encode().unwrap(), "Test:42");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(Key::parse("Test").is_err());
        assert!(Key::parse(":1").is_err());
        assert!(Key::parse("Test:").is_err());
        assert!(Key::parse("Test:1:2").is_err());
    }

    #[test]
    fn delimiter_rejected_in_parts() {
        assert!(Key::new("a:b").is_err());
        assert!(Key::with_id("a", "b:c").is_err());
        assert!(Key::new("").is_err());
    }

    #[test]
    fn equality_needs_kind_and_id() {
        let a = Key::with_id("A", "1").unwrap();
        let b = Key::with_id("B", "1").unwrap();
        let c = Key::with_id("A", "2").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Key::parse("A:1").unwrap());
    }

    #[test]
    fn resolving_assigns_id() {
        let key = Key::new("Test").unwrap().resolved("9".to_string());
        assert_eq!(key.encode().unwrap(), "Test:9");
    }

    #[test]
    fn display_unassigned() {
        let key = Key::new("Test").unwrap();
        assert_eq!(key.to_string(), "Test:<unassigned>");
    }

    proptest! {
        #[test]
        fn encode_parse_bijection(kind in "[A-Za-z][A-Za-z0-9_]{0,15}", id in "[a-z0-9-]{1,36}") {
            let key = Key::with_id(kind, id).unwrap();
            let encoded = key.encode().unwrap();
            prop_assert_eq!(Key::parse(&encoded).unwrap(), key);
        }
    }
}

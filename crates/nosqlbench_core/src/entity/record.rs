//! Entity records.

use crate::entity::Key;
use crate::value::Fields;

/// A stored entity: key, fields and optimistic version.
///
/// New entities start at version 0. Every successful update commit
/// raises the version by exactly one.
///
/// `Clone` is a deep copy of the field map, so copies handed to callers
/// never alias the store's canonical record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    key: Key,
    fields: Fields,
    version: u64,
}

impl Entity {
    /// Creates a new entity at version 0.
    #[must_use]
    pub fn new(key: Key, fields: Fields) -> Self {
        Self {
            key,
            fields,
            version: 0,
        }
    }

    /// Creates an entity at a specific version.
    #[must_use]
    pub fn with_version(key: Key, fields: Fields, version: u64) -> Self {
        Self {
            key,
            fields,
            version,
        }
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Consumes the entity and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    #[test]
    fn new_entity_starts_at_version_zero() {
        let entity = Entity::new(Key::new("Test").unwrap(), Fields::new());
        assert_eq!(entity.version(), 0);
    }

    #[test]
    fn clone_does_not_alias_fields() {
        let mut fields = Fields::new();
        fields.insert("number".into(), FieldValue::Integer(1));
        let original = Entity::new(Key::with_id("Test", "1").unwrap(), fields);

        let mut copy = original.clone().into_fields();
        copy.insert("number".into(), FieldValue::Integer(2));

        assert_eq!(
            original.fields().get("number"),
            Some(&FieldValue::Integer(1))
        );
    }
}

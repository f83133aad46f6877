//! Opaque identifiers for types known to the metadata provider.

use serde::{Deserialize, Serialize};

/// Identifier for a type described by a [`MetadataProvider`](crate::MetadataProvider).
///
/// Keys are arena positions issued by the provider; they are only meaningful
/// against the provider that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey(u32);

impl TypeKey {
    /// Create a key from an arena position.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The arena position this key refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        let key = TypeKey::from_index(7);
        assert_eq!(key.index(), 7);
        assert_eq!(key, TypeKey::from_index(7));
        assert_ne!(key, TypeKey::from_index(8));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(TypeKey::from_index(3).to_string(), "type#3");
    }
}

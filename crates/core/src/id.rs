//! Entity identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

/// Identifier of a tracked entity, unique within one collection.
///
/// Stored as a string so catalogue identifiers (e.g. `tt0133093`,
/// `tmdb-603`) and generated identifiers share one representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new time-ordered identifier (UUIDv7).
    ///
    /// Prefer passing IDs explicitly in tests for determinism.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap an externally assigned identifier verbatim.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for EntityId {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::validation("identifier cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = EntityId::generate();
        let b = EntityId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!("  tt0133093 ".parse::<EntityId>().unwrap().as_str(), "tt0133093");
        assert!(matches!(
            "   ".parse::<EntityId>(),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntityId::new("tmdb-603");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tmdb-603\"");
    }
}

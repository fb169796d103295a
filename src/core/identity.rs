//! Entity identity: server-assigned ids and temporary client-side ids

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Prefix marking an id minted on the client before the server confirmed it
const TEMP_PREFIX: &str = "tmp-";

/// The server-owned collections the catalog manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Product categories (orderable by display order)
    Category,
    /// Products (orderable by list index)
    Product,
    /// Selling seasons
    Season,
}

impl CollectionKind {
    /// Collection name used in query keys and file names
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Category => "categories",
            CollectionKind::Product => "product-list",
            CollectionKind::Season => "seasons",
        }
    }

    /// Prefix the server puts in front of its counter when assigning ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            CollectionKind::Category => "c",
            CollectionKind::Product => "p",
            CollectionKind::Season => "s",
        }
    }

    /// Singular noun for messages
    pub fn noun(&self) -> &'static str {
        match self {
            CollectionKind::Category => "category",
            CollectionKind::Product => "product",
            CollectionKind::Season => "season",
        }
    }

    /// Get all collections
    pub fn all() -> &'static [CollectionKind] {
        &[
            CollectionKind::Category,
            CollectionKind::Product,
            CollectionKind::Season,
        ]
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "categories" | "category" => Ok(CollectionKind::Category),
            "product-list" | "products" | "product" => Ok(CollectionKind::Product),
            "seasons" | "season" => Ok(CollectionKind::Season),
            _ => Err(IdParseError::UnknownCollection(s.to_string())),
        }
    }
}

/// A stable entity identifier
///
/// Ids are opaque strings owned by the server. Entities created optimistically
/// carry a temporary `tmp-<ULID>` id until the server confirms them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an id string without validation (use `parse` for user input)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh temporary id for an entity the server has not seen yet
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMP_PREFIX, Ulid::new()))
    }

    /// Id the server assigns to the `n`th entity of a collection
    pub fn assigned(kind: CollectionKind, n: u64) -> Self {
        Self(format!("{}{}", kind.id_prefix(), n))
    }

    /// True if this id was minted on the client and is awaiting confirmation
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_PREFIX)
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(IdParseError::Whitespace(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("entity id is empty")]
    Empty,

    #[error("entity id '{0}' contains whitespace")]
    Whitespace(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_ids_are_unique_and_flagged() {
        let a = EntityId::temporary();
        let b = EntityId::temporary();
        assert_ne!(a, b);
        assert!(a.is_temporary());
        assert!(a.as_str().starts_with("tmp-"));
    }

    #[test]
    fn test_assigned_id_uses_collection_prefix() {
        let id = EntityId::assigned(CollectionKind::Category, 1);
        assert_eq!(id.as_str(), "c1");
        assert!(!id.is_temporary());
        assert_eq!(EntityId::assigned(CollectionKind::Product, 12).as_str(), "p12");
    }

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(EntityId::parse("  c7 ").unwrap().as_str(), "c7");
        assert_eq!(EntityId::parse("   ").unwrap_err(), IdParseError::Empty);
        assert!(matches!(
            EntityId::parse("c 7"),
            Err(IdParseError::Whitespace(_))
        ));
    }

    #[test]
    fn test_collection_kind_roundtrip() {
        for kind in CollectionKind::all() {
            let parsed: CollectionKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
        assert!("widgets".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = EntityId::new("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
        let parsed: EntityId = serde_json::from_str("\"p3\"").unwrap();
        assert_eq!(parsed.as_str(), "p3");
    }
}

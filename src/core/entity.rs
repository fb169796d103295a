//! Entity trait - common interface for all cached catalog records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::core::identity::{CollectionKind, EntityId};

/// Common trait for all catalog entities held in the store
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// The collection this entity belongs to
    const KIND: CollectionKind;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Replace the entity's ID (used when the server assigns the final one)
    fn set_id(&mut self, id: EntityId);

    /// Human-facing name; unique within a collection
    fn label(&self) -> &str;

    /// Record the server-side creation time, for entities that carry one
    fn stamp_created(&mut self, _at: DateTime<Utc>) {}
}

/// An entity whose collection has a persisted linear order
///
/// The position is the dense, zero-based index in the displayed ordering and
/// maps one-to-one onto the persisted `displayOrder` / `index` field.
pub trait Ordered: Entity {
    /// Current position
    fn position(&self) -> u32;

    /// Assign a new position
    fn set_position(&mut self, position: u32);
}

/// Publication status for catalog records
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Status {
    #[default]
    Draft,
    Active,
    Archived,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Draft => write!(f, "draft"),
            Status::Active => write!(f, "active"),
            Status::Archived => write!(f, "archived"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Status::Draft),
            "active" => Ok(Status::Active),
            "archived" => Ok(Status::Archived),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// A validated change ready to be applied optimistically
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    /// Insert a new entity (carrying a temporary id)
    Create(T),
    /// Replace the entity with the same id
    Update(T),
    /// Remove the entity with this id
    Delete(EntityId),
}

impl<T: Entity> Change<T> {
    /// Short verb for logs and messages
    pub fn verb(&self) -> &'static str {
        match self {
            Change::Create(_) => "create",
            Change::Update(_) => "update",
            Change::Delete(_) => "delete",
        }
    }
}

/// A form's worth of user input for one collection
///
/// Drafts are validated against the currently cached list before anything is
/// written, then turned into a [`Change`].
pub trait Draft<T: Entity> {
    /// Reject the draft before any optimistic write happens
    fn validate(&self, existing: &[T]) -> Result<(), ValidationError>;

    /// Build the change; only called after `validate` succeeded
    fn into_change(self, existing: &[T]) -> Change<T>;
}

/// Client-detected validation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("a {noun} named '{name}' already exists")]
    DuplicateName { noun: &'static str, name: String },

    #[error("SKU '{0}' is already used by another product")]
    DuplicateSku(String),

    #[error("no {noun} with id '{id}'")]
    UnknownId { noun: &'static str, id: EntityId },

    #[error("season ends ({ends}) before it starts ({starts})")]
    InvalidDateRange {
        starts: chrono::NaiveDate,
        ends: chrono::NaiveDate,
    },

    #[error("nothing to update")]
    NoChanges,
}

/// Find an entity by id
pub fn find_by_id<'a, T: Entity>(list: &'a [T], id: &EntityId) -> Option<&'a T> {
    list.iter().find(|e| e.id() == id)
}

/// Check name uniqueness (case-insensitive, trimmed), ignoring `except`
pub fn ensure_unique_label<T: Entity>(
    list: &[T],
    name: &str,
    except: Option<&EntityId>,
) -> Result<(), ValidationError> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let clash = list
        .iter()
        .filter(|e| Some(e.id()) != except)
        .any(|e| e.label().trim().eq_ignore_ascii_case(wanted));
    if clash {
        return Err(ValidationError::DuplicateName {
            noun: T::KIND.noun(),
            name: wanted.to_string(),
        });
    }
    Ok(())
}

/// Ensure an id exists in the list
pub fn ensure_known<T: Entity>(list: &[T], id: &EntityId) -> Result<(), ValidationError> {
    match find_by_id(list, id) {
        Some(_) => Ok(()),
        None => Err(ValidationError::UnknownId {
            noun: T::KIND.noun(),
            id: id.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::category::Category;

    fn cats() -> Vec<Category> {
        vec![
            Category::new(EntityId::new("c1"), "Tops", 0),
            Category::new(EntityId::new("c2"), "Shoes", 1),
        ]
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("ACTIVE".parse::<Status>().unwrap(), Status::Active);
        assert_eq!(Status::Archived.to_string(), "archived");
        assert!("gone".parse::<Status>().is_err());
    }

    #[test]
    fn test_unique_label_is_case_insensitive() {
        let err = ensure_unique_label(&cats(), " tops ", None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateName {
                noun: "category",
                name: "tops".to_string()
            }
        );
    }

    #[test]
    fn test_unique_label_ignores_self() {
        let id = EntityId::new("c1");
        assert!(ensure_unique_label(&cats(), "TOPS", Some(&id)).is_ok());
    }

    #[test]
    fn test_unique_label_rejects_empty() {
        assert_eq!(
            ensure_unique_label(&cats(), "   ", None).unwrap_err(),
            ValidationError::EmptyName
        );
    }

    #[test]
    fn test_ensure_known() {
        assert!(ensure_known(&cats(), &EntityId::new("c2")).is_ok());
        assert!(matches!(
            ensure_known(&cats(), &EntityId::new("c9")),
            Err(ValidationError::UnknownId { .. })
        ));
    }
}

//! Category entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{
    ensure_known, ensure_unique_label, find_by_id, Change, Draft, Entity, Ordered,
    ValidationError,
};
use crate::core::identity::{CollectionKind, EntityId};

/// A storefront category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: EntityId,

    /// Display name, unique within the catalog
    pub name: String,

    /// Position in the storefront menu
    #[serde(default)]
    pub display_order: u32,

    /// Season this category is shown in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_id: Option<EntityId>,

    /// Set by the server on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(id: EntityId, name: impl Into<String>, display_order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            display_order,
            season_id: None,
            created: None,
        }
    }
}

impl Entity for Category {
    const KIND: CollectionKind = CollectionKind::Category;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created.get_or_insert(at);
    }
}

impl Ordered for Category {
    fn position(&self) -> u32 {
        self.display_order
    }

    fn set_position(&mut self, position: u32) {
        self.display_order = position;
    }
}

/// Category form input
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryDraft {
    Create {
        name: String,
        season_id: Option<EntityId>,
    },
    Rename {
        id: EntityId,
        name: String,
    },
    Delete {
        id: EntityId,
    },
}

impl Draft<Category> for CategoryDraft {
    fn validate(&self, existing: &[Category]) -> Result<(), ValidationError> {
        match self {
            CategoryDraft::Create { name, .. } => ensure_unique_label(existing, name, None),
            CategoryDraft::Rename { id, name } => {
                ensure_known(existing, id)?;
                ensure_unique_label(existing, name, Some(id))
            }
            CategoryDraft::Delete { id } => ensure_known(existing, id),
        }
    }

    fn into_change(self, existing: &[Category]) -> Change<Category> {
        match self {
            CategoryDraft::Create { name, season_id } => {
                let mut category =
                    Category::new(EntityId::temporary(), name.trim(), existing.len() as u32);
                category.season_id = season_id;
                Change::Create(category)
            }
            CategoryDraft::Rename { id, name } => {
                let mut category = find_by_id(existing, &id)
                    .cloned()
                    .unwrap_or_else(|| Category::new(id, "", existing.len() as u32));
                category.name = name.trim().to_string();
                Change::Update(category)
            }
            CategoryDraft::Delete { id } => Change::Delete(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<Category> {
        vec![
            Category::new(EntityId::new("c1"), "Tops", 0),
            Category::new(EntityId::new("c2"), "Shoes", 1),
        ]
    }

    #[test]
    fn test_category_serializes_wire_field_names() {
        let cat = Category::new(EntityId::new("c1"), "Tops", 3);
        let json = serde_json::to_string(&cat).unwrap();
        assert!(json.contains("\"displayOrder\":3"));
        assert!(!json.contains("seasonId"));

        let parsed: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cat);
    }

    #[test]
    fn test_create_draft_gets_temporary_id_and_next_position() {
        let draft = CategoryDraft::Create {
            name: "  Hats ".to_string(),
            season_id: None,
        };
        assert!(draft.validate(&existing()).is_ok());
        let Change::Create(cat) = draft.into_change(&existing()) else {
            panic!("expected create");
        };
        assert!(cat.id.is_temporary());
        assert_eq!(cat.name, "Hats");
        assert_eq!(cat.display_order, 2);
    }

    #[test]
    fn test_create_draft_rejects_duplicate_name() {
        let draft = CategoryDraft::Create {
            name: "shoes".to_string(),
            season_id: None,
        };
        assert!(matches!(
            draft.validate(&existing()),
            Err(ValidationError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_rename_keeps_other_fields() {
        let draft = CategoryDraft::Rename {
            id: EntityId::new("c2"),
            name: "Sneakers".to_string(),
        };
        assert!(draft.validate(&existing()).is_ok());
        let Change::Update(cat) = draft.into_change(&existing()) else {
            panic!("expected update");
        };
        assert_eq!(cat.id.as_str(), "c2");
        assert_eq!(cat.name, "Sneakers");
        assert_eq!(cat.display_order, 1);
    }

    #[test]
    fn test_rename_and_delete_require_known_id() {
        let rename = CategoryDraft::Rename {
            id: EntityId::new("c9"),
            name: "Other".to_string(),
        };
        assert!(matches!(
            rename.validate(&existing()),
            Err(ValidationError::UnknownId { noun: "category", .. })
        ));
        let delete = CategoryDraft::Delete {
            id: EntityId::new("c9"),
        };
        assert!(delete.validate(&existing()).is_err());
    }
}

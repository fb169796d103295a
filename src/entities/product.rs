//! Product entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{
    ensure_known, ensure_unique_label, find_by_id, Change, Draft, Entity, Ordered, Status,
    ValidationError,
};
use crate::core::identity::{CollectionKind, EntityId};

/// A product in the storefront list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier
    pub id: EntityId,

    /// Product name
    pub name: String,

    /// Stock keeping unit; unique when present
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sku: String,

    /// Price in the smallest currency unit
    #[serde(default)]
    pub price_cents: u64,

    /// Publication status
    #[serde(default)]
    pub status: Status,

    /// Owning category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,

    /// Position in the product list
    #[serde(default)]
    pub index: u32,
}

impl Product {
    pub fn new(id: EntityId, name: impl Into<String>, sku: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            name: name.into(),
            sku: sku.into(),
            price_cents: 0,
            status: Status::default(),
            category_id: None,
            index,
        }
    }

    /// Price formatted as `units.cents`
    pub fn price_display(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

impl Entity for Product {
    const KIND: CollectionKind = CollectionKind::Product;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl Ordered for Product {
    fn position(&self) -> u32 {
        self.index
    }

    fn set_position(&mut self, position: u32) {
        self.index = position;
    }
}

/// Fields an update may touch; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price_cents: Option<u64>,
    pub status: Option<Status>,
    pub category_id: Option<EntityId>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.sku.is_none()
            && self.price_cents.is_none()
            && self.status.is_none()
            && self.category_id.is_none()
    }

    /// Apply to a copy of `product`
    pub fn apply(&self, product: &Product) -> Product {
        let mut next = product.clone();
        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(sku) = &self.sku {
            next.sku = sku.trim().to_string();
        }
        if let Some(price) = self.price_cents {
            next.price_cents = price;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(category) = &self.category_id {
            next.category_id = Some(category.clone());
        }
        next
    }
}

/// Product form input
#[derive(Debug, Clone, PartialEq)]
pub enum ProductDraft {
    Create {
        name: String,
        sku: String,
        price_cents: u64,
        category_id: Option<EntityId>,
    },
    Update {
        id: EntityId,
        changes: ProductChanges,
    },
    Delete {
        id: EntityId,
    },
}

fn ensure_unique_sku(
    existing: &[Product],
    sku: &str,
    except: Option<&EntityId>,
) -> Result<(), ValidationError> {
    let wanted = sku.trim();
    if wanted.is_empty() {
        return Ok(());
    }
    let clash = existing
        .iter()
        .filter(|p| Some(&p.id) != except)
        .any(|p| p.sku.eq_ignore_ascii_case(wanted));
    if clash {
        return Err(ValidationError::DuplicateSku(wanted.to_string()));
    }
    Ok(())
}

impl Draft<Product> for ProductDraft {
    fn validate(&self, existing: &[Product]) -> Result<(), ValidationError> {
        match self {
            ProductDraft::Create { name, sku, .. } => {
                ensure_unique_label(existing, name, None)?;
                ensure_unique_sku(existing, sku, None)
            }
            ProductDraft::Update { id, changes } => {
                ensure_known(existing, id)?;
                if changes.is_empty() {
                    return Err(ValidationError::NoChanges);
                }
                if let Some(name) = &changes.name {
                    ensure_unique_label(existing, name, Some(id))?;
                }
                if let Some(sku) = &changes.sku {
                    ensure_unique_sku(existing, sku, Some(id))?;
                }
                Ok(())
            }
            ProductDraft::Delete { id } => ensure_known(existing, id),
        }
    }

    fn into_change(self, existing: &[Product]) -> Change<Product> {
        match self {
            ProductDraft::Create {
                name,
                sku,
                price_cents,
                category_id,
            } => {
                let mut product = Product::new(
                    EntityId::temporary(),
                    name.trim(),
                    sku.trim(),
                    existing.len() as u32,
                );
                product.price_cents = price_cents;
                product.category_id = category_id;
                Change::Create(product)
            }
            ProductDraft::Update { id, changes } => {
                let current = find_by_id(existing, &id)
                    .cloned()
                    .unwrap_or_else(|| Product::new(id, "", "", existing.len() as u32));
                Change::Update(changes.apply(&current))
            }
            ProductDraft::Delete { id } => Change::Delete(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing() -> Vec<Product> {
        vec![
            Product::new(EntityId::new("p1"), "Linen Shirt", "LS-01", 0),
            Product::new(EntityId::new("p2"), "Canvas Tote", "CT-01", 1),
        ]
    }

    #[test]
    fn test_product_serializes_index_and_status() {
        let mut p = Product::new(EntityId::new("p1"), "Linen Shirt", "LS-01", 4);
        p.status = Status::Active;
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"index\":4"));
        assert!(json.contains("\"status\":\"active\""));
        assert!(json.contains("\"priceCents\":0"));
    }

    #[test]
    fn test_price_display() {
        let mut p = Product::new(EntityId::new("p1"), "Shirt", "", 0);
        p.price_cents = 1905;
        assert_eq!(p.price_display(), "19.05");
    }

    #[test]
    fn test_create_rejects_duplicate_sku() {
        let draft = ProductDraft::Create {
            name: "New Shirt".to_string(),
            sku: "ls-01".to_string(),
            price_cents: 100,
            category_id: None,
        };
        assert_eq!(
            draft.validate(&existing()).unwrap_err(),
            ValidationError::DuplicateSku("ls-01".to_string())
        );
    }

    #[test]
    fn test_create_allows_missing_sku() {
        let draft = ProductDraft::Create {
            name: "Scarf".to_string(),
            sku: String::new(),
            price_cents: 0,
            category_id: None,
        };
        assert!(draft.validate(&existing()).is_ok());
        let Change::Create(p) = draft.into_change(&existing()) else {
            panic!("expected create");
        };
        assert!(p.id.is_temporary());
        assert_eq!(p.index, 2);
    }

    #[test]
    fn test_update_requires_changes() {
        let draft = ProductDraft::Update {
            id: EntityId::new("p1"),
            changes: ProductChanges::default(),
        };
        assert_eq!(
            draft.validate(&existing()).unwrap_err(),
            ValidationError::NoChanges
        );
    }

    #[test]
    fn test_update_applies_only_given_fields() {
        let draft = ProductDraft::Update {
            id: EntityId::new("p2"),
            changes: ProductChanges {
                status: Some(Status::Archived),
                price_cents: Some(2500),
                ..Default::default()
            },
        };
        assert!(draft.validate(&existing()).is_ok());
        let Change::Update(p) = draft.into_change(&existing()) else {
            panic!("expected update");
        };
        assert_eq!(p.name, "Canvas Tote");
        assert_eq!(p.status, Status::Archived);
        assert_eq!(p.price_cents, 2500);
        assert_eq!(p.index, 1);
    }

    #[test]
    fn test_update_may_keep_its_own_sku() {
        let draft = ProductDraft::Update {
            id: EntityId::new("p1"),
            changes: ProductChanges {
                sku: Some("LS-01".to_string()),
                ..Default::default()
            },
        };
        assert!(draft.validate(&existing()).is_ok());
    }
}

//! Server-side collection state shared by the local services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Ordered};
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;
use crate::core::remote::{Page, PositionUpdate, RemoteError};

/// One collection as the server stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Table<T> {
    /// Counter for the next assigned id
    next_id: u64,
    items: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            items: Vec::new(),
        }
    }
}

impl<T: Entity> Table<T> {
    /// Start from existing records; the id counter continues after the highest one
    pub fn seeded(items: Vec<T>) -> Self {
        let highest = items
            .iter()
            .filter_map(|e| {
                e.id()
                    .as_str()
                    .strip_prefix(T::KIND.id_prefix())
                    .and_then(|n| n.parse::<u64>().ok())
            })
            .max()
            .unwrap_or(0);
        Self {
            next_id: highest + 1,
            items,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whole collection, or one page of it when the key asks for a page
    pub fn list(&self, key: &QueryKey, page_size: Option<usize>) -> Page<T> {
        let (Some(page), Some(size)) = (key.page_number(), page_size) else {
            return Page::complete(self.items.clone());
        };
        let size = size.max(1);
        let page = page.max(1);
        let len = self.items.len();
        let start = match (page as usize - 1).checked_mul(size) {
            Some(start) if start < len => start,
            _ => return Page::complete(Vec::new()),
        };
        let end = start.saturating_add(size).min(len);
        Page {
            items: self.items[start..end].to_vec(),
            next_page: if end < len { page.checked_add(1) } else { None },
        }
    }

    pub fn create(&mut self, draft: &T, now: DateTime<Utc>) -> Result<T, RemoteError> {
        self.check_label(draft.label(), None)?;
        let mut created = draft.clone();
        created.set_id(EntityId::assigned(T::KIND, self.next_id));
        created.stamp_created(now);
        self.next_id += 1;
        self.items.push(created.clone());
        Ok(created)
    }

    pub fn update(&mut self, entity: &T) -> Result<T, RemoteError> {
        let index = self.index_of(entity.id())?;
        self.check_label(entity.label(), Some(entity.id()))?;
        self.items[index] = entity.clone();
        Ok(entity.clone())
    }

    pub fn delete(&mut self, id: &EntityId) -> Result<(), RemoteError> {
        let index = self.index_of(id)?;
        self.items.remove(index);
        Ok(())
    }

    fn index_of(&self, id: &EntityId) -> Result<usize, RemoteError> {
        self.items
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| RemoteError::not_found(id))
    }

    fn check_label(&self, name: &str, except: Option<&EntityId>) -> Result<(), RemoteError> {
        let wanted = name.trim();
        let clash = self
            .items
            .iter()
            .filter(|e| Some(e.id()) != except)
            .any(|e| e.label().trim().eq_ignore_ascii_case(wanted));
        if clash {
            return Err(RemoteError::conflict(format!(
                "a {} named '{}' already exists",
                T::KIND.noun(),
                wanted
            )));
        }
        Ok(())
    }
}

impl<T: Ordered> Table<T> {
    /// Apply a whole batch or nothing
    pub fn put_order(&mut self, batch: &[PositionUpdate]) -> Result<(), RemoteError> {
        let mut indices = Vec::with_capacity(batch.len());
        for update in batch {
            indices.push((self.index_of(&update.id)?, update.position));
        }
        for (index, position) in indices {
            self.items[index].set_position(position);
        }
        self.items.sort_by_key(|e| e.position());
        Ok(())
    }
}

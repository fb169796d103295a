//! In-process implementation of the remote collection service

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use tracing::debug;

use crate::core::clock::{Clock, SystemClock};
use crate::core::entity::{Entity, Ordered};
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;
use crate::core::remote::{CollectionApi, OrderApi, Page, PositionUpdate, RemoteError};
use crate::service::table::Table;

/// A collection held in memory, with fault injection for tests
pub struct MemoryService<T> {
    table: RefCell<Table<T>>,
    faults: RefCell<VecDeque<RemoteError>>,
    offline: Cell<bool>,
    requests: Cell<usize>,
    page_size: Option<usize>,
}

impl<T: Entity> Default for MemoryService<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryService<T> {
    pub fn new() -> Self {
        Self {
            table: RefCell::new(Table::default()),
            faults: RefCell::new(VecDeque::new()),
            offline: Cell::new(false),
            requests: Cell::new(0),
            page_size: None,
        }
    }

    /// Serve paged keys in pages of `size`
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Replace the stored records
    pub fn seed(&self, items: Vec<T>) {
        *self.table.borrow_mut() = Table::seeded(items);
    }

    /// Copy of what the server currently stores
    pub fn items(&self) -> Vec<T> {
        self.table.borrow().items().to_vec()
    }

    /// Make the next request fail with `error`; queued failures apply in order
    pub fn fail_next(&self, error: RemoteError) {
        self.faults.borrow_mut().push_back(error);
    }

    /// Fail every request with a transport error while offline
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Requests received so far, failed ones included
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn admit(&self, op: &str) -> Result<(), RemoteError> {
        self.requests.set(self.requests.get() + 1);
        if self.offline.get() {
            return Err(RemoteError::Transport("service is offline".to_string()));
        }
        if let Some(error) = self.faults.borrow_mut().pop_front() {
            debug!(collection = %T::KIND, op, error = %error, "injected failure");
            return Err(error);
        }
        Ok(())
    }
}

impl<T: Entity> CollectionApi<T> for MemoryService<T> {
    fn list(&self, key: &QueryKey) -> Result<Page<T>, RemoteError> {
        self.admit("list")?;
        Ok(self.table.borrow().list(key, self.page_size))
    }

    fn create(&self, draft: &T) -> Result<T, RemoteError> {
        self.admit("create")?;
        self.table.borrow_mut().create(draft, SystemClock.now())
    }

    fn update(&self, entity: &T) -> Result<T, RemoteError> {
        self.admit("update")?;
        self.table.borrow_mut().update(entity)
    }

    fn delete(&self, id: &EntityId) -> Result<(), RemoteError> {
        self.admit("delete")?;
        self.table.borrow_mut().delete(id)
    }
}

impl<T: Ordered> OrderApi<T> for MemoryService<T> {
    fn put_order(&self, batch: &[PositionUpdate]) -> Result<(), RemoteError> {
        self.admit("put_order")?;
        self.table.borrow_mut().put_order(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::CollectionKind;
    use crate::entities::product::Product;

    fn service() -> MemoryService<Product> {
        let api = MemoryService::new().with_page_size(2);
        api.seed(vec![
            Product::new(EntityId::new("p1"), "Shirt", "S-1", 0),
            Product::new(EntityId::new("p2"), "Tote", "T-1", 1),
            Product::new(EntityId::new("p3"), "Scarf", "SC-1", 2),
        ]);
        api
    }

    #[test]
    fn test_injected_failures_apply_once_in_order() {
        let api = service();
        api.fail_next(RemoteError::rejected(500, "boom"));
        api.fail_next(RemoteError::Transport("reset".into()));
        let key = QueryKey::of(CollectionKind::Product);

        assert!(matches!(
            api.list(&key),
            Err(RemoteError::Rejected { status: 500, .. })
        ));
        assert!(matches!(api.list(&key), Err(RemoteError::Transport(_))));
        assert_eq!(api.list(&key).unwrap().items.len(), 3);
        assert_eq!(api.request_count(), 3);
    }

    #[test]
    fn test_offline_fails_everything() {
        let api = service();
        api.set_offline(true);
        assert!(api.delete(&EntityId::new("p1")).is_err());
        assert_eq!(api.items().len(), 3);
        api.set_offline(false);
        api.delete(&EntityId::new("p1")).unwrap();
        assert_eq!(api.items().len(), 2);
    }

    #[test]
    fn test_paged_listing() {
        let api = service();
        let page = api
            .list(&QueryKey::page(CollectionKind::Product, 1))
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn test_put_order_sorts_by_position() {
        let api = service();
        api.put_order(&[
            PositionUpdate {
                id: EntityId::new("p3"),
                position: 0,
            },
            PositionUpdate {
                id: EntityId::new("p1"),
                position: 1,
            },
            PositionUpdate {
                id: EntityId::new("p2"),
                position: 2,
            },
        ])
        .unwrap();
        let names: Vec<String> = api.items().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Scarf", "Shirt", "Tote"]);
    }
}

//! Background re-sync of store entries from the remote service

use std::time::Instant;

use tracing::{debug, warn};

use crate::core::entity::Entity;
use crate::core::query::QueryKey;
use crate::core::remote::{CollectionApi, RemoteError};
use crate::core::store::EntityStore;

/// Statistics from a refresh pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub refreshed: usize,
    /// Fetches that came back after a newer read or a write on the same key
    pub superseded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

/// Fetch one key through a ticket
///
/// Returns `Ok(false)` if the response was superseded. On error the entry
/// keeps its last known data and stays stale.
pub fn refresh<T, A>(
    store: &mut EntityStore<T>,
    api: &A,
    key: &QueryKey,
) -> Result<bool, RemoteError>
where
    T: Entity,
    A: CollectionApi<T> + ?Sized,
{
    let ticket = store.begin_fetch(key);
    let page = api.list(key)?;
    Ok(store.complete_fetch(ticket, page.items, page.next_page))
}

/// Refresh a page chain starting at `first`, following `next_page`
///
/// Returns the number of pages landed.
pub fn refresh_chain<T, A>(
    store: &mut EntityStore<T>,
    api: &A,
    first: &QueryKey,
) -> Result<usize, RemoteError>
where
    T: Entity,
    A: CollectionApi<T> + ?Sized,
{
    let mut key = first.clone();
    let mut pages = 0;
    loop {
        if !refresh(store, api, &key)? {
            break;
        }
        pages += 1;
        match store.read(&key).and_then(|e| e.next_page) {
            Some(next) if next != key.page_number().unwrap_or(0) => key = key.at_page(next),
            _ => break,
        }
    }
    Ok(pages)
}

/// Refresh every stale key of `T`'s collection
pub fn refresh_stale<T, A>(store: &mut EntityStore<T>, api: &A) -> SyncStats
where
    T: Entity,
    A: CollectionApi<T> + ?Sized,
{
    refresh_stale_where(store, api, |_| true)
}

/// Refresh the stale keys accepted by `wanted`
pub fn refresh_stale_where<T, A, F>(store: &mut EntityStore<T>, api: &A, wanted: F) -> SyncStats
where
    T: Entity,
    A: CollectionApi<T> + ?Sized,
    F: Fn(&QueryKey) -> bool,
{
    let start = Instant::now();
    let mut stats = SyncStats::default();
    let keys: Vec<QueryKey> = store
        .stale_keys()
        .into_iter()
        .filter(|k| k.collection() == T::KIND.as_str() && wanted(k))
        .collect();

    for key in keys {
        match refresh(store, api, &key) {
            Ok(true) => stats.refreshed += 1,
            Ok(false) => stats.superseded += 1,
            Err(e) => {
                warn!(key = %key, error = %e, "refresh failed; keeping last known data");
                stats.failed += 1;
            }
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        collection = %T::KIND,
        refreshed = stats.refreshed,
        superseded = stats.superseded,
        failed = stats.failed,
        "refresh pass finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{CollectionKind, EntityId};
    use crate::entities::category::Category;
    use crate::entities::product::Product;
    use crate::service::MemoryService;

    fn products(n: usize) -> Vec<Product> {
        (0..n)
            .map(|i| {
                Product::new(
                    EntityId::new(format!("p{}", i + 1)),
                    format!("Product {}", i + 1),
                    "",
                    i as u32,
                )
            })
            .collect()
    }

    #[test]
    fn test_refresh_lands_data_and_marks_fresh() {
        let api = MemoryService::<Category>::new();
        api.seed(vec![Category::new(EntityId::new("c1"), "Tops", 0)]);
        let mut store = EntityStore::new();
        let key = QueryKey::of(CollectionKind::Category);

        assert!(refresh(&mut store, &api, &key).unwrap());
        assert_eq!(store.data(&key).unwrap().len(), 1);
        assert!(!store.is_stale(&key));
        assert!(store.read(&key).unwrap().last_synced_at.is_some());
    }

    #[test]
    fn test_failed_refresh_keeps_last_known_data() {
        let api = MemoryService::<Category>::new();
        api.seed(vec![Category::new(EntityId::new("c1"), "Tops", 0)]);
        let mut store = EntityStore::new();
        let key = QueryKey::of(CollectionKind::Category);
        refresh(&mut store, &api, &key).unwrap();
        store.invalidate(&key);

        api.set_offline(true);
        assert!(refresh(&mut store, &api, &key).is_err());
        assert_eq!(store.data(&key).unwrap()[0].name, "Tops");
        assert!(store.is_stale(&key));
    }

    #[test]
    fn test_refresh_chain_follows_pages() {
        let api = MemoryService::<Product>::new().with_page_size(2);
        api.seed(products(5));
        let mut store = EntityStore::new();
        let first = QueryKey::page(CollectionKind::Product, 1);

        assert_eq!(refresh_chain(&mut store, &api, &first).unwrap(), 3);
        assert_eq!(store.read_flattened(&first).unwrap().len(), 5);
    }

    #[test]
    fn test_refresh_stale_counts_outcomes() {
        let api = MemoryService::<Product>::new().with_page_size(2);
        api.seed(products(3));
        let mut store = EntityStore::new();
        let p1 = QueryKey::page(CollectionKind::Product, 1);
        let p2 = QueryKey::page(CollectionKind::Product, 2);
        store.request(&p1);
        store.request(&p2);

        let stats = refresh_stale(&mut store, &api);
        assert_eq!(stats.refreshed, 2);
        assert_eq!(stats.failed, 0);
        assert!(store.stale_keys().is_empty());

        store.invalidate_collection(CollectionKind::Product.as_str());
        api.fail_next(RemoteError::Transport("reset".into()));
        let stats = refresh_stale(&mut store, &api);
        assert_eq!(stats.refreshed, 1);
        assert_eq!(stats.failed, 1);
    }
}

//! Snapshot capture and exact rollback of store entries

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::query::QueryKey;
use crate::core::store::{ChangeKind, EntityStore};

/// Owned copy of one entry's data at a point in time
///
/// The copy is structural (cloned elements), so later writes to the store
/// cannot reach into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    key: QueryKey,
    data: Option<Vec<T>>,
    taken_at: DateTime<Utc>,
}

impl<T> Snapshot<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The captured list (`None` if the key had never been fetched)
    pub fn data(&self) -> Option<&[T]> {
        self.data.as_deref()
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }
}

impl<T: Clone> EntityStore<T> {
    /// Copy the current data for `key`
    pub fn capture(&self, key: &QueryKey) -> Snapshot<T> {
        let data = self.data(key).map(<[T]>::to_vec);
        debug!(key = %key, items = data.as_ref().map_or(0, Vec::len), "captured snapshot");
        Snapshot {
            key: key.clone(),
            data,
            taken_at: self.now(),
        }
    }

    /// Put a snapshot back verbatim, discarding anything written since
    ///
    /// Writes made by other operations after the capture are lost as well;
    /// restoring is exact with respect to the snapshot, not a merge.
    pub fn restore(&mut self, snapshot: Snapshot<T>) {
        let Snapshot { key, data, .. } = snapshot;
        if data.is_none() && self.read(&key).is_none() {
            return;
        }
        debug!(key = %key, "restoring snapshot");
        self.replace_data(&key, data, ChangeKind::Restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{CollectionKind, EntityId};
    use crate::entities::category::Category;

    fn key() -> QueryKey {
        QueryKey::of(CollectionKind::Category)
    }

    fn store_with(names: &[&str]) -> EntityStore<Category> {
        let mut store = EntityStore::new();
        let items = names
            .iter()
            .enumerate()
            .map(|(i, n)| Category::new(EntityId::new(format!("c{}", i + 1)), *n, i as u32))
            .collect();
        let ticket = store.begin_fetch(&key());
        store.complete_fetch(ticket, items, None);
        store
    }

    #[test]
    fn test_capture_then_restore_is_identity() {
        let mut store = store_with(&["Tops", "Shoes"]);
        let before = store.read(&key()).cloned();
        let snap = store.capture(&key());
        store.restore(snap);
        assert_eq!(store.read(&key()).cloned(), before);
    }

    #[test]
    fn test_restore_undoes_optimistic_patch_exactly() {
        let mut store = store_with(&["Tops", "Shoes", "Hats"]);
        let before = store.data(&key()).unwrap().to_vec();
        let snap = store.capture(&key());

        store.write(&key(), |current| {
            let mut next: Vec<Category> = current.unwrap_or(&[]).to_vec();
            next.remove(1);
            next[0].name = "Renamed".to_string();
            next
        });
        assert_ne!(store.data(&key()).unwrap(), before.as_slice());

        store.restore(snap);
        assert_eq!(store.data(&key()).unwrap(), before.as_slice());
    }

    #[test]
    fn test_snapshot_is_not_a_live_reference() {
        let mut store = store_with(&["Tops"]);
        let snap = store.capture(&key());
        store.write(&key(), |_| Vec::new());
        assert_eq!(snap.data().unwrap().len(), 1);
        assert_eq!(snap.data().unwrap()[0].name, "Tops");
    }

    #[test]
    fn test_restore_of_unfetched_key_returns_to_unfetched() {
        let mut store: EntityStore<Category> = EntityStore::new();
        store.request(&key());
        let snap = store.capture(&key());
        assert!(snap.data().is_none());

        store.write(&key(), |_| vec![Category::new(EntityId::temporary(), "New", 0)]);
        store.restore(snap);
        assert!(store.data(&key()).is_none());
    }

    #[test]
    fn test_restore_discards_later_unrelated_writes() {
        let mut store = store_with(&["Tops"]);
        let snap = store.capture(&key());
        store.write(&key(), |c| {
            let mut v = c.unwrap_or(&[]).to_vec();
            v.push(Category::new(EntityId::new("c9"), "Other op", 1));
            v
        });
        store.restore(snap);
        assert_eq!(store.data(&key()).unwrap().len(), 1);
    }
}

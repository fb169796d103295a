//! In-memory entity store: the client-side projection of server collections
//!
//! The store maps a [`QueryKey`] to the last known complete list for that
//! query plus staleness metadata. It is an explicit object owned by whoever
//! drives the UI; all writers go through `write`, `invalidate`, fetch tickets
//! or snapshot `restore`, and never hold references into its internals.
//!
//! Reads are stale-while-revalidate: invalidation only moves `stale_until`,
//! it never clears data.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::core::clock::{Clock, SystemClock};
use crate::core::query::QueryKey;

/// Default time a freshly synced entry stays fresh
pub const DEFAULT_STALE_AFTER_SECS: i64 = 30;

/// The cached state of one query
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: QueryKey,
    /// `None` until first fetched; otherwise the complete list for the key
    pub data: Option<Vec<T>>,
    /// When the server last confirmed this entry
    pub last_synced_at: Option<DateTime<Utc>>,
    /// When the entry turns stale; `None` means never by age
    pub stale_until: Option<DateTime<Utc>>,
    /// Next page in the chain, for paged queries
    pub next_page: Option<u32>,
}

impl<T> CacheEntry<T> {
    fn empty(key: QueryKey) -> Self {
        Self {
            key,
            data: None,
            last_synced_at: None,
            stale_until: None,
            next_page: None,
        }
    }

    /// True once any data has been stored
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// True if a reader should trigger a refresh
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match (&self.data, self.stale_until) {
            (None, _) => true,
            (Some(_), Some(until)) => now >= until,
            (Some(_), None) => false,
        }
    }

    /// The list, or an empty slice if never fetched
    pub fn items(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// What happened to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Server data arrived through a fetch
    Synced,
    /// Data replaced by a producer (optimistic or committed)
    Written,
    /// Data put back from a snapshot
    Restored,
    /// Entry marked stale
    Invalidated,
}

/// Notification delivered to subscribers after every change
#[derive(Debug)]
pub struct StoreEvent<'a, T> {
    pub kind: ChangeKind,
    pub entry: &'a CacheEntry<T>,
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&StoreEvent<'_, T>)>;

struct Subscriber<T> {
    id: SubscriptionId,
    key: QueryKey,
    callback: Callback<T>,
}

/// Proof that a read was started; only the newest ticket for a key may land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

/// Keyed cache of entity lists
pub struct EntityStore<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
    generations: HashMap<QueryKey, u64>,
    subscribers: Vec<Subscriber<T>>,
    next_subscription: u64,
    clock: Box<dyn Clock>,
    stale_after: Option<Duration>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityStore<T> {
    /// Create an empty store on the system clock
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            generations: HashMap::new(),
            subscribers: Vec::new(),
            next_subscription: 1,
            clock: Box::new(SystemClock),
            stale_after: Some(Duration::seconds(DEFAULT_STALE_AFTER_SECS)),
        }
    }

    /// Use another clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// How long synced data stays fresh (`None`: until invalidated)
    pub fn with_stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Look up an entry without side effects
    pub fn read(&self, key: &QueryKey) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// The list for a key, if loaded
    pub fn data(&self, key: &QueryKey) -> Option<&[T]> {
        self.entries.get(key).and_then(|e| e.data.as_deref())
    }

    /// Register interest in a key, creating an empty (stale) entry on first use
    pub fn request(&mut self, key: &QueryKey) -> &CacheEntry<T> {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::empty(key.clone()))
    }

    /// All known keys
    pub fn keys(&self) -> impl Iterator<Item = &QueryKey> {
        self.entries.keys()
    }

    /// Replace the list for `key` with the producer's result
    ///
    /// The producer sees the current list (or `None` if never fetched) and the
    /// store is only touched once it has returned.
    pub fn write<F>(&mut self, key: &QueryKey, producer: F)
    where
        F: FnOnce(Option<&[T]>) -> Vec<T>,
    {
        let next = producer(self.data(key));
        self.replace_data(key, Some(next), ChangeKind::Written);
    }

    /// Fallible `write`: on `Err` the prior value is left untouched
    pub fn try_write<F, E>(&mut self, key: &QueryKey, producer: F) -> Result<(), E>
    where
        F: FnOnce(Option<&[T]>) -> Result<Vec<T>, E>,
    {
        let next = producer(self.data(key))?;
        self.replace_data(key, Some(next), ChangeKind::Written);
        Ok(())
    }

    /// Apply a patch only if the key holds data; returns whether it ran
    pub fn patch_loaded<F>(&mut self, key: &QueryKey, patch: F) -> bool
    where
        F: FnOnce(&[T]) -> Vec<T>,
    {
        let next = match self.data(key) {
            Some(current) => patch(current),
            None => return false,
        };
        self.replace_data(key, Some(next), ChangeKind::Written);
        true
    }

    /// Mark an entry stale without dropping its data; returns false if unknown
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        let now = self.clock.now();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale_until = Some(now);
                self.notify(key, ChangeKind::Invalidated);
                true
            }
            None => false,
        }
    }

    /// Invalidate every key of a collection (all pages, all filters)
    pub fn invalidate_collection(&mut self, collection: &str) -> usize {
        let keys: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|k| k.collection() == collection)
            .cloned()
            .collect();
        keys.iter().filter(|k| self.invalidate(k)).count()
    }

    /// True if the key is unknown, never fetched, or past `stale_until`
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .get(key)
            .map_or(true, |e| e.is_stale(self.clock.now()))
    }

    /// Keys that need a refresh, in stable order
    pub fn stale_keys(&self) -> Vec<QueryKey> {
        let now = self.clock.now();
        let mut keys: Vec<QueryKey> = self
            .entries
            .values()
            .filter(|e| e.is_stale(now))
            .map(|e| e.key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Start a read for `key`; any older ticket for the key is superseded
    pub fn begin_fetch(&mut self, key: &QueryKey) -> FetchTicket {
        self.request(key);
        let generation = self.bump_generation(key);
        FetchTicket {
            key: key.clone(),
            generation,
        }
    }

    /// Make every outstanding ticket for `key` land as a no-op
    pub fn cancel_fetches(&mut self, key: &QueryKey) {
        self.bump_generation(key);
    }

    /// True if this ticket would still be applied
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.generations.get(&ticket.key).copied().unwrap_or(0) == ticket.generation
    }

    /// Land a fetched page; returns false if the ticket was superseded
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        items: Vec<T>,
        next_page: Option<u32>,
    ) -> bool {
        if !self.is_current(&ticket) {
            debug!(key = %ticket.key, "discarding superseded fetch");
            return false;
        }

        let now = self.clock.now();
        // past the end of the calendar: never stale by age
        let stale_until = self.stale_after.and_then(|d| now.checked_add_signed(d));
        let entry = self
            .entries
            .entry(ticket.key.clone())
            .or_insert_with(|| CacheEntry::empty(ticket.key.clone()));
        entry.data = Some(items);
        entry.last_synced_at = Some(now);
        entry.stale_until = stale_until;
        entry.next_page = next_page;
        self.notify(&ticket.key, ChangeKind::Synced);
        true
    }

    /// Subscribe to changes of one key
    pub fn subscribe<F>(&mut self, key: QueryKey, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent<'_, T>) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            key,
            callback: Box::new(callback),
        });
        id
    }

    /// Drop a subscription; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Replace the data verbatim (snapshot restore and writes funnel here)
    pub(crate) fn replace_data(&mut self, key: &QueryKey, data: Option<Vec<T>>, kind: ChangeKind) {
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::empty(key.clone()));
        entry.data = data;
        self.notify(key, kind);
    }

    fn bump_generation(&mut self, key: &QueryKey) -> u64 {
        let generation = self.generations.entry(key.clone()).or_insert(0);
        *generation += 1;
        *generation
    }

    fn notify(&mut self, key: &QueryKey, kind: ChangeKind) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        let event = StoreEvent { kind, entry };
        for sub in self.subscribers.iter_mut().filter(|s| &s.key == key) {
            (sub.callback)(&event);
        }
    }
}

impl<T: Clone> EntityStore<T> {
    /// Concatenate a chain of pages starting at `first`
    ///
    /// Returns `None` if the first page was never fetched; stops at the first
    /// page in the chain that is not loaded.
    pub fn read_flattened(&self, first: &QueryKey) -> Option<Vec<T>> {
        let head = self.entries.get(first)?;
        let mut items = head.data.clone()?;
        let mut seen = HashSet::from([first.clone()]);
        let mut next = head.next_page;

        while let Some(page) = next {
            let key = first.at_page(page);
            if !seen.insert(key.clone()) {
                break;
            }
            match self.entries.get(&key).and_then(|e| e.data.as_ref().map(|d| (d, e.next_page))) {
                Some((data, following)) => {
                    items.extend(data.iter().cloned());
                    next = following;
                }
                None => break,
            }
        }
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::identity::CollectionKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn key() -> QueryKey {
        QueryKey::of(CollectionKind::Category)
    }

    fn loaded(items: Vec<&'static str>) -> EntityStore<&'static str> {
        let mut store = EntityStore::new();
        let ticket = store.begin_fetch(&key());
        assert!(store.complete_fetch(ticket, items, None));
        store
    }

    #[test]
    fn test_request_creates_stale_empty_entry() {
        let mut store: EntityStore<u32> = EntityStore::new();
        assert!(store.read(&key()).is_none());
        let entry = store.request(&key());
        assert!(!entry.is_loaded());
        assert!(store.is_stale(&key()));
    }

    #[test]
    fn test_write_replaces_and_notifies() {
        let mut store = loaded(vec!["a", "b"]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(key(), move |ev| {
            sink.borrow_mut().push((ev.kind, ev.entry.items().to_vec()));
        });

        store.write(&key(), |current| {
            let mut next = current.unwrap_or(&[]).to_vec();
            next.push("c");
            next
        });

        assert_eq!(store.data(&key()).unwrap(), &["a", "b", "c"]);
        assert_eq!(
            seen.borrow().as_slice(),
            &[(ChangeKind::Written, vec!["a", "b", "c"])]
        );
    }

    #[test]
    fn test_try_write_failure_preserves_prior_value() {
        let mut store = loaded(vec!["a"]);
        let result: Result<(), &str> = store.try_write(&key(), |_| Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(store.data(&key()).unwrap(), &["a"]);
    }

    #[test]
    fn test_patch_loaded_skips_unfetched_keys() {
        let mut store: EntityStore<&str> = EntityStore::new();
        assert!(!store.patch_loaded(&key(), |_| vec!["x"]));
        assert!(store.data(&key()).is_none());
    }

    #[test]
    fn test_invalidate_keeps_data() {
        let clock = ManualClock::new(Utc::now());
        let mut store = EntityStore::new()
            .with_clock(clock.clone())
            .with_stale_after(None);
        let ticket = store.begin_fetch(&key());
        store.complete_fetch(ticket, vec![1, 2], None);
        assert!(!store.is_stale(&key()));

        assert!(store.invalidate(&key()));
        assert!(store.is_stale(&key()));
        assert_eq!(store.data(&key()).unwrap(), &[1, 2]);
        assert!(!store.invalidate(&QueryKey::new("unknown")));
    }

    #[test]
    fn test_entries_go_stale_after_configured_time() {
        let clock = ManualClock::new(Utc::now());
        let mut store = EntityStore::new()
            .with_clock(clock.clone())
            .with_stale_after(Some(Duration::seconds(30)));
        let ticket = store.begin_fetch(&key());
        store.complete_fetch(ticket, vec![1], None);

        clock.advance(Duration::seconds(29));
        assert!(store.stale_keys().is_empty());
        clock.advance(Duration::seconds(1));
        assert_eq!(store.stale_keys(), vec![key()]);
    }

    #[test]
    fn test_window_beyond_calendar_never_goes_stale_by_age() {
        let clock = ManualClock::new(Utc::now());
        let mut store = EntityStore::new()
            .with_clock(clock.clone())
            .with_stale_after(Some(Duration::seconds(10_000_000_000_000)));
        let ticket = store.begin_fetch(&key());
        assert!(store.complete_fetch(ticket, vec![1], None));

        assert_eq!(store.read(&key()).unwrap().stale_until, None);
        clock.advance(Duration::days(365));
        assert!(!store.is_stale(&key()));
        assert!(store.invalidate(&key()));
        assert!(store.is_stale(&key()));
    }

    #[test]
    fn test_cancelled_fetch_does_not_land() {
        let mut store = loaded(vec!["old"]);
        let ticket = store.begin_fetch(&key());
        store.write(&key(), |_| vec!["optimistic"]);
        store.cancel_fetches(&key());

        assert!(!store.complete_fetch(ticket, vec!["stale-get"], None));
        assert_eq!(store.data(&key()).unwrap(), &["optimistic"]);
    }

    #[test]
    fn test_newer_fetch_supersedes_older() {
        let mut store: EntityStore<u8> = EntityStore::new();
        let first = store.begin_fetch(&key());
        let second = store.begin_fetch(&key());
        assert!(store.complete_fetch(second, vec![2], None));
        assert!(!store.complete_fetch(first, vec![1], None));
        assert_eq!(store.data(&key()).unwrap(), &[2]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut store = loaded(vec!["a"]);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(key(), move |_| *sink.borrow_mut() += 1);
        store.invalidate(&key());
        assert!(store.unsubscribe(id));
        store.invalidate(&key());
        assert_eq!(*count.borrow(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn test_subscribers_only_see_their_key() {
        let mut store = loaded(vec!["a"]);
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        store.subscribe(QueryKey::of(CollectionKind::Season), move |_| {
            *sink.borrow_mut() += 1
        });
        store.write(&key(), |_| vec!["b"]);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_read_flattened_follows_page_chain() {
        let mut store: EntityStore<u32> = EntityStore::new();
        let p1 = QueryKey::page(CollectionKind::Product, 1);
        let t1 = store.begin_fetch(&p1);
        store.complete_fetch(t1, vec![1, 2], Some(2));
        let t2 = store.begin_fetch(&p1.at_page(2));
        store.complete_fetch(t2, vec![3], None);

        assert_eq!(store.read_flattened(&p1).unwrap(), vec![1, 2, 3]);
        assert!(store
            .read_flattened(&QueryKey::page(CollectionKind::Season, 1))
            .is_none());
    }

    #[test]
    fn test_read_flattened_stops_at_missing_page() {
        let mut store: EntityStore<u32> = EntityStore::new();
        let p1 = QueryKey::page(CollectionKind::Product, 1);
        let t1 = store.begin_fetch(&p1);
        store.complete_fetch(t1, vec![1], Some(2));
        assert_eq!(store.read_flattened(&p1).unwrap(), vec![1]);
    }

    #[test]
    fn test_invalidate_collection_hits_every_page() {
        let mut store: EntityStore<u32> = EntityStore::new().with_stale_after(None);
        for page in 1..=3 {
            let t = store.begin_fetch(&QueryKey::page(CollectionKind::Product, page));
            store.complete_fetch(t, vec![page], None);
        }
        let t = store.begin_fetch(&key());
        store.complete_fetch(t, vec![0], None);

        assert_eq!(store.invalidate_collection("product-list"), 3);
        assert_eq!(store.stale_keys().len(), 3);
        assert!(!store.is_stale(&key()));
    }
}

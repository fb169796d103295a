//! The collection facade the UI talks to
//!
//! [`Collection`] bundles one entity store with the executor, the reorder
//! coordinators and selection trackers of its lists, and the notice queue.
//! Every call returns immediately with the optimistic result; subscribers see
//! each intermediate state through store events.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::core::clock::Clock;
use crate::core::entity::{Draft, Entity, Ordered, ValidationError};
use crate::core::identity::EntityId;
use crate::core::mutation::{
    Completion, ConflictResolution, Confirmed, Mutation, MutationError, MutationExecutor,
    PendingMutation,
};
use crate::core::notice::{Notice, NoticeAction, NoticeKind, Notices};
use crate::core::query::QueryKey;
use crate::core::remote::{CollectionApi, OrderApi, PositionUpdate, RemoteError};
use crate::core::reorder::{PersistPolicy, ReorderCoordinator, ReorderError, SaveState};
use crate::core::selection::{SelectionError, SelectionTracker};
use crate::core::store::{CacheEntry, EntityStore, StoreEvent, SubscriptionId};
use crate::core::sync::{self, SyncStats};

/// One server collection as seen by the admin UI
pub struct Collection<T, A> {
    store: EntityStore<T>,
    api: Rc<A>,
    executor: MutationExecutor,
    reorders: HashMap<QueryKey, ReorderCoordinator>,
    selections: HashMap<QueryKey, SelectionTracker>,
    notices: Notices,
    policy: PersistPolicy,
    conflict: ConflictResolution,
    refresh_on_commit: bool,
}

impl<T, A> Collection<T, A>
where
    T: Entity + 'static,
    A: CollectionApi<T> + 'static,
{
    pub fn new(api: Rc<A>) -> Self {
        Self {
            store: EntityStore::new(),
            api,
            executor: MutationExecutor::new(),
            reorders: HashMap::new(),
            selections: HashMap::new(),
            notices: Notices::default(),
            policy: PersistPolicy::default(),
            conflict: ConflictResolution::default(),
            refresh_on_commit: true,
        }
    }

    /// How long synced data stays fresh (`None`: until invalidated)
    pub fn with_stale_after(mut self, stale_after: Option<Duration>) -> Self {
        self.store = self.store.with_stale_after(stale_after);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.store = self.store.with_clock(clock);
        self
    }

    /// Policy for order saves on lists created from now on
    pub fn with_policy(mut self, policy: PersistPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// What to do when a mutation targets a key with mutations in flight
    pub fn with_conflict_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.conflict = resolution;
        self
    }

    /// Re-fetch a key right after a commit instead of waiting for the next read
    pub fn with_refresh_on_commit(mut self, enabled: bool) -> Self {
        self.refresh_on_commit = enabled;
        self
    }

    pub fn store(&self) -> &EntityStore<T> {
        &self.store
    }

    pub fn api(&self) -> &Rc<A> {
        &self.api
    }

    pub fn subscribe<F>(&mut self, key: QueryKey, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent<'_, T>) + 'static,
    {
        self.store.subscribe(key, callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// The entry for `key`, registering it for refresh if it is new
    pub fn read_current(&mut self, key: &QueryKey) -> &CacheEntry<T> {
        self.store.request(key)
    }

    /// The list for `key`, empty if never fetched
    pub fn items(&self, key: &QueryKey) -> &[T] {
        self.store.data(key).unwrap_or(&[])
    }

    /// Fetch `key` now; a list with an unsaved order is left alone
    pub fn refresh(&mut self, key: &QueryKey) -> Result<bool, RemoteError> {
        if self.holds_unsaved_order(key) {
            debug!(key = %key, "unsaved order; refresh skipped");
            return Ok(false);
        }
        let landed = sync::refresh(&mut self.store, self.api.as_ref(), key)?;
        self.sync_selection(key);
        Ok(landed)
    }

    /// Every loaded page of the chain starting at `first`, in order
    pub fn items_flattened(&self, first: &QueryKey) -> Vec<T> {
        self.store.read_flattened(first).unwrap_or_default()
    }

    /// Fetch every page of a chain starting at `first`
    pub fn refresh_pages(&mut self, first: &QueryKey) -> Result<usize, RemoteError> {
        let pages = sync::refresh_chain(&mut self.store, self.api.as_ref(), first)?;
        self.sync_selection(first);
        Ok(pages)
    }

    /// Fetch every stale key, skipping lists with an unsaved order
    pub fn refresh_stale(&mut self) -> SyncStats {
        let unsaved: Vec<QueryKey> = self
            .reorders
            .iter()
            .filter(|(_, c)| c.needs_save())
            .map(|(k, _)| k.clone())
            .collect();
        let stats = sync::refresh_stale_where(&mut self.store, self.api.as_ref(), |k| {
            !unsaved.contains(k)
        });
        let keys: Vec<QueryKey> = self.selections.keys().cloned().collect();
        for key in keys {
            self.sync_selection(&key);
        }
        stats
    }

    /// Validate a draft and run its mutation to completion
    pub fn submit_draft<D: Draft<T>>(
        &mut self,
        key: &QueryKey,
        draft: D,
    ) -> Result<Confirmed<T>, MutationError> {
        let pending = self.begin_draft(key, draft)?;
        let completion = pending.dispatch();
        self.finish(completion)
    }

    /// Validate a draft and apply its optimistic patch; the round trip is left to the caller
    pub fn begin_draft<D: Draft<T>>(
        &mut self,
        key: &QueryKey,
        draft: D,
    ) -> Result<PendingMutation<'static, T>, MutationError> {
        let existing = self.items(key);
        if let Err(e) = draft.validate(existing) {
            self.notify_rejected(&e);
            return Err(e.into());
        }
        let change = draft.into_change(existing);
        debug!(key = %key, verb = change.verb(), "draft accepted");
        let mutation = Mutation::from_change(key.clone(), change, Rc::clone(&self.api));
        self.submit(mutation)
    }

    /// Submit a prepared mutation under the collection's conflict policy
    pub fn submit(
        &mut self,
        mutation: Mutation<'static, T>,
    ) -> Result<PendingMutation<'static, T>, MutationError> {
        let key = mutation.key().clone();
        let resolution = self.conflict;
        let mutation = mutation.on_conflict(move |_| resolution);
        let pending = match self.executor.submit(&mut self.store, mutation) {
            Ok(pending) => pending,
            Err(e) => {
                self.notices.push(
                    NoticeKind::Warn,
                    "change not applied",
                    Some(e.to_string()),
                    None,
                    self.store.now(),
                );
                return Err(e);
            }
        };
        self.sync_selection(&key);
        Ok(pending)
    }

    /// Apply a finished round trip: commit or roll back
    pub fn finish(&mut self, completion: Completion<T>) -> Result<Confirmed<T>, MutationError> {
        let key = completion.key().clone();
        let result = self.executor.complete(&mut self.store, completion);
        match &result {
            Ok(_) => self.after_commit(&key),
            Err(e) => {
                self.notices.push(
                    NoticeKind::Error,
                    "change rolled back",
                    Some(e.to_string()),
                    None,
                    self.store.now(),
                );
                self.sync_selection(&key);
            }
        }
        result
    }

    /// Apply one edit to every selected entity of `key`
    ///
    /// All edits are shown at once and sent as one update per entity; any
    /// failure rolls back the whole batch.
    pub fn bulk_update<F>(&mut self, key: &QueryKey, mut edit: F) -> Result<Confirmed<T>, MutationError>
    where
        F: FnMut(&mut T),
    {
        let selected = self.selected_ids(key);
        let updated: Vec<T> = self
            .items(key)
            .iter()
            .filter(|e| selected.contains(e.id()))
            .map(|e| {
                let mut next = e.clone();
                edit(&mut next);
                next
            })
            .collect();
        if updated.is_empty() {
            let e = ValidationError::NoChanges;
            self.notify_rejected(&e);
            return Err(e.into());
        }
        info!(key = %key, items = updated.len(), "bulk update");
        let mutation = Mutation::bulk(key.clone(), updated, Rc::clone(&self.api));
        let pending = self.submit(mutation)?;
        let completion = pending.dispatch();
        self.finish(completion)
    }

    pub fn toggle_selection(
        &mut self,
        key: &QueryKey,
        id: &EntityId,
        index: usize,
        range: bool,
    ) -> Result<(), SelectionError> {
        self.tracker(key).toggle(id, index, range)
    }

    /// Toggle the entity displayed at `index`
    pub fn toggle_selection_at(
        &mut self,
        key: &QueryKey,
        index: usize,
        range: bool,
    ) -> Result<(), SelectionError> {
        self.tracker(key).toggle_at(index, range)
    }

    pub fn select_all(&mut self, key: &QueryKey) {
        self.tracker(key).select_all();
    }

    pub fn clear_selection(&mut self, key: &QueryKey) {
        self.tracker(key).clear();
    }

    pub fn selection(&self, key: &QueryKey) -> Option<&SelectionTracker> {
        self.selections.get(key)
    }

    /// Selected ids in display order
    pub fn selected_ids(&self, key: &QueryKey) -> Vec<EntityId> {
        self.selections
            .get(key)
            .map(SelectionTracker::selected_ids)
            .unwrap_or_default()
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Order save state of a list (`Saved` for lists never reordered)
    pub fn save_state(&self, key: &QueryKey) -> SaveState {
        self.reorders
            .get(key)
            .map(|c| c.state().clone())
            .unwrap_or_default()
    }

    fn after_commit(&mut self, key: &QueryKey) {
        if self.refresh_on_commit && self.executor.in_flight(key) == 0 {
            if let Err(e) = self.refresh(key) {
                warn!(key = %key, error = %e, "refresh after commit failed");
                self.notices.push(
                    NoticeKind::Warn,
                    "saved, but the list could not be reloaded",
                    Some(e.to_string()),
                    None,
                    self.store.now(),
                );
            }
        }
        self.sync_selection(key);
    }

    fn notify_rejected(&mut self, e: &ValidationError) {
        self.notices.push(
            NoticeKind::Warn,
            "change rejected",
            Some(e.to_string()),
            None,
            self.store.now(),
        );
    }

    fn holds_unsaved_order(&self, key: &QueryKey) -> bool {
        self.reorders.get(key).is_some_and(ReorderCoordinator::needs_save)
    }

    fn current_ids(&self, key: &QueryKey) -> Vec<EntityId> {
        self.items(key).iter().map(|e| e.id().clone()).collect()
    }

    /// Tracker bound to the current ordering of `key`
    fn tracker(&mut self, key: &QueryKey) -> &mut SelectionTracker {
        let ids = self.current_ids(key);
        let tracker = self
            .selections
            .entry(key.clone())
            .or_insert_with(|| SelectionTracker::new(ids.clone()));
        tracker.sync(&ids);
        tracker
    }

    fn sync_selection(&mut self, key: &QueryKey) {
        if !self.selections.contains_key(key) {
            return;
        }
        let ids = self.current_ids(key);
        if let Some(tracker) = self.selections.get_mut(key) {
            if tracker.sync(&ids) {
                debug!(key = %key, "list changed; selection reset");
            }
        }
    }
}

impl<T, A> Collection<T, A>
where
    T: Ordered + 'static,
    A: OrderApi<T> + 'static,
{
    /// Drag-release: move the entity at `from` to `to`
    pub fn move_item(&mut self, key: &QueryKey, from: usize, to: usize) -> Result<(), ReorderError> {
        coordinator(&mut self.reorders, &self.store, key, self.policy).apply_move(
            &mut self.store,
            from,
            to,
        )?;
        self.sync_selection(key);
        Ok(())
    }

    /// Move the contiguous block `lo..=hi` so it starts at `to`
    pub fn move_block(
        &mut self,
        key: &QueryKey,
        lo: usize,
        hi: usize,
        to: usize,
    ) -> Result<(), ReorderError> {
        coordinator(&mut self.reorders, &self.store, key, self.policy).apply_block_move(
            &mut self.store,
            lo,
            hi,
            to,
        )?;
        self.sync_selection(key);
        Ok(())
    }

    /// Persist the displayed order of `key`
    ///
    /// On failure the displayed order stays and a notice offers to save again.
    pub fn save_order(&mut self, key: &QueryKey) -> Result<usize, ReorderError> {
        let result = coordinator(&mut self.reorders, &self.store, key, self.policy)
            .save(&mut self.store, self.api.as_ref());
        match &result {
            Ok(_) => {
                if self.refresh_on_commit {
                    if let Err(e) = self.refresh(key) {
                        warn!(key = %key, error = %e, "refresh after order save failed");
                    }
                }
            }
            Err(e) => {
                let action = matches!(e, ReorderError::Persist { .. })
                    .then(|| NoticeAction::SaveOrder(key.clone()));
                self.notices.push(
                    NoticeKind::Warn,
                    "order not saved",
                    Some(e.to_string()),
                    action,
                    self.store.now(),
                );
            }
        }
        result
    }

    /// The pairs the next save of `key` would send
    pub fn pending_order(&mut self, key: &QueryKey) -> Result<Vec<PositionUpdate>, ReorderError> {
        coordinator(&mut self.reorders, &self.store, key, self.policy).pending_batch(&self.store)
    }
}

/// Coordinator for `key`; while nothing is unsaved the displayed order is the persisted one
fn coordinator<'r, T: Ordered>(
    reorders: &'r mut HashMap<QueryKey, ReorderCoordinator>,
    store: &EntityStore<T>,
    key: &QueryKey,
    policy: PersistPolicy,
) -> &'r mut ReorderCoordinator {
    let coord = reorders
        .entry(key.clone())
        .or_insert_with(|| ReorderCoordinator::new(key.clone(), policy));
    if !coord.needs_save() {
        if let Some(current) = store.data(key) {
            coord.mark_persisted(current);
        }
    }
    coord
}

//! Optimistic mutation lifecycle
//!
//! A mutation runs in three steps:
//!
//! 1. [`MutationExecutor::submit`] cancels in-flight reads of the key, captures
//!    a snapshot and applies the optimistic patch. The UI sees the change
//!    immediately.
//! 2. [`PendingMutation::dispatch`] performs the remote round trip. This is the
//!    only suspension point; pending mutations may be dispatched and completed
//!    in any order.
//! 3. [`MutationExecutor::complete`] either reconciles server-assigned fields and
//!    invalidates the collection, or restores the snapshot.
//!
//! Each mutation owns its own snapshot. Two mutations on the same key compose
//! in submission order, and rolling one back restores the state as it was
//! when *that* mutation started, not a transaction-wide origin.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::entity::{Change, Entity, ValidationError};
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;
use crate::core::remote::{CollectionApi, RemoteError};
use crate::core::snapshot::Snapshot;
use crate::core::store::EntityStore;

/// Pure function from the current list to the optimistic list
pub type Patch<'a, T> = Box<dyn FnOnce(&[T]) -> Vec<T> + 'a>;

/// The side-effecting round trip
pub type RemoteCall<'a, T> = Box<dyn FnOnce() -> Result<Confirmed<T>, RemoteError> + 'a>;

/// Decides what happens when a key already has mutations in flight
pub type ConflictHandler<'a> = Box<dyn FnOnce(&ConflictInfo) -> ConflictResolution + 'a>;

/// What the server confirmed
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmed<T> {
    /// The canonical entity after create/update
    Entity(T),
    /// Canonical entities after a bulk update
    Entities(Vec<T>),
    /// The entity is gone
    Removed(EntityId),
    /// Acknowledged without a body
    Accepted,
}

/// Kind of mutation, for messages and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Bulk,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
            MutationKind::Bulk => write!(f, "bulk update"),
        }
    }
}

/// Sequential id handed out by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Passed to a conflict handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub key: QueryKey,
    pub kind: MutationKind,
    /// Mutations on the key that have been submitted but not completed
    pub in_flight: usize,
}

/// Answer from a conflict handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictResolution {
    /// Apply on top of the pending mutations
    #[default]
    Compose,
    /// Reject before anything is written
    Abort,
}

/// One remote operation and its optimistic effect
pub struct Mutation<'a, T> {
    key: QueryKey,
    kind: MutationKind,
    patch: Patch<'a, T>,
    remote: RemoteCall<'a, T>,
    replaces: Option<EntityId>,
    on_conflict: Option<ConflictHandler<'a>>,
}

impl<'a, T: Entity + 'a> Mutation<'a, T> {
    pub fn new<P, R>(key: QueryKey, kind: MutationKind, patch: P, remote: R) -> Self
    where
        P: FnOnce(&[T]) -> Vec<T> + 'a,
        R: FnOnce() -> Result<Confirmed<T>, RemoteError> + 'a,
    {
        Self {
            key,
            kind,
            patch: Box::new(patch),
            remote: Box::new(remote),
            replaces: None,
            on_conflict: None,
        }
    }

    /// The optimistic entity with this id is swapped for the confirmed one
    pub fn replacing(mut self, id: EntityId) -> Self {
        self.replaces = Some(id);
        self
    }

    /// Install a conflict handler
    pub fn on_conflict<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&ConflictInfo) -> ConflictResolution + 'a,
    {
        self.on_conflict = Some(Box::new(handler));
        self
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Build the standard create/update/delete mutation for a change
    pub fn from_change<A>(key: QueryKey, change: Change<T>, api: Rc<A>) -> Self
    where
        A: CollectionApi<T> + 'a,
    {
        match change {
            Change::Create(draft) => {
                let temp_id = draft.id().clone();
                let optimistic = draft.clone();
                Self::new(
                    key,
                    MutationKind::Create,
                    move |current: &[T]| {
                        let mut next = current.to_vec();
                        next.push(optimistic);
                        next
                    },
                    move || api.create(&draft).map(Confirmed::Entity),
                )
                .replacing(temp_id)
            }
            Change::Update(entity) => {
                let id = entity.id().clone();
                let optimistic = entity.clone();
                Self::new(
                    key,
                    MutationKind::Update,
                    move |current: &[T]| replace_by_id(current, &optimistic),
                    move || api.update(&entity).map(Confirmed::Entity),
                )
                .replacing(id)
            }
            Change::Delete(id) => {
                let doomed = id.clone();
                Self::new(
                    key,
                    MutationKind::Delete,
                    move |current: &[T]| {
                        current.iter().filter(|e| e.id() != &doomed).cloned().collect()
                    },
                    move || api.delete(&id).map(|()| Confirmed::Removed(id)),
                )
            }
        }
    }

    /// Update several entities in one optimistic step
    ///
    /// The round trip issues one update per entity and stops at the first
    /// failure; the whole batch is then treated as failed.
    pub fn bulk<A>(key: QueryKey, updated: Vec<T>, api: Rc<A>) -> Self
    where
        A: CollectionApi<T> + 'a,
    {
        let optimistic = updated.clone();
        Self::new(
            key,
            MutationKind::Bulk,
            move |current: &[T]| {
                optimistic
                    .iter()
                    .fold(current.to_vec(), |list, e| replace_by_id(&list, e))
            },
            move || {
                updated
                    .iter()
                    .map(|e| api.update(e))
                    .collect::<Result<Vec<T>, RemoteError>>()
                    .map(Confirmed::Entities)
            },
        )
    }
}

/// A submitted mutation whose round trip has not happened yet
pub struct PendingMutation<'a, T> {
    id: MutationId,
    key: QueryKey,
    kind: MutationKind,
    snapshot: Snapshot<T>,
    remote: RemoteCall<'a, T>,
    replaces: Option<EntityId>,
}

impl<'a, T> PendingMutation<'a, T> {
    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    /// Perform the remote call
    pub fn dispatch(self) -> Completion<T> {
        let PendingMutation {
            id,
            key,
            kind,
            snapshot,
            remote,
            replaces,
        } = self;
        let result = remote();
        Completion {
            id,
            key,
            kind,
            snapshot,
            replaces,
            result,
        }
    }
}

/// The outcome of a round trip, waiting to be applied to the store
pub struct Completion<T> {
    id: MutationId,
    key: QueryKey,
    kind: MutationKind,
    snapshot: Snapshot<T>,
    replaces: Option<EntityId>,
    result: Result<Confirmed<T>, RemoteError>,
}

impl<T> Completion<T> {
    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Errors surfaced by the mutation path
#[derive(Debug, Error)]
pub enum MutationError {
    /// Rejected on the client; nothing was written
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Rejected by a conflict handler; nothing was written
    #[error("{kind} on '{key}' aborted: {in_flight} earlier mutation(s) still in flight")]
    Conflict {
        kind: MutationKind,
        key: QueryKey,
        in_flight: usize,
    },

    /// The server or transport failed; the optimistic change was rolled back
    #[error("{kind} on '{key}' failed and was rolled back: {source}")]
    Remote {
        kind: MutationKind,
        key: QueryKey,
        #[source]
        source: RemoteError,
    },
}

impl MutationError {
    /// True if the failure happened before any write
    pub fn is_validation(&self) -> bool {
        matches!(self, MutationError::Invalid(_))
    }

    /// The remote error behind a rollback
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            MutationError::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Orchestrates optimistic writes against an [`EntityStore`]
#[derive(Debug, Default)]
pub struct MutationExecutor {
    in_flight: HashMap<QueryKey, usize>,
    next_id: u64,
}

impl MutationExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations submitted on `key` that have not completed
    pub fn in_flight(&self, key: &QueryKey) -> usize {
        self.in_flight.get(key).copied().unwrap_or(0)
    }

    /// Snapshot and apply the optimistic patch; the remote call is deferred
    ///
    /// If the key was never fetched there is nothing to patch: the snapshot
    /// records the unfetched state and the round trip still happens.
    pub fn submit<'a, T: Entity>(
        &mut self,
        store: &mut EntityStore<T>,
        mutation: Mutation<'a, T>,
    ) -> Result<PendingMutation<'a, T>, MutationError> {
        let Mutation {
            key,
            kind,
            patch,
            remote,
            replaces,
            on_conflict,
        } = mutation;

        let in_flight = self.in_flight(&key);
        if in_flight > 0 {
            let info = ConflictInfo {
                key: key.clone(),
                kind,
                in_flight,
            };
            let resolution = on_conflict.map_or(ConflictResolution::Compose, |f| f(&info));
            if resolution == ConflictResolution::Abort {
                return Err(MutationError::Conflict {
                    kind,
                    key,
                    in_flight,
                });
            }
            debug!(key = %key, in_flight, "composing with pending mutations");
        }

        store.cancel_fetches(&key);
        let snapshot = store.capture(&key);
        let patched = store.patch_loaded(&key, patch);

        self.next_id += 1;
        let id = MutationId(self.next_id);
        *self.in_flight.entry(key.clone()).or_insert(0) += 1;
        debug!(mutation = %id, key = %key, %kind, patched, "submitted");

        Ok(PendingMutation {
            id,
            key,
            kind,
            snapshot,
            remote,
            replaces,
        })
    }

    /// Apply a finished round trip: commit or roll back
    pub fn complete<T: Entity>(
        &mut self,
        store: &mut EntityStore<T>,
        completion: Completion<T>,
    ) -> Result<Confirmed<T>, MutationError> {
        let Completion {
            id,
            key,
            kind,
            snapshot,
            replaces,
            result,
        } = completion;
        self.release(&key);

        match result {
            Ok(confirmed) => {
                drop(snapshot);
                reconcile(store, &key, replaces.as_ref(), &confirmed);
                store.invalidate_collection(key.collection());
                info!(mutation = %id, key = %key, %kind, "committed");
                Ok(confirmed)
            }
            Err(source) => {
                store.restore(snapshot);
                if kind == MutationKind::Bulk {
                    // the server may hold part of the batch
                    store.invalidate(&key);
                }
                warn!(mutation = %id, key = %key, %kind, error = %source, "rolled back");
                Err(MutationError::Remote { kind, key, source })
            }
        }
    }

    /// Submit, dispatch and complete in one go
    pub fn execute<T: Entity>(
        &mut self,
        store: &mut EntityStore<T>,
        mutation: Mutation<'_, T>,
    ) -> Result<Confirmed<T>, MutationError> {
        let pending = self.submit(store, mutation)?;
        let completion = pending.dispatch();
        self.complete(store, completion)
    }

    fn release(&mut self, key: &QueryKey) {
        if let Some(count) = self.in_flight.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(key);
            }
        }
    }
}

/// Replace the element with the same id, keeping its position
pub fn replace_by_id<T: Entity>(current: &[T], entity: &T) -> Vec<T> {
    current
        .iter()
        .map(|e| {
            if e.id() == entity.id() {
                entity.clone()
            } else {
                e.clone()
            }
        })
        .collect()
}

/// Swap the optimistic entity `old` for the server's copy
///
/// If the confirmed id is already in the list (a refresh landed first), the
/// optimistic entry is dropped so the entity appears exactly once.
pub fn replace_confirmed<T: Entity>(current: &[T], old: &EntityId, confirmed: &T) -> Vec<T> {
    let same = old == confirmed.id();
    let present = !same && current.iter().any(|e| e.id() == confirmed.id());
    current
        .iter()
        .filter_map(|e| {
            if e.id() == old {
                (!present).then(|| confirmed.clone())
            } else if !same && e.id() == confirmed.id() {
                Some(confirmed.clone())
            } else {
                Some(e.clone())
            }
        })
        .collect()
}

fn reconcile<T: Entity>(
    store: &mut EntityStore<T>,
    key: &QueryKey,
    replaces: Option<&EntityId>,
    confirmed: &Confirmed<T>,
) {
    match confirmed {
        Confirmed::Entity(entity) => {
            if let Some(old) = replaces {
                store.patch_loaded(key, |current| replace_confirmed(current, old, entity));
            }
        }
        Confirmed::Entities(entities) => {
            store.patch_loaded(key, |current| {
                entities
                    .iter()
                    .fold(current.to_vec(), |list, e| replace_by_id(&list, e))
            });
        }
        Confirmed::Removed(_) | Confirmed::Accepted => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::CollectionKind;
    use crate::entities::category::Category;
    use crate::service::MemoryService;

    fn key() -> QueryKey {
        QueryKey::of(CollectionKind::Category)
    }

    fn cat(id: &str, name: &str, order: u32) -> Category {
        Category::new(EntityId::new(id), name, order)
    }

    fn loaded(items: Vec<Category>) -> EntityStore<Category> {
        let mut store = EntityStore::new();
        let ticket = store.begin_fetch(&key());
        store.complete_fetch(ticket, items, None);
        store
    }

    fn names(store: &EntityStore<Category>) -> Vec<String> {
        store
            .data(&key())
            .unwrap_or(&[])
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn append(name: &'static str) -> impl FnOnce(&[Category]) -> Vec<Category> {
        move |current: &[Category]| {
            let mut next = current.to_vec();
            next.push(cat("tmp", name, next.len() as u32));
            next
        }
    }

    #[test]
    fn test_failure_restores_exact_prior_state() {
        let mut store = loaded(vec![cat("c1", "Tops", 0), cat("c2", "Shoes", 1)]);
        let before = store.read(&key()).cloned();
        let mut exec = MutationExecutor::new();

        let patches: Vec<Box<dyn FnOnce(&[Category]) -> Vec<Category>>> = vec![
            Box::new(|_| Vec::new()),
            Box::new(append("Hats")),
            Box::new(|c| c.iter().rev().cloned().collect()),
        ];
        for patch in patches {
            let m = Mutation::new(key(), MutationKind::Update, patch, || {
                Err(RemoteError::Transport("offline".into()))
            });
            let err = exec.execute(&mut store, m).unwrap_err();
            assert!(err.remote().is_some());
            assert_eq!(store.read(&key()).cloned(), before);
        }
    }

    #[test]
    fn test_optimistic_state_visible_before_dispatch() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();
        let m = Mutation::new(key(), MutationKind::Create, append("Hats"), || {
            Ok(Confirmed::Accepted)
        });
        let pending = exec.submit(&mut store, m).unwrap();
        assert_eq!(names(&store), vec!["Tops", "Hats"]);
        assert_eq!(exec.in_flight(&key()), 1);

        let done = pending.dispatch();
        assert!(done.is_success());
        exec.complete(&mut store, done).unwrap();
        assert_eq!(exec.in_flight(&key()), 0);
        assert!(store.is_stale(&key()));
    }

    #[test]
    fn test_success_invalidates_whole_collection() {
        let mut store: EntityStore<Category> = EntityStore::new().with_stale_after(None);
        let p1 = QueryKey::page(CollectionKind::Category, 1);
        let t = store.begin_fetch(&p1);
        store.complete_fetch(t, vec![cat("c1", "Tops", 0)], None);
        let t = store.begin_fetch(&key());
        store.complete_fetch(t, vec![cat("c1", "Tops", 0)], None);

        let mut exec = MutationExecutor::new();
        let m = Mutation::new(key(), MutationKind::Update, |c: &[Category]| c.to_vec(), || {
            Ok(Confirmed::Accepted)
        });
        exec.execute(&mut store, m).unwrap();
        assert!(store.is_stale(&key()));
        assert!(store.is_stale(&p1));
    }

    #[test]
    fn test_patches_compose_in_submission_order() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();

        let m1 = Mutation::new(key(), MutationKind::Create, append("First"), || {
            Ok(Confirmed::Accepted)
        });
        let m2 = Mutation::new(key(), MutationKind::Create, append("Second"), || {
            Ok(Confirmed::Accepted)
        });
        let p1 = exec.submit(&mut store, m1).unwrap();
        let p2 = exec.submit(&mut store, m2).unwrap();
        assert_eq!(exec.in_flight(&key()), 2);

        // network answers in reverse order
        let c2 = p2.dispatch();
        exec.complete(&mut store, c2).unwrap();
        let c1 = p1.dispatch();
        exec.complete(&mut store, c1).unwrap();

        assert_eq!(names(&store), vec!["Tops", "First", "Second"]);
    }

    #[test]
    fn test_second_rollback_restores_state_after_first_patch() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();

        let m1 = Mutation::new(key(), MutationKind::Create, append("First"), || {
            Ok(Confirmed::Accepted)
        });
        let m2 = Mutation::new(key(), MutationKind::Create, append("Second"), || {
            Err(RemoteError::conflict("duplicate"))
        });
        let p1 = exec.submit(&mut store, m1).unwrap();
        let p2 = exec.submit(&mut store, m2).unwrap();

        let c2 = p2.dispatch();
        assert!(exec.complete(&mut store, c2).is_err());
        assert_eq!(names(&store), vec!["Tops", "First"]);

        let c1 = p1.dispatch();
        exec.complete(&mut store, c1).unwrap();
        assert_eq!(names(&store), vec!["Tops", "First"]);
    }

    #[test]
    fn test_first_rollback_discards_later_patch() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();

        let m1 = Mutation::new(key(), MutationKind::Create, append("First"), || {
            Err(RemoteError::Transport("reset".into()))
        });
        let m2 = Mutation::new(key(), MutationKind::Create, append("Second"), || {
            Ok(Confirmed::Accepted)
        });
        let p1 = exec.submit(&mut store, m1).unwrap();
        let p2 = exec.submit(&mut store, m2).unwrap();

        let c2 = p2.dispatch();
        exec.complete(&mut store, c2).unwrap();
        let c1 = p1.dispatch();
        assert!(exec.complete(&mut store, c1).is_err());

        // m1's snapshot predates m2, so m2's optimistic entry goes with it
        assert_eq!(names(&store), vec!["Tops"]);
    }

    #[test]
    fn test_conflict_handler_can_abort() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();
        let m1 = Mutation::new(key(), MutationKind::Create, append("First"), || {
            Ok(Confirmed::Accepted)
        });
        let _p1 = exec.submit(&mut store, m1).unwrap();

        let m2 = Mutation::new(key(), MutationKind::Delete, |_: &[Category]| Vec::new(), || {
            Ok(Confirmed::Accepted)
        })
        .on_conflict(|info| {
            assert_eq!(info.in_flight, 1);
            ConflictResolution::Abort
        });
        let err = exec.submit(&mut store, m2).err().unwrap();
        assert!(matches!(err, MutationError::Conflict { in_flight: 1, .. }));
        assert_eq!(names(&store), vec!["Tops", "First"]);
        assert_eq!(exec.in_flight(&key()), 1);
    }

    #[test]
    fn test_conflict_handler_not_called_without_pending_mutations() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let mut exec = MutationExecutor::new();
        let m = Mutation::new(key(), MutationKind::Create, append("Hats"), || {
            Ok(Confirmed::Accepted)
        })
        .on_conflict(|_| ConflictResolution::Abort);
        assert!(exec.execute(&mut store, m).is_ok());
    }

    #[test]
    fn test_submit_cancels_in_flight_reads() {
        let mut store = loaded(vec![cat("c1", "Tops", 0)]);
        let ticket = store.begin_fetch(&key());
        let mut exec = MutationExecutor::new();
        let m = Mutation::new(key(), MutationKind::Create, append("Hats"), || {
            Ok(Confirmed::Accepted)
        });
        let _pending = exec.submit(&mut store, m).unwrap();

        assert!(!store.complete_fetch(ticket, vec![cat("c1", "Tops", 0)], None));
        assert_eq!(names(&store), vec!["Tops", "Hats"]);
    }

    #[test]
    fn test_unfetched_key_still_calls_remote() {
        let mut store: EntityStore<Category> = EntityStore::new();
        let mut exec = MutationExecutor::new();
        let called = std::cell::Cell::new(false);
        let m = Mutation::new(key(), MutationKind::Create, append("Hats"), || {
            called.set(true);
            Err(RemoteError::Transport("down".into()))
        });
        assert!(exec.execute(&mut store, m).is_err());
        assert!(called.get());
        assert!(store.data(&key()).is_none());
    }

    #[test]
    fn test_create_reconciles_temporary_id() {
        let api = Rc::new(MemoryService::<Category>::new());
        let mut store = loaded(Vec::new());
        let mut exec = MutationExecutor::new();

        let draft = Category::new(EntityId::temporary(), "Tops", 0);
        let m = Mutation::from_change(key(), Change::Create(draft), Rc::clone(&api));
        let confirmed = exec.execute(&mut store, m).unwrap();

        let Confirmed::Entity(created) = confirmed else {
            panic!("expected entity");
        };
        assert_eq!(created.id.as_str(), "c1");
        let list = store.data(&key()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id.as_str(), "c1");
    }

    #[test]
    fn test_replace_confirmed_drops_duplicate_when_refresh_landed_first() {
        let temp = EntityId::new("tmp-1");
        let current = vec![cat("c1", "Tops", 0), cat("tmp-1", "Tops", 1)];
        let confirmed = cat("c1", "Tops", 0);
        let next = replace_confirmed(&current, &temp, &confirmed);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id.as_str(), "c1");
    }

    #[test]
    fn test_replace_confirmed_keeps_position_for_updates() {
        let current = vec![cat("c1", "Tops", 0), cat("c2", "Shoes", 1)];
        let confirmed = cat("c1", "Shirts", 0);
        let next = replace_confirmed(&current, &EntityId::new("c1"), &confirmed);
        assert_eq!(next[0].name, "Shirts");
        assert_eq!(next[1].name, "Shoes");
    }

    #[test]
    fn test_bulk_failure_rolls_back_and_invalidates() {
        let api = Rc::new(MemoryService::<Category>::new());
        api.seed(vec![cat("c1", "Tops", 0), cat("c2", "Shoes", 1)]);
        let mut store = loaded(vec![cat("c1", "Tops", 0), cat("c2", "Shoes", 1)]);
        let before = store.data(&key()).unwrap().to_vec();
        let mut exec = MutationExecutor::new();

        // c3 is unknown to the server, so the batch fails on the second item
        let updated = vec![cat("c1", "Tops!", 0), cat("c3", "Ghost", 1)];
        let m = Mutation::bulk(key(), updated, Rc::clone(&api));
        let err = exec.execute(&mut store, m).unwrap_err();

        assert!(matches!(
            err.remote(),
            Some(RemoteError::Rejected { status: 404, .. })
        ));
        assert_eq!(store.data(&key()).unwrap(), before.as_slice());
        assert!(store.is_stale(&key()));
    }
}

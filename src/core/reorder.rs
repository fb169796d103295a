//! Drag-and-drop reordering and order persistence
//!
//! Every drag reduces to one call of [`move_item`]: remove at `from`, insert at
//! `to`. Moves are applied to the *current in-memory* list, so several drags
//! before a save stack up the way the operator saw them.
//!
//! Persisting sends `(id, position)` pairs where `position` is the index in the
//! displayed list. A failed save leaves the optimistic order in place and the
//! coordinator in [`SaveState::Failed`]; saving again resends the batch, which
//! is safe because it fully replaces the stored positions.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::core::entity::Ordered;
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;
use crate::core::remote::{OrderApi, PositionUpdate, RemoteError};
use crate::core::store::EntityStore;

/// Which pairs a save sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistPolicy {
    /// Every element with its index
    #[default]
    Full,
    /// Only elements whose position differs from the last persisted state
    Diff,
}

impl std::fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistPolicy::Full => write!(f, "full"),
            PersistPolicy::Diff => write!(f, "diff"),
        }
    }
}

impl FromStr for PersistPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(PersistPolicy::Full),
            "diff" => Ok(PersistPolicy::Diff),
            _ => Err(format!("Unknown reorder policy: {}", s)),
        }
    }
}

/// Whether the displayed order matches what the server stores
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Saved,
    Unsaved,
    /// The last save failed; the message is kept for display
    Failed(String),
}

/// Errors from reordering and saving an order
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReorderError {
    #[error("position {index} is out of range for a list of {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("invalid range {lo}..={hi}")]
    InvalidRange { lo: usize, hi: usize },

    #[error("'{0}' has not been loaded yet")]
    NotLoaded(QueryKey),

    #[error("'{0}' has not been confirmed by the server yet; save the order once it is")]
    Unconfirmed(EntityId),

    #[error("saving the order of '{key}' failed: {source}")]
    Persist {
        key: QueryKey,
        #[source]
        source: RemoteError,
    },
}

/// Move one element: remove it at `from`, insert it at `to`
pub fn move_item<T: Clone>(list: &[T], from: usize, to: usize) -> Result<Vec<T>, ReorderError> {
    let len = list.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::OutOfBounds { index, len });
        }
    }
    let mut next = list.to_vec();
    let item = next.remove(from);
    next.insert(to, item);
    Ok(next)
}

/// Move the contiguous block `lo..=hi` so that it starts at `to`
pub fn move_block<T: Clone>(
    list: &[T],
    lo: usize,
    hi: usize,
    to: usize,
) -> Result<Vec<T>, ReorderError> {
    let len = list.len();
    if lo > hi {
        return Err(ReorderError::InvalidRange { lo, hi });
    }
    if hi >= len {
        return Err(ReorderError::OutOfBounds { index: hi, len });
    }
    let width = hi - lo + 1;
    if to.checked_add(width).map_or(true, |end| end > len) {
        return Err(ReorderError::OutOfBounds { index: to, len });
    }

    let mut next = list.to_vec();
    if to > lo {
        for _ in 0..width {
            next = move_item(&next, lo, to + width - 1)?;
        }
    } else {
        for i in 0..width {
            next = move_item(&next, lo + i, to + i)?;
        }
    }
    Ok(next)
}

/// Set `position = index` for every element
pub fn assign_positions<T: Ordered>(list: &mut [T]) {
    for (i, item) in list.iter_mut().enumerate() {
        item.set_position(i as u32);
    }
}

/// The full `(id, index)` batch for a displayed list
pub fn position_batch<T: Ordered>(list: &[T]) -> Vec<PositionUpdate> {
    list.iter()
        .enumerate()
        .map(|(i, item)| PositionUpdate {
            id: item.id().clone(),
            position: i as u32,
        })
        .collect()
}

/// Tracks the order of one list between drags and saves
#[derive(Debug, Clone)]
pub struct ReorderCoordinator {
    key: QueryKey,
    policy: PersistPolicy,
    persisted: HashMap<EntityId, u32>,
    state: SaveState,
}

impl ReorderCoordinator {
    pub fn new(key: QueryKey, policy: PersistPolicy) -> Self {
        Self {
            key,
            policy,
            persisted: HashMap::new(),
            state: SaveState::Saved,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// True if the displayed order has not reached the server
    pub fn needs_save(&self) -> bool {
        self.state != SaveState::Saved
    }

    /// Record the order the server holds (after a fetch)
    pub fn mark_persisted<T: Ordered>(&mut self, list: &[T]) {
        self.persisted = list
            .iter()
            .map(|item| (item.id().clone(), item.position()))
            .collect();
        self.state = SaveState::Saved;
    }

    /// Apply a drag-release to the in-memory list
    pub fn apply_move<T: Ordered>(
        &mut self,
        store: &mut EntityStore<T>,
        from: usize,
        to: usize,
    ) -> Result<(), ReorderError> {
        self.rewrite(store, |current| move_item(current, from, to))
    }

    /// Move a contiguous block (e.g. a shift-selected range)
    pub fn apply_block_move<T: Ordered>(
        &mut self,
        store: &mut EntityStore<T>,
        lo: usize,
        hi: usize,
        to: usize,
    ) -> Result<(), ReorderError> {
        self.rewrite(store, |current| move_block(current, lo, hi, to))
    }

    /// The pairs the next save would send
    pub fn pending_batch<T: Ordered>(
        &self,
        store: &EntityStore<T>,
    ) -> Result<Vec<PositionUpdate>, ReorderError> {
        let current = store
            .data(&self.key)
            .ok_or_else(|| ReorderError::NotLoaded(self.key.clone()))?;
        if let Some(pending) = current.iter().find(|item| item.id().is_temporary()) {
            return Err(ReorderError::Unconfirmed(pending.id().clone()));
        }

        let full = position_batch(current);
        Ok(match self.policy {
            PersistPolicy::Full => full,
            PersistPolicy::Diff => full
                .into_iter()
                .filter(|u| self.persisted.get(&u.id) != Some(&u.position))
                .collect(),
        })
    }

    /// Send the displayed order to the server; returns the batch size
    pub fn save<T, A>(&mut self, store: &mut EntityStore<T>, api: &A) -> Result<usize, ReorderError>
    where
        T: Ordered,
        A: OrderApi<T> + ?Sized,
    {
        let batch = self.pending_batch(store)?;
        if batch.is_empty() {
            self.state = SaveState::Saved;
            return Ok(0);
        }

        match api.put_order(&batch) {
            Ok(()) => {
                for update in &batch {
                    self.persisted.insert(update.id.clone(), update.position);
                }
                self.state = SaveState::Saved;
                store.invalidate(&self.key);
                info!(key = %self.key, items = batch.len(), policy = %self.policy, "order saved");
                Ok(batch.len())
            }
            Err(source) => {
                self.state = SaveState::Failed(source.to_string());
                warn!(key = %self.key, error = %source, "order not saved; display keeps the new order");
                Err(ReorderError::Persist {
                    key: self.key.clone(),
                    source,
                })
            }
        }
    }

    fn rewrite<T, F>(&mut self, store: &mut EntityStore<T>, reorder: F) -> Result<(), ReorderError>
    where
        T: Ordered,
        F: FnOnce(&[T]) -> Result<Vec<T>, ReorderError>,
    {
        let key = self.key.clone();
        store.try_write(&self.key, |current| {
            let current = current.ok_or(ReorderError::NotLoaded(key))?;
            let mut next = reorder(current)?;
            assign_positions(&mut next);
            Ok(next)
        })?;
        self.state = SaveState::Unsaved;
        Ok(())
    }
}

//! Multi-select with shift-range toggling over one displayed list
//!
//! The tracker is bound to the ordering it was built for. Anchor indices are
//! only meaningful against that ordering, so [`SelectionTracker::sync`] resets
//! everything once the list's membership or order changes.

use std::collections::HashSet;

use thiserror::Error;

use crate::core::identity::EntityId;

/// Coarse state of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    NonEmpty,
}

/// Errors from selection events
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("index {index} is out of range for a list of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("'{id}' is not at index {index} in the current list")]
    Mismatch { id: EntityId, index: usize },
}

/// Selected ids plus the anchor for range toggles
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    order: Vec<EntityId>,
    selected: HashSet<EntityId>,
    anchor: Option<usize>,
}

impl SelectionTracker {
    /// Start an empty selection over an ordered list of ids
    pub fn new(order: Vec<EntityId>) -> Self {
        Self {
            order,
            selected: HashSet::new(),
            anchor: None,
        }
    }

    /// Rebind to a new ordering and clear everything
    pub fn reset(&mut self, order: Vec<EntityId>) {
        self.order = order;
        self.clear();
    }

    /// Reset only if the ordering actually changed; returns true if it did
    pub fn sync(&mut self, order: &[EntityId]) -> bool {
        if self.order == order {
            return false;
        }
        self.reset(order.to_vec());
        true
    }

    /// Handle a click on `id` at `index`
    ///
    /// A plain click flips `id` and moves the anchor. A range click sets every
    /// item between the anchor and `index` (inclusive) to the clicked item's
    /// new membership; without an anchor it behaves like a plain click.
    pub fn toggle(
        &mut self,
        id: &EntityId,
        index: usize,
        range: bool,
    ) -> Result<(), SelectionError> {
        match self.order.get(index) {
            None => {
                return Err(SelectionError::OutOfRange {
                    index,
                    len: self.order.len(),
                })
            }
            Some(at) if at != id => {
                return Err(SelectionError::Mismatch {
                    id: id.clone(),
                    index,
                })
            }
            Some(_) => {}
        }

        match (range, self.anchor) {
            (true, Some(anchor)) => {
                let target = !self.selected.contains(id);
                let (lo, hi) = (anchor.min(index), anchor.max(index));
                for item in &self.order[lo..=hi] {
                    if target {
                        self.selected.insert(item.clone());
                    } else {
                        self.selected.remove(item);
                    }
                }
            }
            _ => {
                if !self.selected.remove(id) {
                    self.selected.insert(id.clone());
                }
                self.anchor = Some(index);
            }
        }
        Ok(())
    }

    /// Toggle by index only
    pub fn toggle_at(&mut self, index: usize, range: bool) -> Result<(), SelectionError> {
        let id = self
            .order
            .get(index)
            .cloned()
            .ok_or(SelectionError::OutOfRange {
                index,
                len: self.order.len(),
            })?;
        self.toggle(&id, index, range)
    }

    /// Select every item; clears the anchor
    pub fn select_all(&mut self) {
        self.selected = self.order.iter().cloned().collect();
        self.anchor = None;
    }

    /// Deselect everything; clears the anchor
    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn state(&self) -> SelectionState {
        if self.selected.is_empty() {
            SelectionState::Empty
        } else {
            SelectionState::NonEmpty
        }
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected.contains(id)
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// The ordering the tracker is bound to
    pub fn order(&self) -> &[EntityId] {
        &self.order
    }

    /// Selected ids in display order
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.order
            .iter()
            .filter(|id| self.selected.contains(*id))
            .cloned()
            .collect()
    }
}

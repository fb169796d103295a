//! Operator-facing notices: a bounded queue with dedupe
//!
//! Rollbacks, failed order saves and rejected drafts land here. Nothing in the
//! engine blocks on a notice; the UI drains or dismisses them.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::core::query::QueryKey;

/// Default number of notices kept before the oldest is dropped
pub const DEFAULT_CAPACITY: usize = 16;

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warn,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Info => write!(f, "info"),
            NoticeKind::Warn => write!(f, "warning"),
            NoticeKind::Error => write!(f, "error"),
        }
    }
}

/// Follow-up the operator can take from a notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAction {
    /// Re-send the displayed order of this list
    SaveOrder(QueryKey),
}

pub type NoticeId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub title: String,
    pub body: Option<String>,
    pub action: Option<NoticeAction>,
    pub created: DateTime<Utc>,
}

/// In-memory notice queue
#[derive(Debug)]
pub struct Notices {
    queue: VecDeque<Notice>,
    max: usize,
    dedupe_window: Duration,
    next_id: NoticeId,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notices {
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            dedupe_window: Duration::seconds(5),
            next_id: 1,
        }
    }

    /// Push a notice, folding it into an identical one raised within the dedupe window
    pub fn push<S: Into<String>>(
        &mut self,
        kind: NoticeKind,
        title: S,
        body: Option<String>,
        action: Option<NoticeAction>,
        now: DateTime<Utc>,
    ) -> NoticeId {
        let title = title.into();

        if let Some(existing) = self.queue.iter_mut().find(|n| {
            n.kind == kind
                && n.title == title
                && n.body == body
                && n.action == action
                && now - n.created <= self.dedupe_window
        }) {
            existing.created = now;
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Notice {
            id,
            kind,
            title,
            body,
            action,
            created: now,
        });
        id
    }

    /// Remove one notice; returns false if it was already gone
    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|n| n.id != id);
        self.queue.len() != before
    }

    /// Take every pending notice, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        self.queue.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.queue.back()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

//! Core module - the cache engine and its supporting types

pub mod catalog;
pub mod clock;
pub mod config;
pub mod entity;
pub mod identity;
pub mod mutation;
pub mod notice;
pub mod project;
pub mod query;
pub mod remote;
pub mod reorder;
pub mod selection;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use catalog::Collection;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use entity::{Change, Draft, Entity, Ordered, Status, ValidationError};
pub use identity::{CollectionKind, EntityId, IdParseError};
pub use mutation::{
    Completion, ConflictInfo, ConflictResolution, Confirmed, Mutation, MutationError,
    MutationExecutor, MutationKind, PendingMutation,
};
pub use notice::{Notice, NoticeAction, NoticeKind, Notices};
pub use project::{Project, ProjectError};
pub use query::{QueryKey, QueryKeyError};
pub use remote::{CollectionApi, OrderApi, Page, PositionUpdate, RemoteError};
pub use reorder::{PersistPolicy, ReorderCoordinator, ReorderError, SaveState};
pub use selection::{SelectionError, SelectionState, SelectionTracker};
pub use snapshot::Snapshot;
pub use store::{CacheEntry, ChangeKind, EntityStore, StoreEvent, SubscriptionId};
pub use sync::SyncStats;

//! Contract of the remote collection service
//!
//! The service owns the data. It lists whole collections (optionally paged),
//! creates, updates and deletes single entities, and replaces an ordering in
//! one atomic batch. Transport and authentication live behind these traits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::entity::{Entity, Ordered};
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;

/// Errors reported by the remote collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server answered with a non-success status
    #[error("server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced an answer
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(id: &EntityId) -> Self {
        Self::rejected(404, format!("no entity with id '{}'", id))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::rejected(409, message)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page after this one, if any
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// A complete, unpaged listing
    pub fn complete(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// One element of a batch reorder request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: EntityId,
    pub position: u32,
}

/// CRUD access to one server collection
pub trait CollectionApi<T: Entity> {
    /// `GET /collection` (honouring the key's page parameter)
    fn list(&self, key: &QueryKey) -> Result<Page<T>, RemoteError>;

    /// `POST /collection`; the server assigns the final id
    fn create(&self, draft: &T) -> Result<T, RemoteError>;

    /// `PUT /collection`
    fn update(&self, entity: &T) -> Result<T, RemoteError>;

    /// `DELETE /collection?id=`
    fn delete(&self, id: &EntityId) -> Result<(), RemoteError>;
}

/// Batch ordering for orderable collections
pub trait OrderApi<T: Ordered>: CollectionApi<T> {
    /// `PUT /collection/order`; succeeds or fails for the whole batch
    fn put_order(&self, batch: &[PositionUpdate]) -> Result<(), RemoteError>;
}

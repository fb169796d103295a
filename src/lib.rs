//! Shelf: storefront catalog manager
//!
//! Categories, products and seasons are edited through an optimistic entity
//! cache: changes show up immediately, roll back exactly when the backend
//! refuses them, and lists re-sync once the backend confirms.

pub mod cli;
pub mod core;
pub mod entities;
pub mod service;

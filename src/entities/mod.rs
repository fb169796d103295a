//! Entity type definitions
//!
//! The catalog manages three server-owned collections:
//!
//! - [`Category`] - storefront menu entries, ordered by `displayOrder`
//! - [`Product`] - the product list, ordered by `index`
//! - [`Season`] - selling seasons with a date range
//!
//! Each entity has a matching draft enum describing what a form may submit.

pub mod category;
pub mod product;
pub mod season;

pub use category::{Category, CategoryDraft};
pub use product::{Product, ProductChanges, ProductDraft};
pub use season::{Season, SeasonChanges, SeasonDraft};

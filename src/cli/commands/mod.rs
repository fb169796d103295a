//! CLI command implementations

pub mod category;
pub mod completions;
pub mod init;
pub mod ordering;
pub mod product;
pub mod season;

//! Local implementations of the remote collection service
//!
//! [`MemoryService`] keeps a collection in process and supports fault
//! injection. [`FileService`] stores it as JSON in the project's data
//! directory, which is what the `shelf` binary talks to.

pub mod file;
pub mod memory;
mod table;

pub use file::FileService;
pub use memory::MemoryService;

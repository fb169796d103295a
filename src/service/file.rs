//! Collection service backed by JSON files in the project's data directory

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::clock::{Clock, SystemClock};
use crate::core::entity::{Entity, Ordered};
use crate::core::identity::EntityId;
use crate::core::query::QueryKey;
use crate::core::remote::{CollectionApi, OrderApi, Page, PositionUpdate, RemoteError};
use crate::service::table::Table;

/// One collection stored as `<data_dir>/<collection>.json`
///
/// Every request reads the file, applies the operation and writes it back.
/// File system failures surface as transport errors.
pub struct FileService<T> {
    path: PathBuf,
    page_size: Option<usize>,
    _entity: PhantomData<T>,
}

impl<T: Entity> FileService<T> {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", T::KIND.as_str())),
            page_size: None,
            _entity: PhantomData,
        }
    }

    /// Serve paged keys in pages of `size`
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records
    pub fn items(&self) -> Result<Vec<T>, RemoteError> {
        Ok(self.load()?.items().to_vec())
    }

    fn load(&self) -> Result<Table<T>, RemoteError> {
        if !self.path.exists() {
            return Ok(Table::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&content).map_err(|e| {
            RemoteError::Transport(format!("{} is corrupt: {}", self.path.display(), e))
        })
    }

    fn save(&self, table: &Table<T>) -> Result<(), RemoteError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(table)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), items = table.items().len(), "collection saved");
        Ok(())
    }

    /// Load, change and save in one step; nothing is written if `op` fails
    fn modify<R>(
        &self,
        op: impl FnOnce(&mut Table<T>) -> Result<R, RemoteError>,
    ) -> Result<R, RemoteError> {
        let mut table = self.load()?;
        let result = op(&mut table)?;
        self.save(&table)?;
        Ok(result)
    }

    fn io_error(&self, e: std::io::Error) -> RemoteError {
        RemoteError::Transport(format!("{}: {}", self.path.display(), e))
    }
}

impl<T: Entity> CollectionApi<T> for FileService<T> {
    fn list(&self, key: &QueryKey) -> Result<Page<T>, RemoteError> {
        Ok(self.load()?.list(key, self.page_size))
    }

    fn create(&self, draft: &T) -> Result<T, RemoteError> {
        self.modify(|table| table.create(draft, SystemClock.now()))
    }

    fn update(&self, entity: &T) -> Result<T, RemoteError> {
        self.modify(|table| table.update(entity))
    }

    fn delete(&self, id: &EntityId) -> Result<(), RemoteError> {
        self.modify(|table| table.delete(id))
    }
}

impl<T: Ordered> OrderApi<T> for FileService<T> {
    fn put_order(&self, batch: &[PositionUpdate]) -> Result<(), RemoteError> {
        self.modify(|table| table.put_order(batch))
    }
}

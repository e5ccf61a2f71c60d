//! Persistence for imported events and their pictures.

pub mod in_memory;
pub mod sqlite;

use crate::error::StorageError;
use crate::types::{Event, EventData, EventKey, Image};
use async_trait::async_trait;

pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage used by the importer. Returned events always carry their hash id.
#[async_trait]
pub trait Storage: Send + Sync {
    // Event operations
    async fn find_event_by_key(&self, key: &EventKey) -> StorageResult<Option<Event>>;
    async fn create_event(&self, key: EventKey, data: EventData) -> StorageResult<Event>;
    async fn update_event(&self, id: i64, data: EventData) -> StorageResult<Event>;
    /// All events ordered by start date, then id.
    async fn list_events(&self) -> StorageResult<Vec<Event>>;

    // Image operations
    async fn find_image_by_crc32(&self, crc32: u32) -> StorageResult<Option<Image>>;
    async fn image_name_exists(&self, name: &str) -> StorageResult<bool>;
    async fn create_image(&self, name: &str, crc32: u32) -> StorageResult<Image>;
}

use super::{Storage, StorageResult};
use crate::error::StorageError;
use crate::hash_ids::HashIds;
use crate::types::{Event, EventData, EventKey, Image};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct Tables {
    events: BTreeMap<i64, Event>,
    images: BTreeMap<i64, Image>,
    next_event_id: i64,
    next_image_id: i64,
}

/// In-memory storage implementation for dry runs and tests
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
    hash_ids: HashIds,
}

impl InMemoryStorage {
    pub fn new(hash_ids: HashIds) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            hash_ids,
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StorageError::Poisoned)
    }

    pub fn event_count(&self) -> usize {
        self.lock().map(|t| t.events.len()).unwrap_or(0)
    }

    pub fn image_count(&self) -> usize {
        self.lock().map(|t| t.images.len()).unwrap_or(0)
    }

    /// Mark an event private, as an administrator would.
    pub fn set_private(&self, id: i64, private: bool) -> StorageResult<()> {
        let mut tables = self.lock()?;
        let event = tables.events.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        event.private = private;
        Ok(())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new(HashIds::new("in-memory"))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn find_event_by_key(&self, key: &EventKey) -> StorageResult<Option<Event>> {
        let tables = self.lock()?;
        Ok(tables.events.values().find(|e| e.key() == *key).cloned())
    }

    async fn create_event(&self, key: EventKey, data: EventData) -> StorageResult<Event> {
        let mut tables = self.lock()?;
        tables.next_event_id += 1;
        let id = tables.next_event_id;
        let event = Event {
            id,
            hash_id: self.hash_ids.encode(id),
            original_event_id: key.original_event_id,
            start_date: key.start_date,
            name: data.name,
            category: data.category,
            days: data.days,
            image_id: data.image_id,
            location_name: data.location_name,
            location_address: data.location_address,
            original_link: data.original_link,
            latitude: data.latitude,
            longitude: data.longitude,
            private: false,
        };
        tables.events.insert(id, event.clone());
        debug!("Created event: {} with id {}", event.name, id);
        Ok(event)
    }

    async fn update_event(&self, id: i64, data: EventData) -> StorageResult<Event> {
        let mut tables = self.lock()?;
        let event = tables.events.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        event.apply(data);
        debug!("Updated event: {} with id {}", event.name, id);
        Ok(event.clone())
    }

    async fn list_events(&self) -> StorageResult<Vec<Event>> {
        let tables = self.lock()?;
        let mut events: Vec<Event> = tables.events.values().cloned().collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn find_image_by_crc32(&self, crc32: u32) -> StorageResult<Option<Image>> {
        let tables = self.lock()?;
        Ok(tables.images.values().find(|i| i.crc32 == crc32).cloned())
    }

    async fn image_name_exists(&self, name: &str) -> StorageResult<bool> {
        let tables = self.lock()?;
        Ok(tables.images.values().any(|i| i.name == name))
    }

    async fn create_image(&self, name: &str, crc32: u32) -> StorageResult<Image> {
        let mut tables = self.lock()?;
        tables.next_image_id += 1;
        let image = Image {
            id: tables.next_image_id,
            name: name.to_string(),
            crc32,
        };
        tables.images.insert(image.id, image.clone());
        debug!("Created image: {} with id {}", image.name, image.id);
        Ok(image)
    }
}

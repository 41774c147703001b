use crate::models::{EventKind, Record};
use futures_util::stream::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

/// Events buffered per subscriber before the slowest one starts losing them.
pub const DEFAULT_EVENT_BUFFER: usize = 1024;

type Entries = HashMap<Vec<u8>, Vec<u8>>;

pub struct Storage {
    maps: RwLock<HashMap<String, Entries>>,
    next_ordinal: AtomicU64,
    events: broadcast::Sender<Record>,
}

impl Storage {
    pub fn new() -> Self {
        Self::with_event_buffer(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            maps: RwLock::new(HashMap::new()),
            next_ordinal: AtomicU64::new(1),
            events,
        }
    }

    pub fn get(&self, map: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let maps = self.maps.read().map_err(|_| StorageError::Poisoned)?;
        Ok(maps.get(map).and_then(|entries| entries.get(key)).cloned())
    }

    pub fn put(
        &self,
        map: &str,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let mut maps = self.maps.write().map_err(|_| StorageError::Poisoned)?;
        let previous = maps
            .entry(map.to_string())
            .or_default()
            .insert(key.clone(), value.clone());

        let kind = if previous.is_some() {
            EventKind::Updated
        } else {
            EventKind::Inserted
        };
        self.publish(map, kind, key, Some(value), previous.clone());

        Ok(previous)
    }

    pub fn remove(&self, map: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let mut maps = self.maps.write().map_err(|_| StorageError::Poisoned)?;
        let previous = maps.get_mut(map).and_then(|entries| entries.remove(key));

        if let Some(old) = &previous {
            self.publish(map, EventKind::Deleted, key.to_vec(), None, Some(old.clone()));
        }

        Ok(previous)
    }

    pub fn values(&self, map: &str) -> Result<Vec<Vec<u8>>, StorageError> {
        let maps = self.maps.read().map_err(|_| StorageError::Poisoned)?;
        Ok(maps
            .get(map)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    #[cfg(test)]
    fn latest_ordinal(&self) -> u64 {
        self.next_ordinal.load(Ordering::SeqCst) - 1
    }

    /// Streams changes to `map` made after this call returns.
    ///
    /// A subscriber that falls more than the event buffer behind skips the
    /// events it missed.
    pub fn subscribe(&self, map: &str) -> Pin<Box<dyn Stream<Item = Record> + Send>> {
        let mut rx = self.events.subscribe();
        let map = map.to_string();

        Box::pin(async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(record) => {
                        if record.map == map {
                            yield record;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(map = %map, skipped, "subscriber lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    // Called with the maps lock held so ordinals follow mutation order.
    fn publish(
        &self,
        map: &str,
        kind: EventKind,
        key: Vec<u8>,
        new_value: Option<Vec<u8>>,
        old_value: Option<Vec<u8>>,
    ) {
        let ordinal = self.next_ordinal.fetch_add(1, Ordering::SeqCst);
        let record = Record::new(ordinal, map.to_string(), kind, key, new_value, old_value);
        // No receivers is not an error: nobody is listening.
        let _ = self.events.send(record);
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;

    #[test]
    fn put_and_remove_return_previous() {
        let storage = Storage::new();

        assert_eq!(storage.put("m", b"1".to_vec(), b"a".to_vec()).unwrap(), None);
        assert_eq!(
            storage.put("m", b"1".to_vec(), b"b".to_vec()).unwrap(),
            Some(b"a".to_vec())
        );
        assert_eq!(storage.get("m", b"1").unwrap(), Some(b"b".to_vec()));
        assert_eq!(storage.get("other", b"1").unwrap(), None);
        assert_eq!(storage.remove("m", b"1").unwrap(), Some(b"b".to_vec()));
        assert_eq!(storage.remove("m", b"1").unwrap(), None);
        assert!(storage.values("m").unwrap().is_empty());
    }

    #[test]
    fn removing_absent_key_publishes_nothing() {
        let storage = Storage::new();
        storage.put("m", b"1".to_vec(), b"a".to_vec()).unwrap();
        storage.remove("m", b"2").unwrap();

        assert_eq!(storage.latest_ordinal(), 1);
    }

    #[tokio::test]
    async fn subscriber_sees_only_its_map() {
        let storage = Storage::new();
        let mut events = storage.subscribe("customers");

        storage.put("other", b"1".to_vec(), b"x".to_vec()).unwrap();
        storage.put("customers", b"1".to_vec(), b"a".to_vec()).unwrap();
        storage.put("customers", b"1".to_vec(), b"b".to_vec()).unwrap();
        storage.remove("customers", b"1").unwrap();

        let mut kinds = Vec::new();
        for _ in 0..3 {
            let record = tokio::time::timeout(Duration::from_secs(1), events.next())
                .await
                .expect("event should arrive")
                .expect("stream open");
            assert_eq!(record.map, "customers");
            kinds.push((record.kind, record.ordinal));
        }

        assert_eq!(
            kinds,
            vec![
                (EventKind::Inserted, 2),
                (EventKind::Updated, 3),
                (EventKind::Deleted, 4),
            ]
        );
    }
}

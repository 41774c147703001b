//! Map change events and the listener capability.

use std::fmt;

/// Kind of mutation a [`MapEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventType {
    Inserted,
    Updated,
    Deleted,
}

impl fmt::Display for MapEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapEventType::Inserted => write!(f, "inserted"),
            MapEventType::Updated => write!(f, "updated"),
            MapEventType::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single change to a named map.
///
/// `new_value` is present for inserts and updates, `old_value` for updates
/// and deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent<K, V> {
    map: String,
    kind: MapEventType,
    key: K,
    new_value: Option<V>,
    old_value: Option<V>,
}

impl<K, V> MapEvent<K, V> {
    pub fn new(
        map: impl Into<String>,
        kind: MapEventType,
        key: K,
        new_value: Option<V>,
        old_value: Option<V>,
    ) -> Self {
        Self {
            map: map.into(),
            kind,
            key,
            new_value,
            old_value,
        }
    }

    pub fn inserted(map: impl Into<String>, key: K, value: V) -> Self {
        Self::new(map, MapEventType::Inserted, key, Some(value), None)
    }

    pub fn updated(map: impl Into<String>, key: K, value: V, old: V) -> Self {
        Self::new(map, MapEventType::Updated, key, Some(value), Some(old))
    }

    pub fn deleted(map: impl Into<String>, key: K, old: V) -> Self {
        Self::new(map, MapEventType::Deleted, key, None, Some(old))
    }

    pub fn map_name(&self) -> &str {
        &self.map
    }

    pub fn kind(&self) -> MapEventType {
        self.kind
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn new_value(&self) -> Option<&V> {
        self.new_value.as_ref()
    }

    pub fn old_value(&self) -> Option<&V> {
        self.old_value.as_ref()
    }

    /// Calls the listener method matching this event's kind.
    pub fn dispatch_to(&self, listener: &dyn MapListener<K, V>) {
        match self.kind {
            MapEventType::Inserted => listener.on_inserted(self),
            MapEventType::Updated => listener.on_updated(self),
            MapEventType::Deleted => listener.on_deleted(self),
        }
    }
}

/// Receives change notifications for a named map.
///
/// Callbacks run on the map's delivery task, never on the task that issued
/// the mutation, so they must not block. Every method defaults to a no-op.
pub trait MapListener<K, V>: Send + Sync {
    fn on_inserted(&self, _event: &MapEvent<K, V>) {}

    fn on_updated(&self, _event: &MapEvent<K, V>) {}

    fn on_deleted(&self, _event: &MapEvent<K, V>) {}
}

//! In-process named map.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::{RwLock, mpsc};

use crate::error::Error;
use crate::event::{MapEvent, MapListener};
use crate::filter::Filter;
use crate::listeners::{ListenerId, Listeners};
use crate::map::{MapKey, MapValue, NamedMap, ValueStream};

/// A [`NamedMap`] held in the current process.
///
/// Behaves like a remote map: mutations return the previous value, and
/// events reach listeners asynchronously, in mutation order, from a
/// dispatcher task started with the first listener registration.
pub struct LocalMap<K, V> {
    inner: Arc<LocalMapInner<K, V>>,
}

struct LocalMapInner<K, V> {
    name: String,
    entries: RwLock<HashMap<K, V>>,
    listeners: Arc<Listeners<K, V>>,
    events: OnceLock<mpsc::UnboundedSender<MapEvent<K, V>>>,
}

impl<K, V> Clone for LocalMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: MapKey, V: MapValue> LocalMap<K, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LocalMapInner {
                name: name.into(),
                entries: RwLock::new(HashMap::new()),
                listeners: Arc::new(Listeners::new()),
                events: OnceLock::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    // Must be called with the entries lock held so events queue in mutation
    // order.
    fn publish(&self, event: impl FnOnce() -> MapEvent<K, V>) {
        if let Some(events) = self.inner.events.get() {
            let _ = events.send(event());
        }
    }

    fn ensure_dispatcher(&self) {
        self.inner.events.get_or_init(|| {
            let (tx, mut rx) = mpsc::unbounded_channel::<MapEvent<K, V>>();
            let listeners = Arc::clone(&self.inner.listeners);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    listeners.dispatch(&event);
                }
            });
            tx
        });
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> NamedMap<K, V> for LocalMap<K, V> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        Ok(self.inner.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: K, value: V) -> Result<Option<V>, Error> {
        let mut entries = self.inner.entries.write().await;
        let previous = entries.insert(key.clone(), value.clone());

        let name = &self.inner.name;
        self.publish(|| match previous.clone() {
            Some(old) => MapEvent::updated(name.as_str(), key, value, old),
            None => MapEvent::inserted(name.as_str(), key, value),
        });

        Ok(previous)
    }

    async fn remove(&self, key: &K) -> Result<Option<V>, Error> {
        let mut entries = self.inner.entries.write().await;
        let previous = entries.remove(key);

        if let Some(old) = &previous {
            self.publish(|| MapEvent::deleted(self.inner.name.as_str(), key.clone(), old.clone()));
        }

        Ok(previous)
    }

    async fn values(&self) -> Result<ValueStream<V>, Error> {
        let snapshot: Vec<V> = self.inner.entries.read().await.values().cloned().collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    async fn add_listener(
        &self,
        listener: Arc<dyn MapListener<K, V>>,
        filter: Option<Filter>,
    ) -> Result<ListenerId, Error> {
        self.ensure_dispatcher();
        Ok(self.inner.listeners.add(listener, filter))
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool, Error> {
        Ok(self.inner.listeners.remove(id))
    }
}

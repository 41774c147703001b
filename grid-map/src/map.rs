//! The named map abstraction and its gRPC-backed implementation.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use grid_types::grid::map_server_client::MapServerClient;
use grid_types::grid::{GetRequest, PutRequest, RemoveRequest, SubscribeRequest, ValuesRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tonic::transport::Channel;

use crate::codec;
use crate::error::Error;
use crate::event::MapListener;
use crate::filter::Filter;
use crate::listeners::{ListenerId, Listeners};
use crate::session::SessionState;
use crate::sync::SyncTask;

/// Requirements on map keys.
pub trait MapKey:
    Serialize + DeserializeOwned + Clone + Eq + Hash + Debug + Send + Sync + 'static
{
}

impl<T> MapKey for T where
    T: Serialize + DeserializeOwned + Clone + Eq + Hash + Debug + Send + Sync + 'static
{
}

/// Requirements on map values.
pub trait MapValue: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {}

impl<T> MapValue for T where
    T: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
}

/// Lazily produced values of a map, in whatever order the map yields them.
pub type ValueStream<V> = BoxStream<'static, Result<V, Error>>;

/// A named key/value collection with change notifications.
///
/// Mutations return the value previously stored under the key. Listeners
/// are invoked asynchronously from a delivery task owned by the map; no
/// ordering is guaranteed between a mutation returning and its event being
/// delivered.
#[async_trait]
pub trait NamedMap<K: MapKey, V: MapValue>: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &K) -> Result<Option<V>, Error>;

    async fn put(&self, key: K, value: V) -> Result<Option<V>, Error>;

    async fn remove(&self, key: &K) -> Result<Option<V>, Error>;

    async fn values(&self) -> Result<ValueStream<V>, Error>;

    async fn add_listener(
        &self,
        listener: Arc<dyn MapListener<K, V>>,
        filter: Option<Filter>,
    ) -> Result<ListenerId, Error>;

    async fn remove_listener(&self, id: ListenerId) -> Result<bool, Error>;
}

/// A named map hosted by a grid server.
///
/// Obtained from [`Session::get_map`](crate::Session::get_map). Keys and
/// values are sent as JSON. The first listener registration opens an event
/// subscription on the server and spawns a background task delivering
/// events to all listeners of this handle; the subscription is dropped
/// again when the last listener is removed.
pub struct RemoteMap<K, V> {
    inner: Arc<RemoteMapInner<K, V>>,
}

struct RemoteMapInner<K, V> {
    name: String,
    client: MapServerClient<Channel>,
    listeners: Arc<Listeners<K, V>>,
    sync_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    session: SessionState,
}

impl<K, V> Clone for RemoteMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: MapKey, V: MapValue> RemoteMap<K, V> {
    pub(crate) fn new(
        name: String,
        client: MapServerClient<Channel>,
        session: SessionState,
    ) -> Self {
        Self {
            inner: Arc::new(RemoteMapInner {
                name,
                client,
                listeners: Arc::new(Listeners::new()),
                sync_handle: tokio::sync::Mutex::new(None),
                session,
            }),
        }
    }

    fn client(&self) -> Result<MapServerClient<Channel>, Error> {
        self.inner.session.ensure_open()?;
        Ok(self.inner.client.clone())
    }

    async fn start_sync(&self) -> Result<JoinHandle<()>, Error> {
        let request = SubscribeRequest {
            map: self.inner.name.clone(),
        };
        let stream = self.client()?.subscribe(request).await?.into_inner();

        let name = self.inner.name.clone();
        let task = SyncTask::new(name.clone(), stream, Arc::clone(&self.inner.listeners));
        let handle = tokio::spawn(async move {
            if let Err(e) = task.run().await {
                tracing::warn!(map = %name, error = %e, "event subscription ended");
            }
        });
        self.inner.session.track(&handle);

        Ok(handle)
    }
}

#[async_trait]
impl<K: MapKey, V: MapValue> NamedMap<K, V> for RemoteMap<K, V> {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        let request = GetRequest {
            map: self.inner.name.clone(),
            key: codec::encode(key)?,
        };
        let response = self.client()?.get(request).await?.into_inner();
        codec::decode_opt(response.value)
    }

    async fn put(&self, key: K, value: V) -> Result<Option<V>, Error> {
        let request = PutRequest {
            map: self.inner.name.clone(),
            key: codec::encode(&key)?,
            value: codec::encode(&value)?,
        };
        let response = self.client()?.put(request).await?.into_inner();
        codec::decode_opt(response.previous)
    }

    async fn remove(&self, key: &K) -> Result<Option<V>, Error> {
        let request = RemoveRequest {
            map: self.inner.name.clone(),
            key: codec::encode(key)?,
        };
        let response = self.client()?.remove(request).await?.into_inner();
        codec::decode_opt(response.previous)
    }

    async fn values(&self) -> Result<ValueStream<V>, Error> {
        let request = ValuesRequest {
            map: self.inner.name.clone(),
        };
        let stream = self.client()?.values(request).await?.into_inner();

        Ok(stream
            .map(|result| -> Result<V, Error> {
                let record = result?;
                codec::decode(&record.value)
            })
            .boxed())
    }

    async fn add_listener(
        &self,
        listener: Arc<dyn MapListener<K, V>>,
        filter: Option<Filter>,
    ) -> Result<ListenerId, Error> {
        self.inner.session.ensure_open()?;

        // Registry changes and task start/abort are serialized by this lock.
        let mut handle = self.inner.sync_handle.lock().await;
        let id = self.inner.listeners.add(listener, filter);

        if handle.as_ref().is_none_or(|h| h.is_finished()) {
            match self.start_sync().await {
                Ok(started) => *handle = Some(started),
                Err(e) => {
                    self.inner.listeners.remove(id);
                    return Err(e);
                }
            }
        }

        Ok(id)
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<bool, Error> {
        let mut handle = self.inner.sync_handle.lock().await;
        let removed = self.inner.listeners.remove(id);

        if self.inner.listeners.is_empty() {
            if let Some(task) = handle.take() {
                task.abort();
            }
        }

        Ok(removed)
    }
}

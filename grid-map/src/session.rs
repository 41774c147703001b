//! Connection to a grid server.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grid_types::grid::map_server_client::MapServerClient;
use tokio::task::{AbortHandle, JoinHandle};
use tonic::transport::{Channel, Endpoint};

use crate::error::Error;
use crate::map::{MapKey, MapValue, RemoteMap};

/// Address used when none is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:1408";

/// Environment variable overriding [`DEFAULT_ADDRESS`].
pub const ADDRESS_ENV: &str = "GRID_SERVER_ADDRESS";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Server address wrapper for type-safe connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr(pub String);

impl ServerAddr {
    /// Reads [`ADDRESS_ENV`], falling back to [`DEFAULT_ADDRESS`].
    pub fn from_env() -> Self {
        std::env::var(ADDRESS_ENV)
            .ok()
            .filter(|addr| !addr.trim().is_empty())
            .map(Self)
            .unwrap_or_default()
    }

    fn uri(&self) -> String {
        if self.0.contains("://") {
            self.0.clone()
        } else {
            format!("http://{}", self.0)
        }
    }
}

impl Default for ServerAddr {
    fn default() -> Self {
        Self(DEFAULT_ADDRESS.to_string())
    }
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ServerAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServerAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Shared between a session and the maps it hands out.
#[derive(Clone, Default)]
pub(crate) struct SessionState {
    closed: Arc<AtomicBool>,
    tasks: Arc<Mutex<Vec<AbortHandle>>>,
}

impl SessionState {
    pub fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    pub fn track(&self, handle: &JoinHandle<()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|task| !task.is_finished());
            tasks.push(handle.abort_handle());
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

/// A session with a grid server.
///
/// # Example
///
/// ```no_run
/// use grid_map::{NamedMap, Session};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let session = Session::connect("localhost:1408").await?;
///     let map = session.get_map::<i64, String>("greetings");
///
///     map.put(1, "hello".to_string()).await?;
///     assert_eq!(map.get(&1).await?, Some("hello".to_string()));
///
///     session.close();
///     Ok(())
/// }
/// ```
pub struct Session {
    addr: ServerAddr,
    client: MapServerClient<Channel>,
    state: SessionState,
}

impl Session {
    /// Connects to a grid server, failing if it cannot be reached within
    /// [`DEFAULT_CONNECT_TIMEOUT`].
    pub async fn connect(addr: impl Into<ServerAddr>) -> Result<Self, Error> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(
        addr: impl Into<ServerAddr>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let addr = addr.into();
        let endpoint = Endpoint::from_shared(addr.uri())
            .map_err(|_| Error::InvalidAddress(addr.0.clone()))?
            .connect_timeout(timeout);
        let channel = endpoint.connect().await?;

        tracing::debug!(address = %addr, "connected to grid server");

        Ok(Self {
            addr,
            client: MapServerClient::new(channel),
            state: SessionState::default(),
        })
    }

    /// Connects to the address named by [`ADDRESS_ENV`].
    pub async fn from_env() -> Result<Self, Error> {
        Self::connect(ServerAddr::from_env()).await
    }

    pub fn address(&self) -> &ServerAddr {
        &self.addr
    }

    /// Returns a handle to the named map. Maps are created on the server on
    /// first use.
    pub fn get_map<K: MapKey, V: MapValue>(&self, name: impl Into<String>) -> RemoteMap<K, V> {
        RemoteMap::new(name.into(), self.client.clone(), self.state.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.state.ensure_open().is_err()
    }

    /// Stops all event deliveries started through this session. Maps obtained
    /// from it fail with [`Error::SessionClosed`] afterwards.
    pub fn close(&self) {
        self.state.close();
        tracing::debug!(address = %self.addr, "grid session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_gets_scheme_when_missing() {
        assert_eq!(ServerAddr::from("localhost:1408").uri(), "http://localhost:1408");
        assert_eq!(ServerAddr::from("https://grid:443").uri(), "https://grid:443");
        assert_eq!(ServerAddr::default().0, DEFAULT_ADDRESS);
    }

    #[test]
    fn closed_state_rejects_operations() {
        let state = SessionState::default();
        assert!(state.ensure_open().is_ok());

        state.close();
        assert!(matches!(state.ensure_open(), Err(Error::SessionClosed)));
    }
}

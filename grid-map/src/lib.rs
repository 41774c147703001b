//! Named key/value maps served by the grid server.
//!
//! `grid-map` is the client side of the grid: a [`Session`] connects to a
//! server and hands out [`RemoteMap`] handles for named maps. Every map
//! implements [`NamedMap`], which is also implemented by the in-process
//! [`LocalMap`] so code written against the trait can run without a server.
//!
//! # Features
//!
//! - `get`/`put`/`remove` returning the previous value, and a lazy stream of
//!   all values
//! - Change listeners ([`MapListener`]) invoked asynchronously for inserts,
//!   updates and deletes
//! - Listener [`Filter`]s combining field predicates with an [`EventMask`]
//! - JSON encoding of keys and values on the wire
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use grid_map::{EventMask, Filter, MapEvent, MapListener, NamedMap, Session};
//!
//! struct Deletions;
//!
//! impl MapListener<i64, serde_json::Value> for Deletions {
//!     fn on_deleted(&self, event: &MapEvent<i64, serde_json::Value>) {
//!         println!("deleted {}", event.key());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::from_env().await?;
//!     let accounts = session.get_map::<i64, serde_json::Value>("accounts");
//!
//!     let filter = Filter::event(Filter::greater("balance", 5000.0), EventMask::DELETED);
//!     accounts.add_listener(Arc::new(Deletions), Some(filter)).await?;
//!
//!     accounts.put(1, serde_json::json!({ "balance": 9000.0 })).await?;
//!     accounts.remove(&1).await?;
//!     Ok(())
//! }
//! ```

mod codec;
mod error;
mod event;
mod filter;
mod listeners;
mod local;
mod map;
mod session;
mod sync;

pub use error::Error;
pub use event::{MapEvent, MapEventType, MapListener};
pub use filter::{Comparison, EventMask, Filter};
pub use listeners::ListenerId;
pub use local::LocalMap;
pub use map::{MapKey, MapValue, NamedMap, RemoteMap, ValueStream};
pub use session::{ADDRESS_ENV, DEFAULT_ADDRESS, DEFAULT_CONNECT_TIMEOUT, ServerAddr, Session};

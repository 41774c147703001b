//! REST façade over the replicated `customers` named map.
//!
//! Each handler performs a single operation on the map and serializes the
//! result as JSON. The map itself is reached through [`grid_map`]; this
//! crate keeps no copy of its contents between requests.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listeners;
pub mod models;
pub mod state;

pub use app::build_router;

//! In-memory grid server.
//!
//! Hosts any number of named maps, created on first use, and streams their
//! changes to subscribers. Nothing is persisted; a restart starts empty.

pub mod grpc;
pub mod models;
pub mod storage;

/// Address the server binds when `GRID_BIND_ADDRESS` is unset.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:1408";

pub const BIND_ENV: &str = "GRID_BIND_ADDRESS";

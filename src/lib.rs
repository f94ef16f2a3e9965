//! Check-in desk backend
//!
//! Keeps the client records of a check-in desk and tracks which single
//! client is currently being served.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod registry;

pub use config::Config;
pub use db::{ClientRepository, Database, MemoryClientRepository};
pub use models::{Client, ClientFields};
pub use registry::{ClientRegistry, RegistryError};

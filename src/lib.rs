pub mod config;
pub mod discovery_store;
pub mod server;
pub mod sqlite_persistence;

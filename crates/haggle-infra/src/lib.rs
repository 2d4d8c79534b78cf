//! Infrastructure layer for Haggle.
//!
//! Contains implementations of the ports defined in `haggle-core`: the SQLite
//! chat store, push notification senders, and the configuration loader.

pub mod config;
pub mod push;
pub mod sqlite;

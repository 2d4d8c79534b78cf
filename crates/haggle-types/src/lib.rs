//! Shared domain types for Haggle.
//!
//! This crate contains the domain types used across the listing chat engine:
//! conversations, participants, messages, devices, profiles, notification
//! payloads, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod device;
pub mod error;
pub mod message;
pub mod notification;
pub mod profile;

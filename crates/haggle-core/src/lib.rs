//! Business logic and storage port definitions for Haggle.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, the notification dispatcher, and the `ChatService` that
//! client-facing layers call. It depends only on `haggle-types` -- never on
//! `haggle-infra` or any database/IO crate.

pub mod chat;
pub mod notify;
pub mod repository;

//! Chat orchestration for Haggle.
//!
//! `ChatService` is the only entry point client-facing layers (HTTP, the
//! real-time hub) call. It validates requests, delegates to the storage
//! ports, and triggers notification fan-out after messages persist.

pub mod service;

pub use service::ChatService;

//! Offline notification fan-out.
//!
//! The dispatcher decides who gets notified about a new message and what the
//! notification says; delivery is delegated to a `NotificationSender`.

pub mod dispatcher;
pub mod sender;

pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use sender::NotificationSender;

//! SQLite storage layer.
//!
//! One store handle (`SqliteChatStore`) implements every chat port on top of a
//! WAL-mode database with split read/write connection pools. Each port's
//! implementation lives in its own module.

pub mod conversation;
pub mod device;
pub mod message;
pub mod pool;
pub mod profile;
pub mod projection;
pub mod read;
pub mod store;

pub use pool::DatabasePool;
pub use store::SqliteChatStore;

//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (haggle-infra) implements. The core crate never depends on any specific
//! storage technology.
//!
//! Every operation that touches more than one row states its atomicity
//! requirement in its doc comment; implementations must honor it with a
//! single store transaction.

pub mod conversation;
pub mod device;
pub mod message;
pub mod profile;
pub mod projection;
pub mod read;

pub use conversation::ConversationStore;
pub use device::DeviceStore;
pub use message::MessageStore;
pub use profile::ProfileStore;
pub use projection::ConversationListProjector;
pub use read::ReadTracker;

/// Every port `ChatService` needs, implemented by a single store handle.
pub trait ChatStore:
    ConversationStore + MessageStore + ReadTracker + ConversationListProjector + DeviceStore + ProfileStore
{
}

impl<T> ChatStore for T where
    T: ConversationStore
        + MessageStore
        + ReadTracker
        + ConversationListProjector
        + DeviceStore
        + ProfileStore
{
}

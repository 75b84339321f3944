//! Transcript storage
//!
//! Append-only message log per session. Sequence numbers are assigned by the
//! store, never by clients, and reads return messages in sequence order.

mod jsonl;
mod message;
mod store;

pub use jsonl::JsonlTranscriptStore;
pub use message::{DraftMessage, Message, MessageKind, SenderRole};
pub use store::{InMemoryTranscriptStore, TranscriptStore};

//! Session routing
//!
//! One `SessionRouter` task per session serializes every inbound event,
//! drives the session state machine, appends to the transcript and fans
//! outbound events out to the attached clients.

mod archive;
mod events;
mod registry;
mod router;

pub use archive::SessionArchive;
pub use events::{InboundEvent, OutboundEvent};
pub use registry::SessionRegistry;
pub use router::{ClientAttachment, ClientId, RouterDeps, RouterHandle, RouterSettings, SessionRouter};

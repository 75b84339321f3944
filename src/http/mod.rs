//! HTTP API server for interview clients and schedulers
//!
//! - POST /interviews - Schedule a session
//! - POST /interviews/:id/{invite,cancel,no-show} - Out-of-band lifecycle inputs
//! - GET /interviews/:id/ws - Live session channel (WebSocket)
//! - GET /interviews/:id/status - Session stats
//! - GET /interviews/:id/transcript - Full transcript in order
//! - GET /interviews/:id/signals - Analysis signals and summary
//! - GET /interviews/:id/score - Final score (after completion)
//! - GET /health - Health check

mod error;
mod handlers;
mod routes;
mod state;
mod ws;

pub use error::ApiError;
pub use handlers::{ScheduleRequest, ScheduleResponse, SignalsResponse, TransitionResponse};
pub use routes::create_router;
pub use state::AppState;

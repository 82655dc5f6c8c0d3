//! WebSocket / HTTP server for the whiteboard.

mod handler;
mod reaper;
mod router;
mod server;
mod signal;
pub mod state;

pub use handler::{ApiError, SESSION_COOKIE};
pub use reaper::{ReaperSchedule, spawn_reapers};
pub use router::{broadcast_presence, route};
pub use server::Server;
pub use signal::shutdown_signal;

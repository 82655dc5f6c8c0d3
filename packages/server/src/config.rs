//! Command line / environment configuration.
//!
//! Every option can be given as a flag or as a `RAKUGAKI_*` environment
//! variable. The typed policies handed to the services are derived from it.

use std::time::Duration;

use clap::Parser;

use crate::{
    domain::{DEFAULT_MAX_STROKES_PER_ROOM, DEFAULT_STROKE_RETAIN_MARGIN, StrokeCeiling},
    ui::ReaperSchedule,
    usecase::{DrawingPolicy, ReaperPolicy},
};

#[derive(Parser, Debug, Clone)]
#[command(name = "rakugaki-server")]
#[command(about = "Real-time collaborative whiteboard server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "RAKUGAKI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "RAKUGAKI_PORT", default_value_t = 4000)]
    pub port: u16,

    /// SQLite database for users, sessions and room records
    #[arg(long, env = "RAKUGAKI_DATABASE_URL", default_value = "sqlite://rakugaki.db")]
    pub database_url: String,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "RAKUGAKI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Strokes kept per room before the oldest are dropped
    #[arg(long, env = "RAKUGAKI_MAX_STROKES", default_value_t = DEFAULT_MAX_STROKES_PER_ROOM)]
    pub max_strokes: usize,

    /// How far below the ceiling a room is trimmed
    #[arg(long, env = "RAKUGAKI_STROKE_RETAIN_MARGIN", default_value_t = DEFAULT_STROKE_RETAIN_MARGIN)]
    pub stroke_retain_margin: usize,

    /// Reject draw events with a malformed color, size or missing coordinates
    #[arg(long, env = "RAKUGAKI_STRICT_DRAWING")]
    pub strict_drawing: bool,

    /// Seconds between idle room sweeps
    #[arg(long, env = "RAKUGAKI_SWEEP_INTERVAL_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,

    /// Idle seconds before an empty room without a durable record is dropped
    #[arg(long, env = "RAKUGAKI_INACTIVE_TIMEOUT_SECS", default_value_t = 30 * 60)]
    pub inactive_timeout_secs: u64,

    /// Idle seconds before an empty room with a durable record is dropped
    #[arg(long, env = "RAKUGAKI_ACTIVE_TIMEOUT_SECS", default_value_t = 24 * 60 * 60)]
    pub active_timeout_secs: u64,

    /// Seconds between purges of stale room records and expired sessions
    #[arg(long, env = "RAKUGAKI_PURGE_INTERVAL_SECS", default_value_t = 60 * 60)]
    pub purge_interval_secs: u64,

    /// Idle seconds after which a durable room record is deleted
    #[arg(long, env = "RAKUGAKI_RECORD_MAX_AGE_SECS", default_value_t = 7 * 24 * 60 * 60)]
    pub record_max_age_secs: u64,

    /// Session lifetime in days
    #[arg(long, env = "RAKUGAKI_SESSION_TTL_DAYS", default_value_t = 30)]
    pub session_ttl_days: u64,

    /// bcrypt work factor for room passwords
    #[arg(long, env = "RAKUGAKI_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    pub fn stroke_ceiling(&self) -> StrokeCeiling {
        StrokeCeiling::new(self.max_strokes, self.stroke_retain_margin)
    }

    pub fn drawing_policy(&self) -> DrawingPolicy {
        DrawingPolicy {
            strict: self.strict_drawing,
        }
    }

    pub fn reaper_policy(&self) -> ReaperPolicy {
        ReaperPolicy {
            inactive_timeout: Duration::from_secs(self.inactive_timeout_secs),
            active_timeout: Duration::from_secs(self.active_timeout_secs),
            record_max_age: Duration::from_secs(self.record_max_age_secs),
        }
    }

    pub fn reaper_schedule(&self) -> ReaperSchedule {
        ReaperSchedule {
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
            purge_interval: Duration::from_secs(self.purge_interval_secs),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days * 24 * 60 * 60)
    }
}

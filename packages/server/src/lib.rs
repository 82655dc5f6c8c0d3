//! Real-time collaborative whiteboard server.
//!
//! Clients connect over WebSocket, join named rooms and exchange strokes.
//! Every room keeps its strokes in memory so late joiners receive the
//! current canvas; users, sessions and room passwords live in SQLite.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

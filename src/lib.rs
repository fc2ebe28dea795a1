//! Arena Server - authoritative multiplayer arena shooter
//!
//! The server owns the match: it runs a fixed-rate simulation, resolves
//! movement and combat, and streams snapshots over WebSocket. The `client`
//! module holds the prediction and reconciliation logic a player's client
//! runs against those snapshots.

pub mod app;
pub mod client;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;

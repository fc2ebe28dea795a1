//! WebSocket transport

pub mod handler;
pub mod protocol;
pub mod registry;

pub use registry::ConnectionRegistry;

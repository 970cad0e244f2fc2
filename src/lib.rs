//! In-process publish/subscribe broker kernel: topic/subscriber registry,
//! bounded replay, per-subscriber backpressure, and the WebSocket/HTTP
//! adapters that bind it to the outside world.

pub mod api;
pub mod app;
pub mod core;
pub mod kernel;
pub mod session;

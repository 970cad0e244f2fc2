//! Session Controller: per-client frame schema, validation, and state
//! machine driving the WebSocket transport binding (spec.md §4.4, §6).

pub mod controller;
pub mod frame;

pub use controller::run;

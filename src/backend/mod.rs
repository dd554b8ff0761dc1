//! Backend worker: owns the HTTP session and the realtime subscription on a
//! dedicated thread with its own Tokio runtime, driven by `BackendAction`s
//! and reporting back through `GuiEvent`s.

mod client;
mod main_loop;
mod realtime;

pub use client::{RestClient, Session};
pub use main_loop::{run_backend, BackendConfig};
pub use realtime::Subscription;

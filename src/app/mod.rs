//! Application shell: owns the state, the forms, and the channel pair to
//! the backend thread.

mod core;
mod update;

pub use core::TeamChatApp;

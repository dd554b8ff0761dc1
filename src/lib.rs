//! TeamChat client library.
//!
//! This module re-exports the core components for testing and extension.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod forms;
pub mod protocol;
pub mod query;
pub mod state;
pub mod types;
pub mod ui;
pub mod validation;

#[cfg(test)]
mod integration_tests;

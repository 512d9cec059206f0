//! Outreach server library - REST API over the contact pipeline store.
//!
//! Routes, configuration, and application state live here rather than in
//! main.rs so that integration tests can drive the router directly.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

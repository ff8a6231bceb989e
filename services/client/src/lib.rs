//! services/client/src/lib.rs
//!
//! The Scroll Saga client: HTTP and storage adapters, the session layer, and
//! the view models the `saga` binary drives.

pub mod adapters;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod state;
pub mod views;

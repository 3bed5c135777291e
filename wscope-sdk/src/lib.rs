//! Shared types for the Walletscope API.
//!
//! `objects` holds the wire types exchanged between the dashboard frontend
//! and the server. The `client` feature adds a typed HTTP client.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;

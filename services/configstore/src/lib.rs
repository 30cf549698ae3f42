//! Versioned configuration store library crate.
//!
//! # Purpose
//! Exposes the HTTP API, configuration, storage backends, and the pure
//! building blocks they share (validation, cursors, fingerprints, documents,
//! folder browsing) for use by the binary and tests.
pub mod api;
pub mod app;
pub mod browse;
pub mod config;
pub mod cursor;
pub mod document;
pub mod fingerprint;
pub mod model;
pub mod observability;
pub mod store;
pub mod validate;

//! Shared utilities for the Fontscout workspace.
//!
//! Currently this is just [`observability`], the centralised `tracing`
//! initialisation used by the binary and integration tests. Kept
//! dependency-light so every crate can pull it in.

pub mod observability;

//! Relayforge daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `relayforge-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod logging;
pub mod orchestrator;
pub mod sinks;
pub mod source;

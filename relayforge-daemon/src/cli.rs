//! CLI argument definitions for relayforge-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Relayforge event delivery daemon.
///
/// Ingests cloud security events from a queue, transforms them into
/// the enabled output formats via mapping templates, and delivers the
/// results to their destinations.
#[derive(Parser, Debug)]
#[command(name = "relayforge-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to relayforge.toml configuration file.
    #[arg(short, long, default_value = "/etc/relayforge/relayforge.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and mapping templates, then exit.
    #[arg(long)]
    pub validate: bool,

    /// Process everything currently in the queue file and exit instead
    /// of staying resident.
    #[arg(long)]
    pub drain: bool,
}

impl DaemonCli {
    /// Apply CLI overrides onto a loaded configuration.
    pub fn apply_overrides(&self, config: &mut relayforge_core::config::RelayforgeConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}

//! CLI command definitions for the `haggle` binary.

pub mod inbox;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Listing-scoped buyer/seller chat service.
#[derive(Parser)]
#[command(name = "haggle", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data directory holding haggle.db and config.toml.
    #[arg(long, global = true, env = "HAGGLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log line format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: String,

    /// Export spans via OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Print a user's conversation list.
    Inbox {
        /// User whose inbox to show.
        user_id: uuid::Uuid,

        /// Maximum conversations to show.
        #[arg(short, long)]
        limit: Option<u32>,
    },
}

impl Cli {
    /// Log filter implied by `--quiet` and `-v`.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn,haggle=info",
            1 => "info,haggle_core=debug,haggle_infra=debug",
            _ => "trace",
        }
    }
}

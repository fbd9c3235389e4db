//! CLI definitions for stepcast.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// stepcast CLI.
#[derive(Parser)]
#[command(name = "stepcast")]
#[command(about = "Record UI interactions and relay them into reproduction steps")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.stepcast/config.toml)
    #[arg(short, long, global = true, env = "STEPCAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the broadcast relay server
    Relay {
        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port (also settable through RECORDER_WS_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Connect to the relay and build reproduction steps from what arrives
    Consume {
        /// Relay host
        #[arg(long)]
        host: Option<String>,

        /// Relay port; remembered for later runs
        #[arg(long)]
        port: Option<u16>,

        /// Draft file to load and keep saved
        #[arg(long)]
        draft: Option<PathBuf>,

        /// Do not stamp steps with their event time
        #[arg(long)]
        no_timestamps: bool,

        /// Write step screenshots into this directory on exit
        #[arg(long)]
        screenshots: Option<PathBuf>,
    },

    /// Replay scripted interactions on a page snapshot and record them
    Record {
        /// Page snapshot (JSON element tree)
        #[arg(long)]
        page: PathBuf,

        /// Interaction script (JSON list of actions)
        #[arg(long)]
        script: PathBuf,

        /// Relay URL (default from config)
        #[arg(long)]
        url: Option<String>,

        /// Queue up to this many events while the relay is unreachable
        #[arg(long)]
        queue: Option<usize>,

        /// Seconds to wait for the relay before giving up
        #[arg(long, default_value_t = 10)]
        connect_timeout: u64,
    },
}

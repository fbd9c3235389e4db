//! stepcast - turn UI interactions into reproduction steps
//!
//! Main entry point for the relay, consumer and recorder.

mod cli;
mod cmd_record;
mod server;

use std::time::Duration;

use clap::Parser;

use cli::{Cli, Commands};
use cmd_record::RecordOptions;
use server::ConsumeOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = server::load_config(cli.config.as_deref())?;
    server::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Relay { host, port } => server::run_relay(config, host, port).await,
        Commands::Consume {
            host,
            port,
            draft,
            no_timestamps,
            screenshots,
        } => {
            let options = ConsumeOptions {
                host,
                port,
                draft,
                no_timestamps,
                screenshots,
            };
            server::run_consumer(config, options).await
        }
        Commands::Record {
            page,
            script,
            url,
            queue,
            connect_timeout,
        } => {
            let options = RecordOptions {
                page,
                script,
                url,
                queue,
                connect_timeout: Duration::from_secs(connect_timeout),
            };
            cmd_record::run_record(config, options).await
        }
    }
}

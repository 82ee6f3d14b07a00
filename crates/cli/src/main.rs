//! Command-line tool for deploying and driving wireless channel emulation
//! topologies, and for running the Channel Service standalone.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cmd_channel_server, cmd_deploy, cmd_destroy, cmd_status, cmd_validate};
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision and run a topology until interrupted, then tear it down
    Deploy {
        /// Topology declaration file (JSON)
        topology: String,

        /// Channel Service base URL
        #[arg(long, default_value = "http://127.0.0.1:8070")]
        service_url: String,
    },

    /// Tear down the namespaces/interfaces a topology would have provisioned
    Destroy {
        /// Topology declaration file (JSON)
        topology: String,
    },

    /// Query the Channel Service's health endpoint
    Status {
        /// Channel Service base URL
        #[arg(long, default_value = "http://127.0.0.1:8070")]
        service_url: String,
    },

    /// Run the Channel Service HTTP server
    ChannelServer {
        #[arg(long, default_value = "127.0.0.1")]
        bind_address: String,

        #[arg(long, default_value_t = 8070)]
        port: u16,

        /// Force the analytic propagation engine even when a geometric scene is loaded
        #[arg(long)]
        force_analytic: bool,
    },

    /// Validate a topology declaration without provisioning anything
    Validate {
        /// Topology declaration file (JSON)
        topology: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Deploy { topology, service_url } => cmd_deploy(topology, service_url).await?,
        Commands::Destroy { topology } => cmd_destroy(topology).await?,
        Commands::Status { service_url } => cmd_status(service_url).await?,
        Commands::ChannelServer {
            bind_address,
            port,
            force_analytic,
        } => cmd_channel_server(bind_address, port, force_analytic).await?,
        Commands::Validate { topology } => cmd_validate(topology)?,
    }

    Ok(())
}

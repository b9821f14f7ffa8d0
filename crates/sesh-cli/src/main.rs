//! sesh - CLI for a session-protected API.
//!
//! A thin wrapper over `sesh-http` that keeps its session in a file, so
//! tokens issued by `sesh login` are reused and refreshed by later runs.

mod cli;
mod commands;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{login, logout, refresh, request, sessions, whoami};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Login(args) => login::run(&cli.api, args).await,
        Commands::Whoami(args) => whoami::run(&cli.api, args).await,
        Commands::Refresh(args) => refresh::run(&cli.api, args).await,
        Commands::Logout(args) => logout::run(&cli.api, args).await,
        Commands::Sessions(args) => sessions::run(&cli.api, args).await,
        Commands::Request(args) => request::run(&cli.api, args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr; stdout carries command output.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

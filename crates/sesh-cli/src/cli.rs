//! CLI argument definitions.

use clap::{Parser, Subcommand};

use sesh_core::ApiUrl;

use crate::commands::{login, logout, refresh, request, sessions, whoami};

/// Log in to a session-protected API and call it.
#[derive(Parser, Debug)]
#[command(name = "sesh")]
#[command(author, version = env!("SESH_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, env = "SESH_API", default_value = ApiUrl::DEFAULT, global = true)]
    pub api: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Display the stored session
    Whoami(whoami::WhoamiArgs),

    /// Refresh the session tokens
    Refresh(refresh::RefreshArgs),

    /// End the session on the server and locally
    Logout(logout::LogoutArgs),

    /// List sessions of a user
    Sessions(sessions::SessionsArgs),

    /// Send an authenticated request
    Request(request::RequestArgs),
}

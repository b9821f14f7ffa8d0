//! Sessions command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::state;

#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// User whose sessions to list (defaults to the logged-in user)
    #[arg(long)]
    pub user_id: Option<i64>,

    /// Include refresh tokens (admin only)
    #[arg(long)]
    pub admin: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(api: &str, args: SessionsArgs) -> Result<()> {
    let client = state::open_client(api)?;
    let session = state::require_session(&client)?;
    let user_id = args.user_id.unwrap_or_else(|| session.user_id());

    let sessions = if args.admin {
        client.list_sessions_admin(user_id).await
    } else {
        client.list_sessions(user_id).await
    }
    .context("Failed to list sessions")?;

    if sessions.is_empty() {
        eprintln!("{}", "No sessions found.".dimmed());
        return Ok(());
    }

    for entry in &sessions {
        if args.pretty {
            output::json_pretty(entry)?;
        } else {
            output::json(entry)?;
        }
    }

    Ok(())
}

//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::state;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(api: &str, _args: RefreshArgs) -> Result<()> {
    let client = state::open_client(api)?;
    state::require_session(&client)?;

    eprintln!("{}", "Refreshing session...".dimmed());

    let token = client
        .refresh()
        .await
        .context("Failed to refresh session")?;
    let claims = token.claims().context("Refreshed token is unreadable")?;

    output::success("Session refreshed successfully");
    output::field("User ID", &claims.user_id.to_string());

    Ok(())
}

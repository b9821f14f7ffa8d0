//! Logout command implementation.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::output;
use crate::state;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(api: &str, _args: LogoutArgs) -> Result<()> {
    let client = state::open_client(api)?;

    if !client.store().is_authenticated()? {
        eprintln!("{}", "No active session.".dimmed());
        return Ok(());
    }

    client.logout().await;
    output::success("Logged out");

    Ok(())
}

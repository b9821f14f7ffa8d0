//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use sesh_core::Credentials;

use crate::output;
use crate::state;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Login (usually an email address)
    #[arg(long)]
    pub login: String,

    /// Account password
    #[arg(long, env = "SESH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(api: &str, args: LoginArgs) -> Result<()> {
    let client = state::open_client(api)?;
    let credentials = Credentials::new(args.login, args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let session = client
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::session(&session);

    Ok(())
}

//! Whoami command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;
use crate::state;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the stored user descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(api: &str, args: WhoamiArgs) -> Result<()> {
    let client = state::open_client(api)?;
    let session = state::require_session(&client)?;

    if args.json {
        output::json_pretty(&session.user)?;
    } else {
        output::session(&session);
    }

    Ok(())
}

//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use palaver::Session;

use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(session: &Session, _args: WhoamiArgs) -> Result<()> {
    let user = session
        .restore()
        .await
        .context("Failed to load session")?
        .context("No active session. Run 'palaver login' first.")?;

    output::field("Username", &user.username);
    output::field("Email", &user.email);
    if user.name_set {
        output::field("Name", &user.name);
    }

    Ok(())
}

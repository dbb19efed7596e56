//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use palaver::Session;

use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(session: &Session, _args: LogoutArgs) -> Result<()> {
    session.logout().await.context("Failed to logout")?;
    output::success("Logged out");
    Ok(())
}

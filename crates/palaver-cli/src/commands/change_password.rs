//! Change password command implementation.

use anyhow::{Context, Result};
use clap::Args;

use palaver::Session;

use crate::output;

#[derive(Args, Debug)]
pub struct ChangePasswordArgs {
    /// Current password
    #[arg(long)]
    pub old: String,

    /// New password
    #[arg(long)]
    pub new: String,

    /// New password again (defaults to --new)
    #[arg(long)]
    pub confirm: Option<String>,
}

pub async fn run(session: &Session, args: ChangePasswordArgs) -> Result<()> {
    let confirm = args.confirm.as_deref().unwrap_or(&args.new);

    session
        .change_password(&args.old, &args.new, confirm)
        .await
        .context("Failed to change password")?;

    output::success("Password updated successfully");
    Ok(())
}

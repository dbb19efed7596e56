//! Profile command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;

use palaver::{ProfileUpdate, Session};

use crate::output;

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// New username
    #[arg(long)]
    pub username: Option<String>,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn run(session: &Session, args: ProfileArgs) -> Result<()> {
    let update = ProfileUpdate {
        username: args.username,
        name: args.name,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass --username and/or --name.");
    }

    let user = session
        .update_profile(&update)
        .await
        .context("Failed to update profile")?;

    output::success("Profile updated");
    output::field("Username", &user.username);
    output::field("Name", &user.name);

    Ok(())
}

//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;

use palaver::Session;

use crate::output;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username (letters, numbers and underscores)
    #[arg(long)]
    pub username: String,

    /// Email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(session: &Session, args: RegisterArgs) -> Result<()> {
    let user = session
        .register(&args.username, &args.email, &args.password)
        .await
        .context("Failed to create account")?;

    output::field("Username", &user.username);
    output::field("Email", &user.email);
    output::success("Account created! Run 'palaver login' to sign in.");

    Ok(())
}

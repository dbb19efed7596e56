//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use palaver::{LoginCredentials, Session};

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username or email address
    #[arg(long)]
    pub identifier: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(session: &Session, args: LoginArgs) -> Result<()> {
    let credentials = LoginCredentials::new(&args.identifier, &args.password);

    eprintln!("{}", "Logging in...".dimmed());

    let user = session
        .login(credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("Username", &user.username);
    output::field("Email", &user.email);

    Ok(())
}

//! Subcommand implementations.

pub mod change_password;
pub mod login;
pub mod logout;
pub mod profile;
pub mod register;
pub mod request;
pub mod whoami;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::session;

pub async fn handle(cli: Cli) -> Result<()> {
    let session = session::connect(&cli.server)?;

    match cli.command {
        Commands::Login(args) => login::run(&session, args).await,
        Commands::Register(args) => register::run(&session, args).await,
        Commands::Logout(args) => logout::run(&session, args).await,
        Commands::Whoami(args) => whoami::run(&session, args).await,
        Commands::Profile(args) => profile::run(&session, args).await,
        Commands::ChangePassword(args) => change_password::run(&session, args).await,
        Commands::Request(args) => request::run(&session, args).await,
    }
}

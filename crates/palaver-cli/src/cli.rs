//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{change_password, login, logout, profile, register, request, whoami};

/// Default backend for local development.
pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Command-line client for the palaver chat backend.
#[derive(Parser, Debug)]
#[command(name = "palaver")]
#[command(author, version = env!("PALAVER_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "PALAVER_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login(login::LoginArgs),

    /// Create an account
    Register(register::RegisterArgs),

    /// Sign out and forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Update the signed-in user's profile
    Profile(profile::ProfileArgs),

    /// Change the signed-in user's password
    ChangePassword(change_password::ChangePasswordArgs),

    /// Send an authenticated request to any endpoint
    Request(request::RequestArgs),
}

use std::path::Path;
use std::process::{Command, Output};

/// Run the CLI with an isolated HOME so the credentials file stays in `home`.
pub fn run_cli_with_env(args: &[&str], home: &Path, server: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_palaver"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env("PALAVER_SERVER", server);
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI with a custom HOME and expect success.
pub fn run_cli_with_env_success(args: &[&str], home: &Path, server: &str) -> String {
    let output = run_cli_with_env(args, home, server);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Path of the credentials file for an isolated HOME.
pub fn credentials_path(home: &Path) -> std::path::PathBuf {
    home.join("data").join("palaver").join("credentials.json")
}

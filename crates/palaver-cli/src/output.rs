//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty(value: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Report a failed command, expanding backend validation errors per field.
pub fn report(err: &anyhow::Error) {
    let Some(api) = err.downcast_ref::<palaver::Error>() else {
        error(&format!("{:#}", err));
        return;
    };

    match api.field_errors() {
        Some(fields) => {
            error(&err.to_string());
            for (name, messages) in fields {
                eprintln!("  {}: {}", name.yellow(), messages.join(", "));
            }
        }
        None => error(&format!("{}: {}", err, api.user_message())),
    }
}

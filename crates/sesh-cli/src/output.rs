//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use sesh_core::SessionState;

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print who a session belongs to.
pub fn session(state: &SessionState) {
    field("User ID", &state.user_id().to_string());
    field("Role", state.role());
    if let Some(email) = &state.user.email {
        field("Email", email);
    }
    if let Some(name) = &state.user.user_name {
        field("Name", name);
    }
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a value as pretty-printed JSON.
pub fn json_pretty<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a response body: JSON pretty-printed, anything else verbatim.
pub fn body(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => json_pretty(&value),
        Err(_) => {
            println!("{}", String::from_utf8_lossy(bytes));
            Ok(())
        }
    }
}

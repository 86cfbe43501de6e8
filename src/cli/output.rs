//! Shared CLI output helpers.
//!
//! Data goes to stdout as JSON so it can be piped; status lines go to
//! stderr. Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: hints
//! - Dimmed: secondary info

use console::style;
use serde::Serialize;

use crate::error::Result;

/// Check if color output is disabled via NO_COLOR env var.
fn colors_enabled() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a success message with checkmark (green).
///
/// Example: `✓ project payments01 deleted`
pub fn success(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✓").green(), msg);
    } else {
        eprintln!("✓ {}", msg);
    }
}

/// Print an error message (red).
pub fn error(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("✗").red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a warning message (yellow).
pub fn warn(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("⚠").yellow(), msg);
    } else {
        eprintln!("⚠ {}", msg);
    }
}

/// Print a hint message (cyan).
///
/// Example: `→ create bullpen.toml or pass --config <path>`
pub fn hint(msg: &str) {
    if colors_enabled() {
        eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    if colors_enabled() {
        eprintln!("{}", style(msg).dim());
    } else {
        eprintln!("{}", msg);
    }
}

/// Print `value` to stdout as pretty JSON.
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

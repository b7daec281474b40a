//! Utility helpers for representing cache ages in human-readable form.

use std::time::Duration;

/// Format an age into the largest whole unit (seconds, minutes, or hours).
pub fn humanize_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        return format!("{secs}s");
    }
    let minutes = secs / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h", minutes / 60)
}

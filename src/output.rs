//! User-facing output formatting.
//!
//! Colored service names and human-readable sizes and durations for the
//! inline per-service status lines.

/// Wraps `text` in the ANSI color named by the service's config entry.
/// Unknown or absent colors leave the text unchanged.
pub fn paint(text: &str, color: Option<&str>) -> String {
    let code = match color.unwrap_or("").to_lowercase().as_str() {
        "black" => "30",
        "red" => "31",
        "green" => "32",
        "yellow" => "33",
        "blue" => "34",
        "magenta" => "35",
        "cyan" => "36",
        "gray" | "grey" => "90",
        _ => "0",
    };
    if code == "0" {
        text.to_string()
    } else {
        format!("\u{1b}[{}m{}\u{1b}[0m", code, text)
    }
}

/// Resident memory as a short human-readable figure.
pub fn format_memory(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{} KB", bytes / KB)
    }
}

/// A run time in seconds as `2h03m`, `4m13s`, or `42s`.
pub fn format_duration(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

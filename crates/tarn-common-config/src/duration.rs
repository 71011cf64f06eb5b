//! Human-friendly durations (`30s`, `5m`, `1h`).

use std::time::Duration;

/// Parse a duration with unit suffix (e.g., "30s", "5m", "1h").
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num, unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = s.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = s.strip_suffix('m') {
        (num, "m")
    } else if let Some(num) = s.strip_suffix('h') {
        (num, "h")
    } else {
        (s, "s")
    };

    let value: u64 = num
        .trim()
        .parse()
        .map_err(|_| format!("Invalid duration: {s}"))?;

    let millis = match unit {
        "ms" => Some(value),
        "s" => value.checked_mul(1000),
        "m" => value.checked_mul(60 * 1000),
        "h" => value.checked_mul(60 * 60 * 1000),
        _ => return Err(format!("Unknown unit: {unit}")),
    };

    millis
        .map(Duration::from_millis)
        .ok_or_else(|| format!("Duration out of range: {s}"))
}

/// Inverse of [`parse_duration`] using the largest exact unit.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }
    let secs = d.as_secs();
    if secs != 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs != 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

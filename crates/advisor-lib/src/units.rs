//! Human readable byte sizes

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

const BINARY_UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Format a byte count with binary units and four significant digits,
/// e.g. `4GiB`, `1.5TiB` or `140GiB`.
pub fn bytes_size(bytes: f64) -> String {
    let mut size = bytes;
    let mut unit = 0;
    while size >= 1024.0 && unit < BINARY_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{}{}", significant(size, 4), BINARY_UNITS[unit])
}

fn significant(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }

    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    let formatted = format!("{value:.decimals$}");

    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

fn human_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)*) ?([kKmMgGtTpP])?[iI]?[bB]?$").expect("valid size pattern")
    })
}

/// Parse a human size such as `10g`, `1.5TB` or `512 mb` into bytes.
///
/// Units are decimal (`k` = 1000).
pub fn from_human_size(value: &str) -> Result<u64> {
    let malformed = || Error::MalformedSize {
        value: value.to_string(),
    };

    let captures = human_size_pattern().captures(value.trim()).ok_or_else(malformed)?;
    let number: f64 = captures[1].parse().map_err(|_| malformed())?;

    let multiplier: f64 = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => 1.0,
        Some(unit) => match unit.as_str() {
            "k" => 1e3,
            "m" => 1e6,
            "g" => 1e9,
            "t" => 1e12,
            "p" => 1e15,
            _ => return Err(malformed()),
        },
    };

    Ok((number * multiplier) as u64)
}

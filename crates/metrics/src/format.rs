//! Display formatting for metric values and titles.

/// Format a value for its card, choosing units from the metric name.
pub fn format_value(value: f64, metric_name: &str) -> String {
    if is_likely_bytes(metric_name) {
        return format_bytes(value);
    }
    let decimals = if value.fract() == 0.0 { 0 } else { 3 };
    format_number(value, decimals)
}

/// Names ending in a storage-ish suffix get byte units.
pub fn is_likely_bytes(metric_name: &str) -> bool {
    ["_bytes", "_size", "_capacity", "_memory"].iter().any(|s| metric_name.contains(s))
}

const BYTE_UNITS: [&str; 6] = ["Bytes", "KB", "MB", "GB", "TB", "PB"];

/// Scale by powers of 1024; whole bytes get no decimals, larger units two.
pub fn format_bytes(bytes: f64) -> String {
    if bytes == 0.0 {
        return "0 Bytes".to_string();
    }
    let exp = (bytes.ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(BYTE_UNITS.len() - 1);
    let value = bytes / 1024f64.powi(exp as i32);
    if exp == 0 {
        format!("{value} {}", BYTE_UNITS[0])
    } else {
        format!("{value:.2} {}", BYTE_UNITS[exp])
    }
}

/// Plain numbers, with scientific notation once they leave the readable
/// range and thousands separators otherwise.
pub fn format_number(num: f64, decimals: usize) -> String {
    let magnitude = num.abs();
    if magnitude >= 1_000_000.0 || (magnitude < 0.001 && num != 0.0) {
        return format!("{num:.2e}");
    }
    if decimals > 0 {
        let s = format!("{num:.decimals$}");
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        group_thousands(trimmed)
    } else {
        group_thousands(&format!("{num:.0}"))
    }
}

fn group_thousands(s: &str) -> String {
    let (sign, rest) = s.strip_prefix('-').map_or(("", s), |r| ("-", r));
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Turn a metric name into a chart title: underscores to spaces, camelCase
/// split, each word capitalized.
pub fn format_title(name: &str) -> String {
    let spaced: String = name.replace('_', " ");
    let mut split = String::with_capacity(spaced.len());
    let mut prev_lower = false;
    for c in spaced.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            split.push(' ');
        }
        prev_lower = c.is_ascii_lowercase();
        split.push(c);
    }
    let mut out = String::with_capacity(split.len());
    let mut at_word_start = true;
    for c in split.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

//! Date helper functions

use chrono::{DateTime, TimeZone, Utc};

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    // Convert Moment.js format to chrono format
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a stored UTC timestamp in the site's display timezone
pub fn format_local(date: &DateTime<Utc>, tz: chrono_tz::Tz, format: &str) -> String {
    format_date(&date.with_timezone(&tz), format)
}

/// Generate a <time> HTML element
pub fn time_tag(date: &DateTime<Utc>, tz: chrono_tz::Tz, format: &str) -> String {
    let local = date.with_timezone(&tz);
    let datetime = local.format("%Y-%m-%dT%H:%M:%S%:z").to_string();
    format!(
        r#"<time datetime="{}">{}</time>"#,
        datetime,
        format_date(&local, format)
    )
}

/// Moment.js tokens and their chrono equivalents, longest first so that a
/// shorter token never matches the prefix of a longer one
const MOMENT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"), // 2022
    ("YY", "%y"),   // 22
    ("MMMM", "%B"), // March
    ("MMM", "%b"),  // Mar
    ("MM", "%m"),   // 03
    ("DDDD", "%j"), // day of year
    ("DD", "%d"),   // 04
    ("dddd", "%A"), // Friday
    ("ddd", "%a"),  // Fri
    ("HH", "%H"),   // 24h
    ("hh", "%I"),   // 12h
    ("mm", "%M"),
    ("ss", "%S"),
    ("SSS", "%3f"), // milliseconds
    ("ZZ", "%z"),   // +0100
    ("A", "%p"),    // AM/PM
];

/// Convert Moment.js format to chrono format
///
/// Scans left to right, so converted output is never rescanned. Anything
/// that is not a token is copied through, with `%` escaped.
fn moment_to_chrono_format(format: &str) -> String {
    let mut result = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'scan: while let Some(c) = rest.chars().next() {
        for (from, to) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(from) {
                result.push_str(to);
                rest = tail;
                continue 'scan;
            }
        }
        if c == '%' {
            result.push_str("%%");
        } else {
            result.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    result
}

use chrono::{NaiveDate, NaiveDateTime};

/// Canonical rendering of a parsed publish date.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Day-first layouts seen in exports, most specific first.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Parse a publish date, day first. Returns None for anything unparsable.
pub fn parse_publish_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() {
        return None;
    }
    // drop fractional seconds and a trailing UTC marker
    let s = s.trim_end_matches('Z');
    let s = match s.find('.') {
        Some(dot) if dot > 10 => &s[..dot],
        _ => s,
    };

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Normalize a publish date cell; unparsable values become "".
pub fn normalize_publish_date(s: &str) -> String {
    parse_publish_date(s)
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_comes_first() {
        assert_eq!(
            normalize_publish_date("03/04/2024 18:02"),
            "2024-04-03 18:02:00"
        );
        assert_eq!(
            normalize_publish_date("14/12/2024 18:02:37"),
            "2024-12-14 18:02:37"
        );
        assert_eq!(normalize_publish_date("14.12.2024"), "2024-12-14 00:00:00");
    }

    #[test]
    fn iso_inputs_still_parse() {
        assert_eq!(
            normalize_publish_date("2024-12-14T18:02:37.123Z"),
            "2024-12-14 18:02:37"
        );
        assert_eq!(normalize_publish_date("2024-12-14"), "2024-12-14 00:00:00");
    }

    #[test]
    fn garbage_is_coerced_to_empty() {
        assert_eq!(normalize_publish_date(""), "");
        assert_eq!(normalize_publish_date("yesterday"), "");
        assert_eq!(normalize_publish_date("31/02/2024"), "");
    }
}

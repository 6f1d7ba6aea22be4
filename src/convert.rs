use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;

/// Layout of partition keys and summary file names.
pub const DATE_KEY_FORMAT: &str = "%m-%d-%Y";

lazy_static! {
    /// Leading decimal number, optionally signed, optionally with exponent.
    static ref NUMBER_PREFIX: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
            .expect("Invalid regex pattern");
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Lenient number parsing for export cells: thousands separators are
/// stripped, a trailing non-numeric tail is ignored, and anything without a
/// leading number is 0. Never fails.
pub fn parse_number(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let cleaned = value.replace(',', "");
    NUMBER_PREFIX
        .find(cleaned.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Renders a number the way it is written to partitions and hashed:
/// shortest decimal form, integers without a fraction.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // folds -0 into 0
        return "0".to_string();
    }
    value.to_string()
}

/// Parses an export timestamp. Zoned forms (RFC 3339, RFC 2822) keep their
/// offset; naive forms are read as wall-clock time in `tz`, taking the
/// earlier instant when a DST fold makes them ambiguous.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return from_wall_clock(&naive, tz);
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return from_wall_clock(&naive, tz);
        }
    }

    None
}

fn from_wall_clock(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(naive).earliest().map(|ts| ts.fixed_offset())
}

/// `MM-DD-YYYY` of the trader's local calendar day containing `ts`.
pub fn date_key(ts: &DateTime<FixedOffset>, tz: Tz) -> String {
    ts.with_timezone(&tz).format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chicago() -> Tz {
        chrono_tz::America::Chicago
    }

    #[test]
    fn parse_number_is_lenient() {
        assert_eq!(parse_number(Some("1,234.5")), 1234.5);
        assert_eq!(parse_number(Some("")), 0.0);
        assert_eq!(parse_number(None), 0.0);
        assert_eq!(parse_number(Some("abc")), 0.0);
        assert_eq!(parse_number(Some("-2,000")), -2000.0);
        assert_eq!(parse_number(Some("  42gp")), 42.0);
        assert_eq!(parse_number(Some(".5")), 0.5);
        assert_eq!(parse_number(Some("1e3")), 1000.0);
    }

    #[test]
    fn format_number_uses_shortest_form() {
        assert_eq!(format_number(80.0), "80");
        assert_eq!(format_number(-20.0), "-20");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1_500_000_000.0), "1500000000");
    }

    #[test]
    fn zoned_timestamps_keep_their_instant() {
        let ts = parse_timestamp("2025-07-28T04:59:59Z", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "07-27-2025");

        let ts = parse_timestamp("2025-07-28T05:00:00Z", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "07-28-2025");
    }

    #[test]
    fn naive_timestamps_are_local() {
        let ts = parse_timestamp("2025-08-01 23:30:00", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "08-01-2025");
        assert_eq!(ts.to_rfc3339(), "2025-08-01T23:30:00-05:00");

        let ts = parse_timestamp("08/02/2025 1:05:00 PM", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "08-02-2025");

        let ts = parse_timestamp("2025-08-03", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "08-03-2025");
    }

    #[test]
    fn winter_days_follow_standard_time() {
        // 23:30 CST, still the previous day
        let ts = parse_timestamp("2025-12-01T05:30:00Z", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "11-30-2025");

        let ts = parse_timestamp("2025-12-01T06:00:00Z", chicago()).unwrap();
        assert_eq!(date_key(&ts, chicago()), "12-01-2025");

        let ts = parse_timestamp("2025-12-01 23:30:00", chicago()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-12-01T23:30:00-06:00");
    }

    #[test]
    fn ambiguous_wall_clock_takes_the_earlier_instant() {
        // 01:30 happens twice when CDT falls back on 2025-11-02
        let ts = parse_timestamp("2025-11-02 01:30:00", chicago()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-11-02T01:30:00-05:00");

        // 02:30 never happens when CST springs forward on 2025-03-09
        assert!(parse_timestamp("2025-03-09 02:30:00", chicago()).is_none());
    }

    #[test]
    fn garbage_timestamps_do_not_parse() {
        assert!(parse_timestamp("", chicago()).is_none());
        assert!(parse_timestamp("yesterday", chicago()).is_none());
    }

    #[test]
    fn date_keys_parse_as_calendar_dates() {
        let date = parse_date_key("07-27-2025").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 27).unwrap());
        assert!(parse_date_key("2025-07-27").is_none());
    }
}

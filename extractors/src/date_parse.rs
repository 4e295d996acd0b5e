//! Shared date-attempt ladder (§4.8), used by bank parsers, the pattern engine,
//! and the file parser so that a date string found anywhere in the pipeline is
//! interpreted the same way.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d-%m-%y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%Y-%m-%d",
    "%d%b%y",
    "%d%b%Y",
    "%d-%B-%Y",
];

/// Try each format in the ladder after normalizing separators. Falls back to
/// `date_hint`, then to `now`, when nothing matches.
pub fn parse_date(raw: &str, date_hint: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    try_parse_date(raw).unwrap_or_else(|| date_hint.unwrap_or(now))
}

/// Returns `None` if no format in the ladder matches.
pub fn try_parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.trim().replace('/', "-").replace('.', "-");

    for fmt in FORMATS {
        if let Some(dt) = try_format(&normalized, fmt) {
            return Some(dt);
        }
    }
    None
}

fn try_format(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDate::parse_from_str(s, fmt) {
        let naive = naive.and_hms_opt(0, 0, 0)?;
        return Some(fix_two_digit_year(naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
        return Some(fix_two_digit_year(naive));
    }
    None
}

/// chrono's `%y` already resolves to a plausible 2000s/1900s year via its
/// pivot; the spec wants a flat `< 100 -> 2000 + yy` rule, so re-derive the
/// year when it landed before 2000.
fn fix_two_digit_year(naive: NaiveDateTime) -> DateTime<Utc> {
    use chrono::Datelike;
    let year = naive.year();
    let corrected = if year < 100 {
        naive
            .with_year(2000 + year)
            .unwrap_or(naive)
    } else {
        naive
    };
    Utc.from_utc_datetime(&corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn parses_slash_date() {
        let dt = try_parse_date("09/01/26").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 9);
    }

    #[test]
    fn parses_month_abbreviation() {
        let dt = try_parse_date("23-Sep-24").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 9);
        assert_eq!(dt.day(), 23);
    }

    #[test]
    fn parses_iso() {
        let dt = try_parse_date("2024-09-23").unwrap();
        assert_eq!(dt.year(), 2024);
    }

    #[test]
    fn falls_back_to_hint_on_garbage() {
        let hint = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("not a date", Some(hint), now), hint);
        assert_eq!(parse_date("not a date", None, now), now);
    }
}

//! Period and opening-hour parsing for the formats the gallery sites print.
//!
//! Periods show up as `2025.11.26 - 2025.12.15`, `2025. 11. 26 ~ 2025. 12. 15`,
//! `2025-12-03 ~ 2025-12-08`, `2025년 12월 3일 ~ 12월 8일` or with the end
//! shortened to `12.8` / `8`. Missing year and month on the end side are
//! taken from the start date.

use chrono::{Datelike, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[-~–]\s*").unwrap());
static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());
static KOREAN_FULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일?").unwrap());
static KOREAN_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s*월\s*(\d{1,2})\s*일?").unwrap());
static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());
static DOT_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\.\s*").unwrap());
static REPEATED_DOTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static YMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2})$").unwrap());
static MD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})$").unwrap());
static D: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})$").unwrap());
static CLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}").unwrap());

/// Parse an exhibition period into (start, end).
pub fn parse_period(text: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let Some(first_digit) = text.find(|c: char| c.is_ascii_digit()) else {
        return (None, None);
    };
    let text = PARENTHESIZED.replace_all(&text[first_digit..], "");
    let text = normalize(&text);

    let mut parts = SEPARATOR.splitn(&text, 2);
    let start_part = parts.next().unwrap_or_default();
    let end_part = parts.next();

    let Some(start) = parse_single_date(start_part, None) else {
        return (None, None);
    };
    let end = end_part.and_then(|p| parse_single_date(p, Some(start)));
    (Some(start), end)
}

/// Parse one date. Month-day and day-only forms need `base` for the
/// missing components.
pub fn parse_single_date(part: &str, base: Option<NaiveDate>) -> Option<NaiveDate> {
    let s = normalize(part);
    let s = s.trim_matches(|c: char| c == '.' || c.is_whitespace());

    if let Some(caps) = YMD.captures(s) {
        return NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
    }

    let base = base?;
    if let Some(caps) = MD.captures(s) {
        return NaiveDate::from_ymd_opt(base.year(), caps[1].parse().ok()?, caps[2].parse().ok()?);
    }
    if let Some(caps) = D.captures(s) {
        return NaiveDate::from_ymd_opt(base.year(), base.month(), caps[1].parse().ok()?);
    }
    None
}

/// Parse opening hours such as `AM 10:00 ~ PM 19:00(화요일 정기 휴무)`.
/// The sites print 24h clock values even next to AM/PM markers.
pub fn parse_hours(text: &str) -> (Option<NaiveTime>, Option<NaiveTime>) {
    let base = text.split('(').next().unwrap_or_default();
    let mut times = CLOCK
        .find_iter(base)
        .map(|m| NaiveTime::parse_from_str(m.as_str(), "%H:%M").ok());
    let open = times.next().flatten();
    let close = times.next().flatten();
    (open, close)
}

fn normalize(text: &str) -> String {
    let s = KOREAN_FULL.replace_all(text.trim(), "$1.$2.$3");
    let s = KOREAN_MONTH_DAY.replace_all(&s, "$1.$2");
    let s = ISO_DATE.replace_all(&s, "$1.$2.$3");
    let s = s.replace('/', ".");
    let s = DOT_SPACING.replace_all(&s, ".");
    REPEATED_DOTS.replace_all(&s, ".").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn parses_full_dotted_range() {
        assert_eq!(
            parse_period("2025. 11. 26 - 2025. 12. 15"),
            (ymd(2025, 11, 26), ymd(2025, 12, 15))
        );
        assert_eq!(
            parse_period("2025.11.12. ~ 2025.12.21."),
            (ymd(2025, 11, 12), ymd(2025, 12, 21))
        );
    }

    #[test]
    fn inherits_year_and_month_for_short_end() {
        assert_eq!(parse_period("2025.12.3-12.8"), (ymd(2025, 12, 3), ymd(2025, 12, 8)));
        assert_eq!(parse_period("2025.12.3 ~ 8"), (ymd(2025, 12, 3), ymd(2025, 12, 8)));
    }

    #[test]
    fn parses_iso_and_korean_forms() {
        assert_eq!(
            parse_period("2025-01-05 ~ 2025-02-03"),
            (ymd(2025, 1, 5), ymd(2025, 2, 3))
        );
        assert_eq!(
            parse_period("2025년 12월 3일 ~ 12월 8일"),
            (ymd(2025, 12, 3), ymd(2025, 12, 8))
        );
    }

    #[test]
    fn drops_label_and_parenthesized_note() {
        assert_eq!(
            parse_period("전시 기간: 2025. 11. 26 - 2025. 12. 15 (월요일 휴관)"),
            (ymd(2025, 11, 26), ymd(2025, 12, 15))
        );
    }

    #[test]
    fn single_date_has_no_end() {
        assert_eq!(parse_period("2025.03.01"), (ymd(2025, 3, 1), None));
    }

    #[test]
    fn invalid_or_empty_input_yields_none() {
        assert_eq!(parse_period(""), (None, None));
        assert_eq!(parse_period("상시 전시"), (None, None));
        assert_eq!(parse_period("2025.02.30 - 2025.03.02"), (None, None));
        assert_eq!(parse_period("2025.02.01 - 2.30"), (ymd(2025, 2, 1), None));
    }

    #[test]
    fn short_forms_need_a_base() {
        assert_eq!(parse_single_date("12.8", None), None);
        assert_eq!(parse_single_date("12.8", ymd(2024, 1, 1)), ymd(2024, 12, 8));
    }

    #[test]
    fn parses_opening_hours() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0);
        assert_eq!(
            parse_hours("AM 10:00 ~ PM 19:00(화요일 정기 휴무)"),
            (t(10, 0), t(19, 0))
        );
        assert_eq!(parse_hours("10:30-18:30"), (t(10, 30), t(18, 30)));
        assert_eq!(parse_hours("11:00"), (t(11, 0), None));
        assert_eq!(parse_hours("연중무휴"), (None, None));
    }
}

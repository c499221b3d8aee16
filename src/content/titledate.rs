//! Heuristic extraction of a sortable date from free-text titles.
//!
//! Bulletin and sermon titles are human-entered and usually carry the date
//! in the title itself ("2025.11.23 주일설교", "260105_주일주보"). The
//! functions here turn that convention into ordering keys. They are used
//! for display ordering only, never as canonical record dates.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Year assumed for legacy 4-digit (MMDD) bulletin title prefixes.
/// Titles uploaded before the naming convention added a year all belong
/// to this year; prefixes from any other year must carry YYMMDD.
const ASSUMED_BULLETIN_YEAR: u64 = 2025;

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\.(\d{2})\.(\d{2})").expect("valid date pattern"))
}

/// Extract the first `YYYY.MM.DD` occurrence from a title as a calendar
/// date. Returns None when no pattern matches or the digits do not form a
/// real date.
pub fn date_from_title(title: &str) -> Option<NaiveDate> {
    let caps = date_pattern().captures(title)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Sort key for sermon titles: the extracted date, or the epoch when no
/// pattern matches so that undated items sort last in newest-first order.
pub fn sermon_sort_key(title: &str) -> NaiveDate {
    date_from_title(title).unwrap_or_default()
}

/// Normalized `YYYY-MM-DD` string for display next to a sermon title
pub fn display_date(title: &str) -> Option<String> {
    date_from_title(title).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Sort key for bulletin titles, derived from the leading digit run:
/// - 4 digits: `MMDD` of the assumed year
/// - 6 digits: `YYMMDD`, prefixed with `20`
/// - anything else: the run read literally as an integer
/// - no leading digits: 0, so unmatched titles sort last newest-first
pub fn bulletin_sort_key(title: &str) -> u64 {
    let digits: String = title.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }

    match digits.len() {
        4 => digits
            .parse::<u64>()
            .map(|mmdd| ASSUMED_BULLETIN_YEAR * 10_000 + mmdd)
            .unwrap_or(0),
        6 => format!("20{digits}").parse().unwrap_or(0),
        _ => digits.parse().unwrap_or(u64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_date_extraction() {
        assert_eq!(
            date_from_title("2025.11.23 주일설교"),
            NaiveDate::from_ymd_opt(2025, 11, 23)
        );
        assert_eq!(display_date("2025.11.23 주일설교").as_deref(), Some("2025-11-23"));
    }

    #[test]
    fn test_dotted_date_anywhere_in_title() {
        assert_eq!(
            date_from_title("말씀 2024.03.10 새벽예배"),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
    }

    #[test]
    fn test_first_dotted_date_wins() {
        assert_eq!(
            date_from_title("2024.01.07 및 2025.02.03 합본"),
            NaiveDate::from_ymd_opt(2024, 1, 7)
        );
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert_eq!(date_from_title("2025.13.40 제목"), None);
    }

    #[test]
    fn test_unmatched_title_falls_back_to_epoch() {
        assert_eq!(sermon_sort_key("행사 안내"), NaiveDate::default());
        assert_eq!(sermon_sort_key(""), NaiveDate::default());
        assert_eq!(display_date("행사 안내"), None);
    }

    #[test]
    fn test_four_digit_prefix_uses_assumed_year() {
        assert_eq!(bulletin_sort_key("1123_주일주보"), 20251123);
    }

    #[test]
    fn test_six_digit_prefix_expands_century() {
        assert_eq!(bulletin_sort_key("260105_주일주보"), 20260105);
    }

    #[test]
    fn test_other_length_prefix_is_literal() {
        assert_eq!(bulletin_sort_key("20251231 송구영신"), 20251231);
        assert_eq!(bulletin_sort_key("7월 행사"), 7);
    }

    #[test]
    fn test_no_prefix_is_zero() {
        assert_eq!(bulletin_sort_key("행사 안내"), 0);
        assert_eq!(bulletin_sort_key(""), 0);
        assert_eq!(bulletin_sort_key("주보_1123"), 0, "only a leading run counts");
    }

    #[test]
    fn test_mixed_list_sorts_undated_last() {
        let mut titles = vec!["행사 안내", "1123_주일주보", "260105_주일주보"];
        titles.sort_by(|a, b| bulletin_sort_key(b).cmp(&bulletin_sort_key(a)));
        assert_eq!(titles, vec!["260105_주일주보", "1123_주일주보", "행사 안내"]);

        let mut sermons = vec!["행사 안내", "2025.11.23 주일설교", "2024.03.10 새벽예배"];
        sermons.sort_by(|a, b| sermon_sort_key(b).cmp(&sermon_sort_key(a)));
        assert_eq!(
            sermons,
            vec!["2025.11.23 주일설교", "2024.03.10 새벽예배", "행사 안내"]
        );
    }
}

//! Japanese era date conversion.
//!
//! Bulletin links carry dates such as `令和4年1月5日`. This module turns them
//! into Gregorian `NaiveDate`s.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Era names and the Gregorian year of their first year.
pub const ERAS: [(&str, i32); 5] = [
    ("明治", 1868),
    ("大正", 1912),
    ("昭和", 1926),
    ("平成", 1989),
    ("令和", 2019),
];

/// Literal that stands for the first year of an era.
const FIRST_YEAR: &str = "元";

static ERA_DATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let eras = ERAS.map(|(name, _)| name).join("|");
    Regex::new(&format!(
        r"(?P<era>{eras})(?P<year>[0-9]{{1,2}}|{FIRST_YEAR})年(?P<month>[0-9]{{1,2}})月(?P<day>[0-9]{{1,2}})日"
    ))
    .ok()
});

fn era_start(name: &str) -> Option<i32> {
    ERAS.iter()
        .find(|(era, _)| *era == name)
        .map(|(_, start)| *start)
}

/// Convert the first era date found in `text` to a Gregorian date.
///
/// The text is NFKC-normalized first so full-width digits match. Returns
/// `None` and logs a warning when no era date is present.
pub fn to_gregorian(text: &str) -> Option<NaiveDate> {
    let normalized: String = text.nfkc().collect();

    let Some(caps) = ERA_DATE.as_ref()?.captures(&normalized) else {
        log::warn!("Cannot convert to western year: {}", text);
        return None;
    };

    let start = era_start(&caps["era"])?;
    let year = match &caps["year"] {
        FIRST_YEAR => start,
        relative => start + relative.parse::<i32>().ok()? - 1,
    };
    let month = caps["month"].parse().ok()?;
    let day = caps["day"].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day);
    if date.is_none() {
        log::warn!("Invalid calendar date {}-{}-{} in: {}", year, month, day, text);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reiwa_plain_year() {
        assert_eq!(to_gregorian("令和3年4月1日"), Some(ymd(2021, 4, 1)));
    }

    #[test]
    fn test_first_year_literal() {
        assert_eq!(to_gregorian("令和元年5月1日"), Some(ymd(2019, 5, 1)));
        assert_eq!(to_gregorian("平成元年1月8日"), Some(ymd(1989, 1, 8)));
    }

    #[test]
    fn test_every_era_start() {
        for (era, start) in ERAS {
            let text = format!("{era}1年1月1日");
            assert_eq!(to_gregorian(&text), Some(ymd(start, 1, 1)), "{era}");
        }
    }

    #[test]
    fn test_full_width_digits() {
        assert_eq!(to_gregorian("令和４年１２月３日"), Some(ymd(2022, 12, 3)));
    }

    #[test]
    fn test_date_inside_link_text() {
        assert_eq!(
            to_gregorian("新型コロナウイルス感染症 市町村別発生状況（令和4年1月5日発表）"),
            Some(ymd(2022, 1, 5))
        );
    }

    #[test]
    fn test_unknown_era_does_not_match() {
        assert_eq!(to_gregorian("慶応3年1月1日"), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(to_gregorian("お知らせ"), None);
        assert_eq!(to_gregorian(""), None);
    }

    #[test]
    fn test_impossible_date() {
        assert_eq!(to_gregorian("令和3年2月30日"), None);
    }
}

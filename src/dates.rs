use chrono::NaiveDate;

/// Accepted input date layouts, in the order they are tried.
///
/// The order resolves ambiguous values: `01/02/2020` matches
/// [`DateFormat::MonthDayYearSlash`] before [`DateFormat::DayMonthYearSlash`]
/// gets a chance, so it reads as January 2nd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    DayMonthYearDash,
    DayMonthYearDot,
    MonthDayYearSlash,
    YearMonthDayDash,
    DayMonthYearSlash,
    MonthDayYearDash,
    MonthDayYearDot,
    YearMonthDayDot,
    YearMonthDaySlash,
}

pub const DATE_FORMATS: [DateFormat; 9] = [
    DateFormat::DayMonthYearDash,
    DateFormat::DayMonthYearDot,
    DateFormat::MonthDayYearSlash,
    DateFormat::YearMonthDayDash,
    DateFormat::DayMonthYearSlash,
    DateFormat::MonthDayYearDash,
    DateFormat::MonthDayYearDot,
    DateFormat::YearMonthDayDot,
    DateFormat::YearMonthDaySlash,
];

/// Layout used when writing dates back out.
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

impl DateFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            DateFormat::DayMonthYearDash => "%d-%m-%Y",
            DateFormat::DayMonthYearDot => "%d.%m.%Y",
            DateFormat::MonthDayYearSlash => "%m/%d/%Y",
            DateFormat::YearMonthDayDash => "%Y-%m-%d",
            DateFormat::DayMonthYearSlash => "%d/%m/%Y",
            DateFormat::MonthDayYearDash => "%m-%d-%Y",
            DateFormat::MonthDayYearDot => "%m.%d.%Y",
            DateFormat::YearMonthDayDot => "%Y.%m.%d",
            DateFormat::YearMonthDaySlash => "%Y/%m/%d",
        }
    }
}

/// Parses a date written in any of the [`DATE_FORMATS`], returning the
/// matched date together with the layout that matched.
pub fn parse_date_with_format(value: &str) -> Option<(NaiveDate, DateFormat)> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|&format| {
        NaiveDate::parse_from_str(value, format.pattern())
            .ok()
            .map(|date| (date, format))
    })
}

/// Parses a date written in any of the [`DATE_FORMATS`].
///
/// Returns `None` when no layout matches; malformed input is never an error.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    parse_date_with_format(value).map(|(date, _)| date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_day_year_slash_wins_over_day_month_year() {
        assert_eq!(parse_date("01/02/2020"), Some(ymd(2020, 1, 2)));
        assert_eq!(
            parse_date_with_format("01/02/2020").map(|(_, f)| f),
            Some(DateFormat::MonthDayYearSlash)
        );
    }

    #[test]
    fn test_day_month_year_slash_used_when_month_out_of_range() {
        assert_eq!(parse_date("13/02/2020"), Some(ymd(2020, 2, 13)));
        assert_eq!(
            parse_date_with_format("13/02/2020").map(|(_, f)| f),
            Some(DateFormat::DayMonthYearSlash)
        );
    }

    #[test]
    fn test_dash_layouts() {
        assert_eq!(parse_date("05-03-2021"), Some(ymd(2021, 3, 5)));
        assert_eq!(parse_date("2021-03-05"), Some(ymd(2021, 3, 5)));
        assert_eq!(parse_date("03-25-2021"), Some(ymd(2021, 3, 25)));
    }

    #[test]
    fn test_dot_layouts() {
        assert_eq!(parse_date("05.03.2021"), Some(ymd(2021, 3, 5)));
        assert_eq!(parse_date("03.25.2021"), Some(ymd(2021, 3, 25)));
        assert_eq!(parse_date("2021.03.05"), Some(ymd(2021, 3, 5)));
    }

    #[test]
    fn test_year_first_slash() {
        assert_eq!(parse_date("2021/03/05"), Some(ymd(2021, 3, 5)));
    }

    #[test]
    fn test_iso_round_trip() {
        let dates = ["2020-01-31", "1999-12-01", "2024-02-29"];
        for text in dates {
            let parsed = parse_date(text).unwrap();
            let written = parsed.format(OUTPUT_DATE_FORMAT).to_string();
            assert_eq!(written, text);
            assert_eq!(parse_date(&written), Some(parsed));
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_date("  2021-03-05 "), Some(ymd(2021, 3, 5)));
    }

    #[test]
    fn test_unparseable_values_give_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("31/02/2020"), None);
        assert_eq!(parse_date("2020-01-02T10:00"), None);
        assert_eq!(parse_date("2020_01_02"), None);
    }
}

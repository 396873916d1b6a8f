//! Calendar bucket arithmetic for grouping transactions by day, week or month.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::Error;

/// The size of the calendar buckets a balance series is grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per calendar day.
    #[default]
    Day,
    /// One bucket per ISO week, starting on Monday.
    Week,
    /// One bucket per calendar month.
    Month,
}

impl Granularity {
    /// The tag used for this granularity in query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// The start of the bucket that contains `date`.
    ///
    /// Weeks start on Monday, months on the first day of the month.
    pub fn floor(self, date: Date) -> Date {
        match self {
            Self::Day => date,
            Self::Week => {
                date - Duration::days(date.weekday().number_days_from_monday() as i64)
            }
            Self::Month => date - Duration::days(date.day() as i64 - 1),
        }
    }

    /// The start of the bucket immediately following the bucket that starts at
    /// `bucket_start`.
    ///
    /// `bucket_start` should be a value returned by [Granularity::floor].
    pub fn next(self, bucket_start: Date) -> Date {
        match self {
            Self::Day => bucket_start + Duration::days(1),
            Self::Week => bucket_start + Duration::days(7),
            Self::Month => {
                let month_length = bucket_start.month().length(bucket_start.year());
                bucket_start + Duration::days(month_length as i64)
            }
        }
    }
}

impl FromStr for Granularity {
    type Err = Error;

    /// Parse a granularity tag, one of "day", "week" or "month".
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] for any other tag.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::InvalidArgument(format!(
                "invalid group_by \"{other}\", expected one of \"day\", \"week\" or \"month\""
            ))),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

#[cfg(test)]
mod granularity_tests {
    use time::{Weekday, macros::date};

    use crate::{Error, dashboard::period::Granularity};

    #[test]
    fn parses_known_tags() {
        assert_eq!("day".parse(), Ok(Granularity::Day));
        assert_eq!("week".parse(), Ok(Granularity::Week));
        assert_eq!("month".parse(), Ok(Granularity::Month));
    }

    #[test]
    fn rejects_unknown_tag() {
        let result = "year".parse::<Granularity>();

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn parsing_is_case_sensitive_and_does_not_default() {
        assert!(matches!(
            "Day".parse::<Granularity>(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            "".parse::<Granularity>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn day_floor_is_identity() {
        assert_eq!(Granularity::Day.floor(date!(2025 - 10 - 01)), date!(2025 - 10 - 01));
    }

    #[test]
    fn week_floor_is_monday_of_the_same_week() {
        // 2025-10-01 is a Wednesday.
        let wednesday = date!(2025 - 10 - 01);
        assert_eq!(wednesday.weekday(), Weekday::Wednesday);

        let got = Granularity::Week.floor(wednesday);

        assert_eq!(got, date!(2025 - 09 - 29));
        assert_eq!(got.weekday(), Weekday::Monday);
    }

    #[test]
    fn week_floor_crosses_year_boundary() {
        // 2025-01-01 is a Wednesday, its Monday is in the previous year.
        assert_eq!(
            Granularity::Week.floor(date!(2025 - 01 - 01)),
            date!(2024 - 12 - 30)
        );
    }

    #[test]
    fn week_floor_of_monday_and_sunday() {
        assert_eq!(
            Granularity::Week.floor(date!(2025 - 09 - 29)),
            date!(2025 - 09 - 29)
        );
        assert_eq!(
            Granularity::Week.floor(date!(2025 - 10 - 05)),
            date!(2025 - 09 - 29)
        );
    }

    #[test]
    fn month_floor_is_first_of_month() {
        assert_eq!(
            Granularity::Month.floor(date!(2024 - 02 - 29)),
            date!(2024 - 02 - 01)
        );
    }

    #[test]
    fn next_day_crosses_month_and_leap_day() {
        assert_eq!(Granularity::Day.next(date!(2024 - 02 - 28)), date!(2024 - 02 - 29));
        assert_eq!(Granularity::Day.next(date!(2024 - 02 - 29)), date!(2024 - 03 - 01));
        assert_eq!(Granularity::Day.next(date!(2025 - 12 - 31)), date!(2026 - 01 - 01));
    }

    #[test]
    fn next_week_adds_seven_days() {
        assert_eq!(
            Granularity::Week.next(date!(2025 - 12 - 29)),
            date!(2026 - 01 - 05)
        );
    }

    #[test]
    fn next_month_rolls_over_year() {
        assert_eq!(
            Granularity::Month.next(date!(2025 - 12 - 01)),
            date!(2026 - 01 - 01)
        );
        assert_eq!(
            Granularity::Month.next(date!(2025 - 01 - 01)),
            date!(2025 - 02 - 01)
        );
        assert_eq!(
            Granularity::Month.next(date!(2024 - 02 - 01)),
            date!(2024 - 03 - 01)
        );
    }

    #[test]
    fn next_always_advances() {
        let granularities = [Granularity::Day, Granularity::Week, Granularity::Month];
        let mut date = date!(2023 - 01 - 01);

        while date <= date!(2026 - 12 - 31) {
            for granularity in granularities {
                let bucket_start = granularity.floor(date);
                let next = granularity.next(bucket_start);

                assert!(next > bucket_start, "{granularity} did not advance from {bucket_start}");
                assert!(next > date, "{granularity} bucket after {date} starts at {next}");
                assert_eq!(granularity.floor(next), next);
            }

            date = date.next_day().expect("date overflow");
        }
    }
}

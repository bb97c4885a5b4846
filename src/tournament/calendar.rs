//! Text forms of dates, clock times and timestamps shared by the API and the stores.

use time::{
    Date, OffsetDateTime, Time,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const CLOCK_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

/// `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| "invalid-date".into())
}

/// Parse `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), DATE_FORMAT)
}

/// `HH:MM:SS`.
pub fn format_clock(clock: Time) -> String {
    clock
        .format(CLOCK_FORMAT)
        .unwrap_or_else(|_| "invalid-time".into())
}

/// Parse `HH:MM:SS`.
pub fn parse_clock(raw: &str) -> Result<Time, time::error::Parse> {
    Time::parse(raw.trim(), CLOCK_FORMAT)
}

/// RFC 3339, e.g. `2024-04-12T15:00:00Z`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, time};

    use super::*;

    #[test]
    fn dates_and_clocks_use_fixed_widths() {
        assert_eq!(format_date(date!(2024 - 04 - 07)), "2024-04-07");
        assert_eq!(parse_date("2024-04-07").unwrap(), date!(2024 - 04 - 07));
        assert_eq!(format_clock(time!(9:05:00)), "09:05:00");
        assert_eq!(parse_clock("00:42:10").unwrap(), time!(0:42:10));
        assert!(parse_clock("42 min").is_err());
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let at = datetime!(2024-04-12 15:00 UTC);
        assert_eq!(format_timestamp(at), "2024-04-12T15:00:00Z");
        assert_eq!(parse_timestamp("2024-04-12T15:00:00Z").unwrap(), at);
    }
}

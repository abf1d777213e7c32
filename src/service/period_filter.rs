use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::period::Period;

/// Inclusive bounds of a named period, both as calendar days and as instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PeriodWindow {
    pub period: Period,
    #[schema(example = "2024-02-12", value_type = String, format = "date")]
    pub first_day: NaiveDate,
    #[schema(example = "2024-02-18", value_type = String, format = "date")]
    pub last_day: NaiveDate,
    /// 00:00:00.000 of `first_day` in the reporting zone.
    #[schema(value_type = String, format = "date-time")]
    pub start: DateTime<Utc>,
    /// 23:59:59.999 of `last_day` in the reporting zone.
    #[schema(value_type = String, format = "date-time")]
    pub end: DateTime<Utc>,
}

/// The zone all day boundaries are computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportingZone {
    #[default]
    System,
    Named(Tz),
}

impl ReportingZone {
    /// `None` or a blank name selects the system zone; otherwise an IANA name such as `Asia/Dhaka`.
    pub fn from_name(name: Option<&str>) -> AppResult<Self> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(ReportingZone::System),
            Some(name) => name
                .parse::<Tz>()
                .map(ReportingZone::Named)
                .map_err(|_| AppError::InvalidArgument(format!("unknown time zone '{name}'"))),
        }
    }

    /// Calendar date of `now` in this zone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        match self {
            ReportingZone::System => now.with_timezone(&Local).date_naive(),
            ReportingZone::Named(tz) => now.with_timezone(tz).date_naive(),
        }
    }

    pub fn window_for(&self, period: Period, now: DateTime<Utc>) -> PeriodWindow {
        match self {
            ReportingZone::System => window_for(period, &now.with_timezone(&Local)),
            ReportingZone::Named(tz) => window_for(period, &now.with_timezone(tz)),
        }
    }

    /// Window for `period` around an explicit calendar day instead of today.
    pub fn window_around(&self, period: Period, day: NaiveDate) -> PeriodWindow {
        match self {
            ReportingZone::System => window_around(&Local, period, day),
            ReportingZone::Named(tz) => window_around(tz, period, day),
        }
    }
}

// 15-minute steps across one day; every real zone gap is shorter.
const DAY_PROBE_STEPS: i64 = 24 * 4;

/// Computes the window for `period` containing the zone-local date of `now`.
/// Weeks start on Monday; months honour their real length.
pub fn window_for<Z: TimeZone>(period: Period, now: &DateTime<Z>) -> PeriodWindow {
    window_around(&now.timezone(), period, now.date_naive())
}

fn window_around<Z: TimeZone>(zone: &Z, period: Period, today: NaiveDate) -> PeriodWindow {
    let (first_day, last_day) = match period {
        Period::Day => (today, today),
        Period::Week => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            (monday, monday + Duration::days(6))
        }
        Period::Month => {
            let first = today - Duration::days(i64::from(today.day0()));
            let last = first
                .checked_add_months(Months::new(1))
                .and_then(|next| next.pred_opt())
                .unwrap_or(NaiveDate::MAX);
            (first, last)
        }
    };

    let start = start_of_day(zone, first_day);
    let end = start_of_day(zone, last_day + Duration::days(1)) - Duration::milliseconds(1);

    PeriodWindow {
        period,
        first_day,
        last_day,
        start,
        end,
    }
}

/// First valid local instant of `day`. When midnight falls in a DST gap the
/// day starts at the end of the gap.
fn start_of_day<Z: TimeZone>(zone: &Z, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    (0..=DAY_PROBE_STEPS)
        .map(|step| midnight + Duration::minutes(step * 15))
        .find_map(|local| zone.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn day_window_is_single_day() {
        let window = window_for(Period::Day, &at_utc(2024, 2, 15, 10));
        assert_eq!(window.first_day, date(2024, 2, 15));
        assert_eq!(window.last_day, date(2024, 2, 15));
        assert_eq!(window.start, at_utc(2024, 2, 15, 0));
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 2, 15, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn week_from_wednesday_spans_monday_to_sunday() {
        let wednesday = at_utc(2024, 2, 14, 12);
        assert_eq!(wednesday.weekday(), Weekday::Wed);

        let window = window_for(Period::Week, &wednesday);
        assert_eq!(window.first_day, date(2024, 2, 12));
        assert_eq!(window.last_day, date(2024, 2, 18));
        assert_eq!(window.first_day.weekday(), Weekday::Mon);
        assert_eq!(window.last_day.weekday(), Weekday::Sun);
    }

    #[test]
    fn week_anchored_on_monday_and_sunday() {
        let monday = window_for(Period::Week, &at_utc(2024, 2, 12, 0));
        assert_eq!(monday.first_day, date(2024, 2, 12));

        let sunday = window_for(Period::Week, &at_utc(2024, 2, 18, 23));
        assert_eq!(sunday.first_day, date(2024, 2, 12));
        assert_eq!(sunday.last_day, date(2024, 2, 18));
    }

    #[test]
    fn week_crossing_year_boundary() {
        let window = window_for(Period::Week, &at_utc(2025, 1, 1, 9));
        assert_eq!(window.first_day, date(2024, 12, 30));
        assert_eq!(window.last_day, date(2025, 1, 5));
    }

    #[test]
    fn month_in_leap_february() {
        let window = window_for(Period::Month, &at_utc(2024, 2, 15, 8));
        assert_eq!(window.first_day, date(2024, 2, 1));
        assert_eq!(window.last_day, date(2024, 2, 29));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(window_for(Period::Month, &at_utc(2023, 2, 3, 0)).last_day, date(2023, 2, 28));
        assert_eq!(window_for(Period::Month, &at_utc(2024, 4, 30, 0)).last_day, date(2024, 4, 30));
        assert_eq!(window_for(Period::Month, &at_utc(2024, 12, 31, 0)).last_day, date(2024, 12, 31));
        assert_eq!(window_for(Period::Month, &at_utc(1900, 2, 10, 0)).last_day, date(1900, 2, 28));
        assert_eq!(window_for(Period::Month, &at_utc(2000, 2, 10, 0)).last_day, date(2000, 2, 29));
    }

    #[test]
    fn boundaries_follow_the_zone() {
        let dhaka = FixedOffset::east_opt(6 * 3600).unwrap();
        // 20:00 UTC on the 14th is already the 15th in UTC+6
        let now = at_utc(2024, 2, 14, 20).with_timezone(&dhaka);

        let window = window_for(Period::Day, &now);
        assert_eq!(window.first_day, date(2024, 2, 15));
        assert_eq!(window.start, at_utc(2024, 2, 14, 18));
        assert_eq!(window.end, at_utc(2024, 2, 15, 18) - Duration::milliseconds(1));
    }

    #[test]
    fn named_zone_resolves_today() {
        let zone = ReportingZone::from_name(Some("Asia/Dhaka")).unwrap();
        assert_eq!(zone.today(at_utc(2024, 2, 14, 20)), date(2024, 2, 15));
        assert_eq!(zone.window_for(Period::Week, at_utc(2024, 2, 14, 20)).first_day, date(2024, 2, 12));
    }

    #[test]
    fn window_around_explicit_day() {
        let zone = ReportingZone::from_name(Some("UTC")).unwrap();
        let window = zone.window_around(Period::Month, date(2023, 11, 20));
        assert_eq!(window.first_day, date(2023, 11, 1));
        assert_eq!(window.last_day, date(2023, 11, 30));
        assert_eq!(window.start, at_utc(2023, 11, 1, 0));
    }

    #[test]
    fn blank_or_unknown_zone_names() {
        assert_eq!(ReportingZone::from_name(None).unwrap(), ReportingZone::System);
        assert_eq!(ReportingZone::from_name(Some("  ")).unwrap(), ReportingZone::System);
        assert!(matches!(
            ReportingZone::from_name(Some("Mars/Olympus")),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn day_starting_in_a_dst_gap_begins_after_the_gap() {
        // Sao Paulo skipped 00:00-01:00 local on 2018-11-04
        let zone = ReportingZone::from_name(Some("America/Sao_Paulo")).unwrap();
        let window = zone.window_around(Period::Day, date(2018, 11, 4));

        assert_eq!(window.start, at_utc(2018, 11, 4, 3));
        assert_eq!(window.end, at_utc(2018, 11, 5, 2) - Duration::milliseconds(1));
    }
}

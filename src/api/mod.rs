use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};
use crate::model::period::Period;
use crate::service::period_filter::{PeriodWindow, ReportingZone};

pub mod attendance;
pub mod employee;
pub mod report;

/// `period` and optional anchor `date` shared by the history endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    /// day, week or month
    #[param(example = "week")]
    pub period: Option<String>,
    /// Anchor day (YYYY-MM-DD); defaults to today in the reporting zone
    #[param(example = "2024-02-15")]
    pub date: Option<String>,
}

impl PeriodQuery {
    /// The requested window, or `None` when no period was given.
    pub fn window(&self, zone: &ReportingZone) -> AppResult<Option<PeriodWindow>> {
        let Some(period) = self.period.as_deref() else {
            return Ok(None);
        };
        let period = Period::parse(period)?;

        Ok(Some(match self.date.as_deref() {
            Some(date) => zone.window_around(period, parse_day(date)?),
            None => zone.window_for(period, Utc::now()),
        }))
    }

    /// Like [`window`](Self::window) but falls back to `default` when no period was given.
    pub fn window_or(&self, zone: &ReportingZone, default: Period) -> AppResult<PeriodWindow> {
        match self.window(zone)? {
            Some(window) => Ok(window),
            None => match self.date.as_deref() {
                Some(date) => Ok(zone.window_around(default, parse_day(date)?)),
                None => Ok(zone.window_for(default, Utc::now())),
            },
        }
    }
}

pub fn parse_day(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidArgument(format!("malformed date '{value}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(period: Option<&str>, date: Option<&str>) -> PeriodQuery {
        PeriodQuery {
            period: period.map(String::from),
            date: date.map(String::from),
        }
    }

    #[test]
    fn explicit_period_and_anchor() {
        let zone = ReportingZone::from_name(Some("UTC")).unwrap();
        let window = query(Some("week"), Some("2024-02-14")).window(&zone).unwrap().unwrap();
        assert_eq!(window.first_day, parse_day("2024-02-12").unwrap());
    }

    #[test]
    fn missing_period_uses_default_only_when_asked() {
        let zone = ReportingZone::from_name(Some("UTC")).unwrap();
        assert!(query(None, None).window(&zone).unwrap().is_none());

        let window = query(None, Some("2024-02-14")).window_or(&zone, Period::Month).unwrap();
        assert_eq!(window.last_day, parse_day("2024-02-29").unwrap());
    }

    #[test]
    fn bad_period_or_date_is_invalid_argument() {
        let zone = ReportingZone::System;
        assert!(matches!(
            query(Some("fortnight"), None).window(&zone),
            Err(AppError::InvalidArgument(_))
        ));
        assert!(matches!(
            query(Some("day"), Some("15/02/2024")).window(&zone),
            Err(AppError::InvalidArgument(_))
        ));
    }
}

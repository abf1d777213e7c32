//! Derived attendance views. Everything here is a pure function of the snapshot
//! it is given.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::employee::Employee;

pub const DEFAULT_TOP_PERFORMERS: usize = 5;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeWithStatus {
    pub employee: Employee,
    /// `None` while the employee is unmarked for the day.
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AggregateSummary {
    pub present: u64,
    pub absent: u64,
    pub leave: u64,
    pub unmarked: u64,
    pub total: u64,
    pub present_percent: u64,
    pub absent_percent: u64,
    pub leave_percent: u64,
    pub unmarked_percent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeekdayTrend {
    #[schema(example = "Mon", value_type = String)]
    pub weekday: Weekday,
    pub present_percent: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PerformerRank {
    pub employee_id: u64,
    pub present: u64,
    pub total: u64,
    pub rate: u64,
}

/// Per-employee counts over a set of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeBreakdown {
    pub employee_id: u64,
    pub name: String,
    pub present: u64,
    pub absent: u64,
    pub leave: u64,
    pub total: u64,
    pub rate: u64,
}

/// `part * 100 / whole`, truncated; zero when `whole` is zero.
pub fn percent(part: u64, whole: u64) -> u64 {
    if whole == 0 { 0 } else { part * 100 / whole }
}

/// Pairs every employee with their entry from `todays_entries`, keeping the
/// employee order. Employees without an entry come back unmarked.
pub fn join_today_status(employees: &[Employee], todays_entries: &[AttendanceEntry]) -> Vec<EmployeeWithStatus> {
    let by_employee: HashMap<u64, AttendanceStatus> = todays_entries
        .iter()
        .map(|entry| (entry.employee_id, entry.status))
        .collect();

    employees
        .iter()
        .map(|employee| EmployeeWithStatus {
            employee: employee.clone(),
            status: by_employee.get(&employee.id).copied(),
        })
        .collect()
}

pub fn status_distribution(entries: &[AttendanceEntry]) -> AggregateSummary {
    tally(entries.iter().map(|entry| Some(entry.status)))
}

/// Distribution over a joined roster, where unmarked employees count too.
pub fn roster_distribution(rows: &[EmployeeWithStatus]) -> AggregateSummary {
    tally(rows.iter().map(|row| row.status))
}

fn tally(statuses: impl Iterator<Item = Option<AttendanceStatus>>) -> AggregateSummary {
    let mut summary = AggregateSummary::default();

    for status in statuses {
        match status {
            Some(AttendanceStatus::Present) => summary.present += 1,
            Some(AttendanceStatus::Absent) => summary.absent += 1,
            Some(AttendanceStatus::Leave) => summary.leave += 1,
            None => summary.unmarked += 1,
        }
        summary.total += 1;
    }

    summary.present_percent = percent(summary.present, summary.total);
    summary.absent_percent = percent(summary.absent, summary.total);
    summary.leave_percent = percent(summary.leave, summary.total);
    summary.unmarked_percent = percent(summary.unmarked, summary.total);
    summary
}

/// Present share per weekday, Monday first.
pub fn weekly_trend(entries: &[AttendanceEntry]) -> Vec<WeekdayTrend> {
    let mut present = [0u64; 7];
    let mut total = [0u64; 7];

    for entry in entries {
        let slot = entry.day.weekday().num_days_from_monday() as usize;
        total[slot] += 1;
        if entry.status == AttendanceStatus::Present {
            present[slot] += 1;
        }
    }

    WEEK.iter()
        .enumerate()
        .map(|(slot, &weekday)| WeekdayTrend {
            weekday,
            present_percent: percent(present[slot], total[slot]),
        })
        .collect()
}

/// Highest attendance rate first; equal rates fall back to ascending employee id.
pub fn top_performers(entries: &[AttendanceEntry], limit: usize) -> Vec<PerformerRank> {
    let mut counts: BTreeMap<u64, (u64, u64)> = BTreeMap::new();
    for entry in entries {
        let (present, total) = counts.entry(entry.employee_id).or_default();
        *total += 1;
        if entry.status == AttendanceStatus::Present {
            *present += 1;
        }
    }

    let mut ranks: Vec<PerformerRank> = counts
        .into_iter()
        .map(|(employee_id, (present, total))| PerformerRank {
            employee_id,
            present,
            total,
            rate: percent(present, total),
        })
        .collect();

    ranks.sort_by_key(|rank| (Reverse(rank.rate), rank.employee_id));
    ranks.truncate(limit);
    ranks
}

/// One row per employee, in employee order, including employees with no entries.
pub fn employee_breakdown(employees: &[Employee], entries: &[AttendanceEntry]) -> Vec<EmployeeBreakdown> {
    let mut counts: HashMap<u64, [u64; 3]> = HashMap::new();
    for entry in entries {
        let slot = match entry.status {
            AttendanceStatus::Present => 0,
            AttendanceStatus::Absent => 1,
            AttendanceStatus::Leave => 2,
        };
        counts.entry(entry.employee_id).or_default()[slot] += 1;
    }

    employees
        .iter()
        .map(|employee| {
            let [present, absent, leave] = counts.get(&employee.id).copied().unwrap_or_default();
            let total = present + absent + leave;
            EmployeeBreakdown {
                employee_id: employee.id,
                name: employee.name.clone(),
                present,
                absent,
                leave,
                total,
                rate: percent(present, total),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn employee(id: u64, name: &str) -> Employee {
        Employee {
            id,
            name: name.into(),
            job_title: "Clerk".into(),
            email: None,
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    fn entry(id: u64, employee_id: u64, day: NaiveDate, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            id,
            employee_id,
            day,
            status,
        }
    }

    fn d(day: u32) -> NaiveDate {
        // 2024-02-12 is a Monday
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    #[test]
    fn join_marks_missing_employees_unmarked() {
        let employees = vec![employee(1, "Alice"), employee(2, "Bob")];
        let entries = vec![entry(1, 1, d(15), AttendanceStatus::Present)];

        let rows = join_today_status(&employees, &entries);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].employee.name, "Alice");
        assert_eq!(rows[0].status, Some(AttendanceStatus::Present));
        assert_eq!(rows[1].employee.name, "Bob");
        assert_eq!(rows[1].status, None);
    }

    #[test]
    fn join_ignores_entries_for_unknown_employees() {
        let employees = vec![employee(1, "Alice")];
        let entries = vec![
            entry(1, 1, d(15), AttendanceStatus::Leave),
            entry(2, 99, d(15), AttendanceStatus::Present),
        ];

        let rows = join_today_status(&employees, &entries);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, Some(AttendanceStatus::Leave));
        assert!(join_today_status(&[], &entries).is_empty());
    }

    #[test]
    fn empty_distribution_is_all_zero() {
        assert_eq!(status_distribution(&[]), AggregateSummary::default());
    }

    #[test]
    fn distribution_over_ten_days() {
        let statuses = [
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Present,
            AttendanceStatus::Present,
            AttendanceStatus::Leave,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Present,
            AttendanceStatus::Present,
        ];
        let entries: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, &s)| entry(i as u64 + 1, 1, d(1) + Duration::days(i as i64), s))
            .collect();

        let summary = status_distribution(&entries);

        assert_eq!((summary.present, summary.present_percent), (7, 70));
        assert_eq!((summary.absent, summary.absent_percent), (2, 20));
        assert_eq!((summary.leave, summary.leave_percent), (1, 10));
        assert_eq!(summary.unmarked, 0);
        assert_eq!(summary.total, 10);
    }

    #[test]
    fn percentages_truncate() {
        let entries = vec![
            entry(1, 1, d(12), AttendanceStatus::Present),
            entry(2, 2, d(12), AttendanceStatus::Absent),
            entry(3, 3, d(12), AttendanceStatus::Absent),
        ];
        let summary = status_distribution(&entries);
        assert_eq!(summary.present_percent, 33);
        assert_eq!(summary.absent_percent, 66);
    }

    #[test]
    fn roster_distribution_counts_unmarked() {
        let employees = vec![employee(1, "Alice"), employee(2, "Bob"), employee(3, "Cara"), employee(4, "Dev")];
        let entries = vec![entry(1, 1, d(15), AttendanceStatus::Present)];

        let summary = roster_distribution(&join_today_status(&employees, &entries));
        assert_eq!(summary.present, 1);
        assert_eq!(summary.unmarked, 3);
        assert_eq!(summary.unmarked_percent, 75);
    }

    #[test]
    fn weekly_trend_has_seven_days_starting_monday() {
        let entries = vec![
            entry(1, 1, d(12), AttendanceStatus::Present),
            entry(2, 2, d(12), AttendanceStatus::Absent),
            entry(3, 1, d(19), AttendanceStatus::Present),
            entry(4, 1, d(14), AttendanceStatus::Leave),
        ];

        let trend = weekly_trend(&entries);

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].weekday, Weekday::Mon);
        assert_eq!(trend[0].present_percent, 66);
        assert_eq!(trend[1].present_percent, 0);
        assert_eq!(trend[2].weekday, Weekday::Wed);
        assert_eq!(trend[2].present_percent, 0);
        assert_eq!(trend[6].weekday, Weekday::Sun);
    }

    #[test]
    fn top_performers_rank_by_rate_then_id() {
        let entries = vec![
            // employee 3: 1/2
            entry(1, 3, d(12), AttendanceStatus::Present),
            entry(2, 3, d(13), AttendanceStatus::Absent),
            // employee 2: 2/2
            entry(3, 2, d(12), AttendanceStatus::Present),
            entry(4, 2, d(13), AttendanceStatus::Present),
            // employee 1: 1/2, ties with 3
            entry(5, 1, d(12), AttendanceStatus::Leave),
            entry(6, 1, d(13), AttendanceStatus::Present),
        ];

        let ranks = top_performers(&entries, DEFAULT_TOP_PERFORMERS);
        let order: Vec<_> = ranks.iter().map(|r| (r.employee_id, r.rate)).collect();
        assert_eq!(order, vec![(2, 100), (1, 50), (3, 50)]);

        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(top_performers(&reversed, DEFAULT_TOP_PERFORMERS), ranks);
    }

    #[test]
    fn top_performers_respects_limit() {
        let entries: Vec<_> = (1..=8)
            .map(|id| entry(id, id, d(12), AttendanceStatus::Present))
            .collect();

        let ranks = top_performers(&entries, 5);
        assert_eq!(ranks.len(), 5);
        assert_eq!(ranks.last().unwrap().employee_id, 5);
        assert!(top_performers(&entries, 0).is_empty());
    }

    #[test]
    fn breakdown_lists_every_employee() {
        let employees = vec![employee(1, "Alice"), employee(2, "Bob")];
        let entries = vec![
            entry(1, 1, d(12), AttendanceStatus::Present),
            entry(2, 1, d(13), AttendanceStatus::Absent),
            entry(3, 1, d(14), AttendanceStatus::Leave),
            entry(4, 1, d(15), AttendanceStatus::Present),
        ];

        let rows = employee_breakdown(&employees, &entries);

        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].present, rows[0].absent, rows[0].leave, rows[0].rate), (2, 1, 1, 50));
        assert_eq!((rows[1].total, rows[1].rate), (0, 0));
    }
}

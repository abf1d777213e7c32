//! Persistence collaborators. The core only talks to these traits; the MySQL
//! implementation backs production and the in-memory one backs tests and
//! database-less runs.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Result of a conditional upsert on `(employee_id, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub entry_id: u64,
    pub created: bool,
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// All employees ordered by id.
    async fn list_employees(&self) -> AppResult<Vec<Employee>>;

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>>;

    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee>;

    /// Returns `None` when no employee has this id.
    async fn update_employee(&self, id: u64, update: EmployeeUpdate) -> AppResult<Option<Employee>>;

    /// Deletes the employee together with every attendance entry they own.
    /// Returns `false` when no employee has this id.
    async fn delete_employee(&self, id: u64) -> AppResult<bool>;
}

#[async_trait]
pub trait AttendanceRecordStore: Send + Sync {
    /// Entries with `first <= day <= last`, ordered by day then employee id.
    async fn entries_in_range(&self, first: NaiveDate, last: NaiveDate) -> AppResult<Vec<AttendanceEntry>>;

    /// Every entry, same ordering as [`entries_in_range`](Self::entries_in_range).
    async fn all_entries(&self) -> AppResult<Vec<AttendanceEntry>>;

    async fn entry_for(&self, employee_id: u64, day: NaiveDate) -> AppResult<Option<AttendanceEntry>>;

    /// Inserts or replaces the status stored under `(employee_id, day)` as one
    /// atomic step. Concurrent calls for the same key never produce two rows.
    /// An employee that does not exist is `NotFound`.
    async fn upsert_entry(
        &self,
        employee_id: u64,
        day: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<UpsertOutcome>;

    /// Returns `false` when no entry has this id.
    async fn delete_entry(&self, id: u64) -> AppResult<bool>;
}

/// Both collaborators behind one object, as held in application state.
pub trait Store: EmployeeDirectory + AttendanceRecordStore {}

impl<T: EmployeeDirectory + AttendanceRecordStore> Store for T {}

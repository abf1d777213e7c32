use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};

use super::{AttendanceRecordStore, EmployeeDirectory, UpsertOutcome};

#[derive(Default)]
struct Tables {
    employees: BTreeMap<u64, Employee>,
    /// Keyed by the natural key so a lookup and a write happen under one lock.
    entries: BTreeMap<(NaiveDate, u64), AttendanceEntry>,
    next_employee_id: u64,
    next_entry_id: u64,
}

/// Process-local store with the same contract as the MySQL one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Store("memory store poisoned".into()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Store("memory store poisoned".into()))
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        Ok(self.read()?.employees.values().cloned().collect())
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let mut tables = self.write()?;
        tables.next_employee_id += 1;

        let employee = Employee {
            id: tables.next_employee_id,
            name: employee.name,
            job_title: employee.job_title,
            email: employee.email,
            phone: employee.phone,
            address: employee.address,
            created_at: Utc::now(),
        };
        tables.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: u64, update: EmployeeUpdate) -> AppResult<Option<Employee>> {
        let mut tables = self.write()?;
        Ok(tables.employees.get_mut(&id).map(|employee| {
            update.apply_to(employee);
            employee.clone()
        }))
    }

    async fn delete_employee(&self, id: u64) -> AppResult<bool> {
        let mut tables = self.write()?;
        if tables.employees.remove(&id).is_none() {
            return Ok(false);
        }
        tables.entries.retain(|_, entry| entry.employee_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AttendanceRecordStore for MemoryStore {
    async fn entries_in_range(&self, first: NaiveDate, last: NaiveDate) -> AppResult<Vec<AttendanceEntry>> {
        if first > last {
            return Ok(Vec::new());
        }
        Ok(self
            .read()?
            .entries
            .range((first, u64::MIN)..=(last, u64::MAX))
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn all_entries(&self) -> AppResult<Vec<AttendanceEntry>> {
        Ok(self.read()?.entries.values().cloned().collect())
    }

    async fn entry_for(&self, employee_id: u64, day: NaiveDate) -> AppResult<Option<AttendanceEntry>> {
        Ok(self.read()?.entries.get(&(day, employee_id)).cloned())
    }

    async fn upsert_entry(
        &self,
        employee_id: u64,
        day: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<UpsertOutcome> {
        let mut tables = self.write()?;

        if !tables.employees.contains_key(&employee_id) {
            return Err(AppError::NotFound(format!("employee {employee_id}")));
        }

        if let Some(entry) = tables.entries.get_mut(&(day, employee_id)) {
            entry.status = status;
            return Ok(UpsertOutcome {
                entry_id: entry.id,
                created: false,
            });
        }

        tables.next_entry_id += 1;
        let entry = AttendanceEntry {
            id: tables.next_entry_id,
            employee_id,
            day,
            status,
        };
        tables.entries.insert((day, employee_id), entry);

        Ok(UpsertOutcome {
            entry_id: tables.next_entry_id,
            created: true,
        })
    }

    async fn delete_entry(&self, id: u64) -> AppResult<bool> {
        let mut tables = self.write()?;
        let key = tables
            .entries
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(key, _)| *key);

        Ok(match key {
            Some(key) => tables.entries.remove(&key).is_some(),
            None => false,
        })
    }
}

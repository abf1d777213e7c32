use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::{debug, error};

use crate::error::{AppError, AppResult};
use crate::model::attendance::{AttendanceEntry, AttendanceRow, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};

use super::{AttendanceRecordStore, EmployeeDirectory, UpsertOutcome};

const EMPLOYEE_COLUMNS: &str = "id, name, job_title, email, phone, address, created_at";

// The only write for a mark. `revision` changes on every duplicate hit, so MySQL
// reports 1 affected row for an insert and 2 for an update, with or without
// CLIENT_FOUND_ROWS. LAST_INSERT_ID(id) exposes the existing row's id.
const UPSERT_ATTENDANCE: &str = r#"
    INSERT INTO attendance (employee_id, day, status)
    VALUES (?, ?, ?)
    ON DUPLICATE KEY UPDATE
        status = VALUES(status),
        revision = revision + 1,
        id = LAST_INSERT_ID(id)
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn is_missing_employee(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

fn into_entries(rows: Vec<AttendanceRow>) -> AppResult<Vec<AttendanceEntry>> {
    rows.into_iter()
        .map(|row| AttendanceEntry::try_from(row).map_err(AppError::Store))
        .collect()
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn list_employees(&self) -> AppResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch employees");
                e
            })?;
        Ok(employees)
    }

    async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, job_title, email, phone, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.job_title)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create employee");
            e
        })?;

        Ok(Employee {
            id: result.last_insert_id(),
            name: employee.name,
            job_title: employee.job_title,
            email: employee.email,
            phone: employee.phone,
            address: employee.address,
            created_at,
        })
    }

    async fn update_employee(&self, id: u64, update: EmployeeUpdate) -> AppResult<Option<Employee>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE");
        let Some(mut employee) = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        update.apply_to(&mut employee);

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, job_title = ?, email = ?, phone = ?, address = ?
            WHERE id = ?
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.job_title)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.address)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(employee))
    }

    async fn delete_employee(&self, id: u64) -> AppResult<bool> {
        // attendance rows go with the employee through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = id, "Failed to delete employee");
                e
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AttendanceRecordStore for MySqlStore {
    async fn entries_in_range(&self, first: NaiveDate, last: NaiveDate) -> AppResult<Vec<AttendanceEntry>> {
        debug!(%first, %last, "Fetching attendance range");
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, day, status
            FROM attendance
            WHERE day BETWEEN ? AND ?
            ORDER BY day, employee_id
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_all(&self.pool)
        .await?;
        into_entries(rows)
    }

    async fn all_entries(&self) -> AppResult<Vec<AttendanceEntry>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            "SELECT id, employee_id, day, status FROM attendance ORDER BY day, employee_id",
        )
        .fetch_all(&self.pool)
        .await?;
        into_entries(rows)
    }

    async fn entry_for(&self, employee_id: u64, day: NaiveDate) -> AppResult<Option<AttendanceEntry>> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            "SELECT id, employee_id, day, status FROM attendance WHERE employee_id = ? AND day = ?",
        )
        .bind(employee_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttendanceEntry::try_from)
            .transpose()
            .map_err(AppError::Store)
    }

    async fn upsert_entry(
        &self,
        employee_id: u64,
        day: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<UpsertOutcome> {
        let result = sqlx::query(UPSERT_ATTENDANCE)
            .bind(employee_id)
            .bind(day)
            .bind(status.as_ref())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_missing_employee(&e) {
                    return AppError::NotFound(format!("employee {employee_id}"));
                }
                error!(error = %e, employee_id, %day, "Attendance upsert failed");
                AppError::from(e)
            })?;

        Ok(UpsertOutcome {
            entry_id: result.last_insert_id(),
            created: result.rows_affected() == 1,
        })
    }

    async fn delete_entry(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

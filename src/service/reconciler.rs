use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::AttendanceStatus;
use crate::store::{AttendanceRecordStore, EmployeeDirectory, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MarkOutcome {
    #[schema(example = 12)]
    pub entry_id: u64,
    /// `false` when an existing entry for the same day was overwritten.
    pub created: bool,
}

/// Sole writer of attendance status. Every mark goes through the store's
/// conditional upsert so one `(employee, day)` key never holds two entries.
#[derive(Clone)]
pub struct AttendanceReconciler {
    store: Arc<dyn Store>,
}

impl AttendanceReconciler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn mark_or_update(
        &self,
        employee_id: u64,
        day: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<MarkOutcome> {
        if self.store.get_employee(employee_id).await?.is_none() {
            return Err(AppError::NotFound(format!("employee {employee_id}")));
        }

        let outcome = self.store.upsert_entry(employee_id, day, status).await?;

        debug!(
            employee_id,
            %day,
            %status,
            entry_id = outcome.entry_id,
            created = outcome.created,
            "Attendance marked"
        );

        Ok(MarkOutcome {
            entry_id: outcome.entry_id,
            created: outcome.created,
        })
    }

    /// Marks every listed employee with the same status, stopping at the first failure.
    /// Duplicate ids are marked once.
    pub async fn mark_many(
        &self,
        employee_ids: &[u64],
        day: NaiveDate,
        status: AttendanceStatus,
    ) -> AppResult<Vec<MarkOutcome>> {
        let mut ids = employee_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut outcomes = Vec::with_capacity(ids.len());
        for employee_id in ids {
            outcomes.push(self.mark_or_update(employee_id, day, status).await?);
        }

        info!(count = outcomes.len(), %day, %status, "Bulk attendance marked");
        Ok(outcomes)
    }

    pub async fn remove(&self, entry_id: u64) -> AppResult<()> {
        if !self.store.delete_entry(entry_id).await? {
            return Err(AppError::NotFound(format!("attendance entry {entry_id}")));
        }
        info!(entry_id, "Attendance entry removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceEntry;
    use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};
    use crate::store::{MemoryStore, UpsertOutcome};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    async fn reconciler_with(names: &[&str]) -> (AttendanceReconciler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for name in names {
            store
                .insert_employee(NewEmployee {
                    name: name.to_string(),
                    job_title: "Engineer".into(),
                    email: None,
                    phone: None,
                    address: None,
                })
                .await
                .unwrap();
        }
        (AttendanceReconciler::new(store.clone()), store)
    }

    #[actix_web::test]
    async fn last_write_wins_with_single_entry() {
        let (reconciler, store) = reconciler_with(&["Alice"]).await;

        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Leave,
            AttendanceStatus::Absent,
        ] {
            reconciler.mark_or_update(1, day(4), status).await.unwrap();
        }

        let entries = store.all_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, AttendanceStatus::Absent);
    }

    #[actix_web::test]
    async fn marking_twice_is_idempotent() {
        let (reconciler, store) = reconciler_with(&["Alice"]).await;

        let first = reconciler
            .mark_or_update(1, day(4), AttendanceStatus::Present)
            .await
            .unwrap();
        let after_once = store.all_entries().await.unwrap();

        let second = reconciler
            .mark_or_update(1, day(4), AttendanceStatus::Present)
            .await
            .unwrap();
        let after_twice = store.all_entries().await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.entry_id, second.entry_id);
        assert_eq!(after_once, after_twice);
    }

    #[actix_web::test]
    async fn concurrent_marks_of_one_key_create_once() {
        let (reconciler, store) = reconciler_with(&["Alice"]).await;

        let marks = (0..32).map(|i| {
            let reconciler = reconciler.clone();
            let status = if i % 2 == 0 {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            actix_web::rt::spawn(async move { reconciler.mark_or_update(1, day(4), status).await })
        });
        let outcomes: Vec<MarkOutcome> = futures::future::join_all(marks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
        assert!(outcomes.iter().all(|o| o.entry_id == outcomes[0].entry_id));
        assert_eq!(store.all_entries().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn different_days_get_separate_entries() {
        let (reconciler, store) = reconciler_with(&["Alice"]).await;

        reconciler.mark_or_update(1, day(4), AttendanceStatus::Present).await.unwrap();
        reconciler.mark_or_update(1, day(5), AttendanceStatus::Leave).await.unwrap();

        assert_eq!(store.all_entries().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let (reconciler, store) = reconciler_with(&[]).await;

        let err = reconciler
            .mark_or_update(9, day(4), AttendanceStatus::Present)
            .await
            .unwrap_err();

        assert_eq!(err, AppError::NotFound("employee 9".into()));
        assert!(store.all_entries().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn mark_many_dedups_and_stops_on_missing_employee() {
        let (reconciler, store) = reconciler_with(&["Alice", "Bob"]).await;

        let outcomes = reconciler
            .mark_many(&[2, 1, 2], day(6), AttendanceStatus::Present)
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);

        let err = reconciler
            .mark_many(&[1, 3], day(7), AttendanceStatus::Absent)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // employee 1 sorts before the missing 3 and was already written
        assert_eq!(store.entries_in_range(day(7), day(7)).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn remove_missing_entry_is_not_found() {
        let (reconciler, _store) = reconciler_with(&["Alice"]).await;
        let outcome = reconciler
            .mark_or_update(1, day(4), AttendanceStatus::Present)
            .await
            .unwrap();

        reconciler.remove(outcome.entry_id).await.unwrap();
        assert!(matches!(
            reconciler.remove(outcome.entry_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    // Reports every employee as present in the directory, like a reader that
    // checked just before a concurrent delete.
    struct StaleDirectory(MemoryStore);

    #[async_trait::async_trait]
    impl EmployeeDirectory for StaleDirectory {
        async fn list_employees(&self) -> AppResult<Vec<Employee>> {
            self.0.list_employees().await
        }

        async fn get_employee(&self, id: u64) -> AppResult<Option<Employee>> {
            Ok(Some(Employee {
                id,
                name: "Gone".into(),
                job_title: "Clerk".into(),
                email: None,
                phone: None,
                address: None,
                created_at: chrono::Utc::now(),
            }))
        }

        async fn insert_employee(&self, employee: NewEmployee) -> AppResult<Employee> {
            self.0.insert_employee(employee).await
        }

        async fn update_employee(&self, id: u64, update: EmployeeUpdate) -> AppResult<Option<Employee>> {
            self.0.update_employee(id, update).await
        }

        async fn delete_employee(&self, id: u64) -> AppResult<bool> {
            self.0.delete_employee(id).await
        }
    }

    #[async_trait::async_trait]
    impl AttendanceRecordStore for StaleDirectory {
        async fn entries_in_range(&self, first: NaiveDate, last: NaiveDate) -> AppResult<Vec<AttendanceEntry>> {
            self.0.entries_in_range(first, last).await
        }

        async fn all_entries(&self) -> AppResult<Vec<AttendanceEntry>> {
            self.0.all_entries().await
        }

        async fn entry_for(&self, employee_id: u64, day: NaiveDate) -> AppResult<Option<AttendanceEntry>> {
            self.0.entry_for(employee_id, day).await
        }

        async fn upsert_entry(
            &self,
            employee_id: u64,
            day: NaiveDate,
            status: AttendanceStatus,
        ) -> AppResult<UpsertOutcome> {
            self.0.upsert_entry(employee_id, day, status).await
        }

        async fn delete_entry(&self, id: u64) -> AppResult<bool> {
            self.0.delete_entry(id).await
        }
    }

    #[actix_web::test]
    async fn employee_deleted_mid_mark_is_not_found() {
        let reconciler = AttendanceReconciler::new(Arc::new(StaleDirectory(MemoryStore::new())));

        let err = reconciler
            .mark_or_update(5, day(4), AttendanceStatus::Present)
            .await
            .unwrap_err();

        assert_eq!(err, AppError::NotFound("employee 5".into()));
    }
}

use crate::{
    api::{PeriodQuery, parse_day},
    error::{AppError, AppResult},
    model::{
        attendance::{AttendanceEntry, AttendanceStatus},
        employee::Employee,
        period::Period,
    },
    service::{
        aggregator::{self, AggregateSummary, EmployeeWithStatus},
        period_filter::PeriodWindow,
        reconciler::MarkOutcome,
    },
    state::AppState,
    store::{AttendanceRecordStore, EmployeeDirectory},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,
    /// Defaults to today in the reporting zone
    #[schema(example = "2024-02-15", format = "date")]
    pub date: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkMarkAttendance {
    /// Employees to mark; every employee when omitted
    #[schema(example = json!([1, 2, 3]))]
    pub employee_ids: Option<Vec<u64>>,
    #[schema(example = "2024-02-15", format = "date")]
    pub date: Option<String>,
    pub status: AttendanceStatus,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub window: PeriodWindow,
    pub data: Vec<AttendanceEntry>,
    pub summary: AggregateSummary,
}

#[derive(Serialize, ToSchema)]
pub struct TodayResponse {
    #[schema(example = "2024-02-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub summary: AggregateSummary,
    pub employees: Vec<EmployeeWithStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeHistoryResponse {
    pub employee: Employee,
    pub window: PeriodWindow,
    pub summary: AggregateSummary,
    pub entries: Vec<AttendanceEntry>,
}

fn day_or_today(state: &AppState, date: Option<&str>) -> AppResult<NaiveDate> {
    match date {
        Some(date) => parse_day(date),
        None => Ok(state.zone.today(Utc::now())),
    }
}

/// Mark or update attendance
///
/// Creates the entry for the employee and day, or overwrites its status when one exists.
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = MarkOutcome),
        (status = 400, description = "Malformed date or status"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "employee 9 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    state: web::Data<AppState>,
    payload: web::Json<MarkAttendance>,
) -> AppResult<HttpResponse> {
    let day = day_or_today(&state, payload.date.as_deref())?;

    let outcome = state
        .reconciler
        .mark_or_update(payload.employee_id, day, payload.status)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Mark many employees at once
#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    request_body = BulkMarkAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = [MarkOutcome]),
        (status = 404, description = "One of the employees does not exist")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn bulk_mark_attendance(
    state: web::Data<AppState>,
    payload: web::Json<BulkMarkAttendance>,
) -> AppResult<HttpResponse> {
    let day = day_or_today(&state, payload.date.as_deref())?;

    let employee_ids = match &payload.employee_ids {
        Some(ids) => ids.clone(),
        None => state
            .store
            .list_employees()
            .await?
            .into_iter()
            .map(|employee| employee.id)
            .collect(),
    };

    let outcomes = state
        .reconciler
        .mark_many(&employee_ids, day, payload.status)
        .await?;

    Ok(HttpResponse::Ok().json(outcomes))
}

/// Attendance entries in a period
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Entries in the window, day first", body = AttendanceListResponse),
        (status = 400, description = "Unknown period or malformed date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    state: web::Data<AppState>,
    query: web::Query<PeriodQuery>,
) -> AppResult<HttpResponse> {
    let window = query.window_or(&state.zone, Period::Day)?;

    let entries = state
        .store
        .entries_in_range(window.first_day, window.last_day)
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        summary: aggregator::status_distribution(&entries),
        window,
        data: entries,
    }))
}

/// Today's roster with each employee's status
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Every employee with today's status", body = TodayResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_attendance(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let today = state.zone.today(Utc::now());

    let employees = state.store.list_employees().await?;
    let entries = state.store.entries_in_range(today, today).await?;
    let rows = aggregator::join_today_status(&employees, &entries);

    Ok(HttpResponse::Ok().json(TodayResponse {
        date: today,
        summary: aggregator::roster_distribution(&rows),
        employees: rows,
    }))
}

/// One employee's history in a period
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "Entries and summary", body = EmployeeHistoryResponse),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_history(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let window = query.window_or(&state.zone, Period::Month)?;

    let employee = state
        .store
        .get_employee(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))?;

    let entries: Vec<AttendanceEntry> = state
        .store
        .entries_in_range(window.first_day, window.last_day)
        .await?
        .into_iter()
        .filter(|entry| entry.employee_id == employee_id)
        .collect();

    Ok(HttpResponse::Ok().json(EmployeeHistoryResponse {
        employee,
        window,
        summary: aggregator::status_distribution(&entries),
        entries,
    }))
}

/// Entry for one employee on one day
#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}/{date}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        ("date", Path, description = "Day as YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Entry found", body = AttendanceEntry),
        (status = 400, description = "Malformed date"),
        (status = 404, description = "No entry for that day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn entry_for_day(
    state: web::Data<AppState>,
    path: web::Path<(u64, String)>,
) -> AppResult<HttpResponse> {
    let (employee_id, date) = path.into_inner();
    let day = parse_day(&date)?;

    match state.store.entry_for(employee_id, day).await? {
        Some(entry) => Ok(HttpResponse::Ok().json(entry)),
        None => Err(AppError::NotFound(format!(
            "attendance for employee {employee_id} on {day}"
        ))),
    }
}

/// Remove an attendance entry
#[utoipa::path(
    delete,
    path = "/api/attendance/{entry_id}",
    params(
        ("entry_id", Path, description = "Attendance entry ID")
    ),
    responses(
        (status = 200, description = "Entry removed", body = Object, example = json!({
            "message": "Attendance entry removed"
        })),
        (status = 404, description = "Entry not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let entry_id = path.into_inner();
    state.reconciler.remove(entry_id).await?;

    info!(entry_id, "Attendance entry deleted via API");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance entry removed"
    })))
}

use std::collections::HashMap;

use crate::{
    api::PeriodQuery,
    error::{AppError, AppResult},
    model::period::Period,
    service::{
        aggregator::{
            self, AggregateSummary, DEFAULT_TOP_PERFORMERS, EmployeeBreakdown, PerformerRank,
            WeekdayTrend,
        },
        exporter::{self, ExportKind},
        period_filter::PeriodWindow,
    },
    state::AppState,
    store::{AttendanceRecordStore, EmployeeDirectory},
};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// day, week or month; defaults to month
    #[param(example = "month")]
    pub period: Option<String>,
    #[param(example = "2024-02-15")]
    pub date: Option<String>,
    /// How many top performers to return
    #[param(example = 5)]
    pub top: Option<usize>,
    /// Include per-employee counts
    pub breakdown: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct RankedPerformer {
    #[serde(flatten)]
    pub rank: PerformerRank,
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub window: PeriodWindow,
    pub distribution: AggregateSummary,
    pub weekly_trend: Vec<WeekdayTrend>,
    pub top_performers: Vec<RankedPerformer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<EmployeeBreakdown>>,
}

#[derive(Serialize, ToSchema)]
pub struct ExportResponse {
    #[schema(example = "Export written")]
    pub message: String,
    #[schema(example = "summary_20240215_093000.csv")]
    pub file_name: String,
    #[schema(example = "exports/summary_20240215_093000.csv")]
    pub location: String,
}

/// Dashboard for a period
///
/// Status distribution, present share per weekday and the best attendance rates.
#[utoipa::path(
    get,
    path = "/api/report/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Aggregated view of the window", body = DashboardResponse),
        (status = 400, description = "Unknown period or malformed date")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let window = PeriodQuery {
        period: query.period,
        date: query.date,
    }
    .window_or(&state.zone, Period::Month)?;

    let employees = state.store.list_employees().await?;
    let entries = state
        .store
        .entries_in_range(window.first_day, window.last_day)
        .await?;

    let names: HashMap<u64, String> = exporter::employee_index(&employees);
    let top_performers = aggregator::top_performers(&entries, query.top.unwrap_or(DEFAULT_TOP_PERFORMERS))
        .into_iter()
        .map(|rank| RankedPerformer {
            name: names
                .get(&rank.employee_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            rank,
        })
        .collect();

    let breakdown = query
        .breakdown
        .unwrap_or(false)
        .then(|| aggregator::employee_breakdown(&employees, &entries));

    Ok(HttpResponse::Ok().json(DashboardResponse {
        distribution: aggregator::status_distribution(&entries),
        weekly_trend: aggregator::weekly_trend(&entries),
        window,
        top_performers,
        breakdown,
    }))
}

/// Export a report or backup
///
/// `employees`, `attendance` and `summary` are CSV; `backup` is the versioned JSON snapshot
/// of every employee and entry. Without `period` or `date` the attendance-based reports cover
/// the full history; a `date` alone selects its month.
#[utoipa::path(
    post,
    path = "/api/report/export/{kind}",
    params(
        ("kind", Path, description = "employees, attendance, summary or backup"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "Export written", body = ExportResponse),
        (status = 400, description = "Unknown kind, period or date"),
        (status = 500, description = "Export destination failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn export_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PeriodQuery>,
) -> AppResult<HttpResponse> {
    let requested = path.into_inner();
    let kind: ExportKind = requested
        .parse()
        .map_err(|_| AppError::InvalidArgument(format!("unknown export kind '{requested}'")))?;

    // a bare `date` selects the month around it
    let window = match (&query.period, &query.date) {
        (None, None) => None,
        _ => Some(query.window_or(&state.zone, Period::Month)?),
    };

    let employees = state.store.list_employees().await?;
    let entries = match (kind, window) {
        (ExportKind::Employees, _) => Vec::new(),
        (ExportKind::Backup, _) | (_, None) => state.store.all_entries().await?,
        (_, Some(window)) => {
            state
                .store
                .entries_in_range(window.first_day, window.last_day)
                .await?
        }
    };

    let rendered = exporter::render(kind, &employees, &entries, Utc::now())?;
    let file_name = rendered.file_name.clone();

    let sink = state.sink.clone();
    let location = web::block(move || exporter::export(sink.as_ref(), &rendered)).await??;

    info!(%kind, %file_name, entries = entries.len(), "Report exported");
    Ok(HttpResponse::Ok().json(ExportResponse {
        message: "Export written".to_string(),
        file_name,
        location,
    }))
}

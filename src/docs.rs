use crate::api::attendance::{
    AttendanceListResponse, BulkMarkAttendance, EmployeeHistoryResponse, MarkAttendance,
    TodayResponse,
};
use crate::api::employee::EmployeeListResponse;
use crate::api::report::{DashboardResponse, ExportResponse, RankedPerformer};
use crate::auth::session::AdminSession;
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeUpdate, NewEmployee};
use crate::model::period::Period;
use crate::models::{LoginReqDto, LoginResponse};
use crate::service::aggregator::{
    AggregateSummary, EmployeeBreakdown, EmployeeWithStatus, PerformerRank, WeekdayTrend,
};
use crate::service::exporter::ExportKind;
use crate::service::period_filter::PeriodWindow;
use crate::service::reconciler::MarkOutcome;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Single-administrator service for recording daily attendance and reporting on it.

### Key Features
- **Employees**: create, update, list, search and remove employee records
- **Attendance**: one status per employee per day (Present, Absent, Leave); re-marking a day overwrites it
- **History**: day, week (Monday to Sunday) and calendar-month windows
- **Reports**: status distribution, weekly trend, top performers, CSV exports and a JSON backup

### Security
Everything under the API prefix requires a **JWT Bearer** token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::current_session,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::bulk_mark_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::today_attendance,
        crate::api::attendance::employee_history,
        crate::api::attendance::entry_for_day,
        crate::api::attendance::delete_attendance,

        crate::api::report::dashboard,
        crate::api::report::export_report
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            AdminSession,
            Employee,
            NewEmployee,
            EmployeeUpdate,
            EmployeeListResponse,
            AttendanceStatus,
            AttendanceEntry,
            Period,
            PeriodWindow,
            MarkAttendance,
            BulkMarkAttendance,
            MarkOutcome,
            AttendanceListResponse,
            TodayResponse,
            EmployeeHistoryResponse,
            EmployeeWithStatus,
            AggregateSummary,
            WeekdayTrend,
            PerformerRank,
            RankedPerformer,
            EmployeeBreakdown,
            DashboardResponse,
            ExportKind,
            ExportResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Admin login and session"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance marking and history APIs"),
        (name = "Report", description = "Dashboard and export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/login",
            "/api/employee/{employee_id}",
            "/api/attendance",
            "/api/attendance/today",
            "/api/report/export/{kind}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

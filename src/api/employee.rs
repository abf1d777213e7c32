use crate::{
    error::{AppError, AppResult},
    model::employee::{Employee, EmployeeUpdate, NewEmployee},
    state::AppState,
    store::EmployeeDirectory,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Case-insensitive match on name, job title or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 2)]
    pub total: usize,
}

fn matches_search(employee: &Employee, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    employee.name.to_lowercase().contains(&needle)
        || employee.job_title.to_lowercase().contains(&needle)
        || employee
            .email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().contains(&needle))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Name or job title missing", body = Object, example = json!({
            "message": "invalid argument: name must not be empty"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    state: web::Data<AppState>,
    payload: web::Json<NewEmployee>,
) -> AppResult<HttpResponse> {
    let draft = payload
        .into_inner()
        .normalized()
        .map_err(AppError::InvalidArgument)?;

    let employee = state.store.insert_employee(draft).await?;
    info!(employee_id = employee.id, "Employee created");

    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee list", body = EmployeeListResponse)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    state: web::Data<AppState>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<HttpResponse> {
    let mut employees = state.store.list_employees().await?;

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        employees.retain(|employee| matches_search(employee, search));
        debug!(search, matched = employees.len(), "Filtered employees");
    }

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: employees.len(),
        data: employees,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "employee 7 not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();

    match state.store.get_employee(employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::NotFound(format!("employee {employee_id}"))),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "No fields or blank required field"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    state: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Json<EmployeeUpdate>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();

    let update = body
        .into_inner()
        .normalized()
        .map_err(AppError::InvalidArgument)?;
    if update.is_empty() {
        return Err(AppError::InvalidArgument("No fields provided for update".into()));
    }

    match state.store.update_employee(employee_id, update).await? {
        Some(employee) => {
            info!(employee_id, "Employee updated");
            Ok(HttpResponse::Ok().json(employee))
        }
        None => Err(AppError::NotFound(format!("employee {employee_id}"))),
    }
}

/// Delete Employee together with their attendance history
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();

    if !state.store.delete_employee(employee_id).await? {
        return Err(AppError::NotFound(format!("employee {employee_id}")));
    }

    info!(employee_id, "Employee deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

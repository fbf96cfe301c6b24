use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use tradeerp_hr::{
    Employee, EmployeeId, EmployeeSalaryHistory, EmployeeSalaryHistoryId, SearchEmployeeRequest,
    StoreEmployeeRequest, TerminateEmployeeRequest, UpdateEmployeeRequest, UpdateEmployeeSalaryRequest,
};
use tradeerp_infra::Repository;
use tradeerp_notifications::{EmployeeSalaryUpdated, EmployeeTerminated, Recipient, SalaryChanged};

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find_live, ok, query_body, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(store_employee).get(search_employees))
        .route("/:id", get(show_employee).patch(update_employee))
        .route("/:id/salary", post(update_salary).get(salary_history))
        .route("/:id/terminate", post(terminate_employee))
}

fn employees(services: &AppServices) -> Repository<Employee> {
    services.repo("employees")
}

fn recipient(employee: &Employee) -> Recipient {
    Recipient::new("employees", employee.id.get(), employee.full_name()).with_email(employee.email.clone())
}

pub async fn store_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreEmployeeRequest, body).await?;
    let employee = employees(&services).create(tenant.tenant_id(), |id| Employee::create(EmployeeId(id), new, Utc::now()))?;
    tracing::info!(employee_id = %employee.id, number = %employee.employee_number, "employee hired");
    Ok(created(employee))
}

pub async fn search_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let search = validated(&services, &tenant, &principal, &SearchEmployeeRequest, query_body(params)).await?;
    Ok(ok(search.run(employees(&services).all(tenant.tenant_id())?)))
}

pub async fn show_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "employees.view")?;
    let employee = find_live(&employees(&services), &tenant, id)?;
    Ok(ok(json!({ "employee": employee, "full_name": employee.full_name() })))
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = employees(&services);
    let mut employee = find_live(&repo, &tenant, id)?;
    let request = UpdateEmployeeRequest { employee: employee.clone() };
    let changes = validated(&services, &tenant, &principal, &request, body).await?;
    if let Some(change) = employee.apply(changes, Utc::now())? {
        tracing::info!(employee_id = id, from = %change.from, to = %change.to, "employee status changed");
    }
    repo.save(tenant.tenant_id(), id, &employee)?;
    Ok(ok(employee))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), employee_id = id))]
pub async fn update_salary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let tenant_id = tenant.tenant_id();
    let repo = employees(&services);
    let mut employee = find_live(&repo, &tenant, id)?;
    let request = UpdateEmployeeSalaryRequest { employee: employee.clone() };
    let change = validated(&services, &tenant, &principal, &request, body).await?;

    let histories = services.repo::<EmployeeSalaryHistory>("employee_salary_histories");
    let history_id = histories.next_id(tenant_id)?;
    let history = employee.change_salary(EmployeeSalaryHistoryId(history_id), change, principal.user_id(), Utc::now())?;
    repo.save(tenant_id, id, &employee)?;
    histories.save(tenant_id, history_id, &history)?;

    services.broadcast(tenant_id, &EmployeeSalaryUpdated::from_history(&history));
    services
        .notify(&SalaryChanged::new(employee.clone(), history.clone()), &recipient(&employee))
        .await;
    Ok(ok(json!({ "employee": employee, "history": history })))
}

pub async fn salary_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "employees.view")?;
    let employee = find_live(&employees(&services), &tenant, id)?;
    let mut items: Vec<EmployeeSalaryHistory> = services
        .repo::<EmployeeSalaryHistory>("employee_salary_histories")
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|h| h.employee_id == employee.id)
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(ok(json!({ "items": items })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), employee_id = id))]
pub async fn terminate_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = employees(&services);
    let mut employee = find_live(&repo, &tenant, id)?;
    let request = TerminateEmployeeRequest { employee: employee.clone() };
    let termination = validated(&services, &tenant, &principal, &request, body).await?;

    employee.terminate(termination, Utc::now())?;
    repo.save(tenant.tenant_id(), id, &employee)?;
    tracing::info!(termination_type = ?employee.termination_type, "employee terminated");

    services
        .notify(&EmployeeTerminated::new(employee.clone()), &recipient(&employee))
        .await;
    Ok(ok(employee))
}

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use tradeerp_core::SoftDeletes;
use tradeerp_infra::Repository;
use tradeerp_validation::{process, FormRequest};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Run a form request against the caller and the tenant's rows.
pub async fn validated<R: FormRequest>(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    request: &R,
    body: Value,
) -> Result<R::Output, ApiError> {
    let verifier = services.verifier(tenant.tenant_id());
    Ok(process(request, principal.principal(), body, &verifier).await?)
}

/// Query string as a request body; the rule engine casts numeric strings.
pub fn query_body(params: HashMap<String, String>) -> Value {
    Value::Object(params.into_iter().map(|(k, v)| (k, Value::String(v))).collect::<Map<_, _>>())
}

pub fn find<T>(repo: &Repository<T>, tenant: &TenantContext, id: i64) -> Result<T, ApiError>
where
    T: Serialize + DeserializeOwned,
{
    repo.find(tenant.tenant_id(), id)?
        .ok_or_else(|| ApiError::not_found(format!("{} {id}", repo.table())))
}

/// Like [`find`], treating soft-deleted rows as missing.
pub fn find_live<T>(repo: &Repository<T>, tenant: &TenantContext, id: i64) -> Result<T, ApiError>
where
    T: Serialize + DeserializeOwned + SoftDeletes,
{
    let record = find(repo, tenant, id)?;
    if record.is_trashed() {
        return Err(ApiError::not_found(format!("{} {id}", repo.table())));
    }
    Ok(record)
}

/// Rows of `repo` that are not soft-deleted.
pub fn live<T>(repo: &Repository<T>, tenant: &TenantContext) -> Result<Vec<T>, ApiError>
where
    T: Serialize + DeserializeOwned + SoftDeletes,
{
    Ok(repo
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|r| !r.is_trashed())
        .collect())
}

/// Ids for `n` child rows, reserved up front so builders need not fail.
pub fn reserve_ids<T>(repo: &Repository<T>, tenant: &TenantContext, n: usize) -> Result<Vec<i64>, ApiError>
where
    T: Serialize + DeserializeOwned,
{
    (0..n)
        .map(|_| repo.next_id(tenant.tenant_id()).map_err(ApiError::from))
        .collect()
}

pub fn created(body: impl Serialize) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn ok(body: impl Serialize) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_values_stay_strings() {
        let body = query_body(HashMap::from([("per_page".to_string(), "5".to_string())]));
        assert_eq!(body, serde_json::json!({"per_page": "5"}));
    }
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use tradeerp_core::{StatusChange, TenantId};
use tradeerp_infra::Repository;
use tradeerp_notifications::{
    CertificationExpired, CertificationExpiringSoon, CertificationIssued, CertificationRevoked,
    CertificationUpdated, InsuranceExpiring, InsuranceVerified, Recipient,
};
use tradeerp_providers::{
    BulkProviderRequest, CertificationStatus, CertificationStatusUpdate, InsuranceStatus, Provider,
    ProviderCertification, ProviderCertificationId, ProviderId, ProviderInsurance, ProviderInsuranceId,
    ProviderLocation, ProviderLocationId, ProviderPerformance, ProviderPerformanceId, ProviderStatusChange,
    StoreProviderCertificationRequest, StoreProviderInsuranceRequest, StoreProviderLocationRequest,
    StoreProviderPerformanceRequest, StoreProviderRequest, ToggleProviderStatusRequest,
    UpdateCertificationStatusRequest, UpdateProviderRequest, VerifyProviderInsuranceRequest,
};

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find_live, live, ok, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

/// Look-ahead window of the compliance scan.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

pub fn router() -> Router {
    Router::new()
        .route("/", post(store_provider).get(list_providers))
        .route("/bulk", post(bulk_providers))
        .route("/compliance/scan", post(compliance_scan))
        .route("/:id", get(show_provider).patch(update_provider).delete(destroy_provider))
        .route("/:id/status", post(toggle_provider_status))
        .route("/:id/insurances", post(store_insurance).get(list_insurances))
        .route("/:id/insurances/:insurance_id/verify", post(verify_insurance))
        .route("/:id/certifications", post(store_certification).get(list_certifications))
        .route("/:id/certifications/:certification_id/status", post(update_certification_status))
        .route("/:id/performances", post(store_performance).get(list_performances))
        .route("/:id/locations", post(store_location).get(list_locations))
}

fn providers(services: &AppServices) -> Repository<Provider> {
    services.repo("providers")
}

fn insurances(services: &AppServices) -> Repository<ProviderInsurance> {
    services.repo("provider_insurances")
}

fn certifications(services: &AppServices) -> Repository<ProviderCertification> {
    services.repo("provider_certifications")
}

fn recipient(provider: &Provider) -> Recipient {
    Recipient::new("providers", provider.id.get(), provider.name.clone()).with_email(provider.email.clone())
}

fn owned_by<T>(rows: Vec<T>, provider_id: ProviderId, of: impl Fn(&T) -> ProviderId) -> Vec<T> {
    rows.into_iter().filter(|r| of(r) == provider_id).collect()
}

/// A child row of `provider`, 404 when it belongs to someone else.
fn child_of<T>(
    repo: &Repository<T>,
    tenant: &TenantContext,
    provider: &Provider,
    id: i64,
    of: impl Fn(&T) -> ProviderId,
) -> Result<T, ApiError>
where
    T: serde::Serialize + serde::de::DeserializeOwned + tradeerp_core::SoftDeletes,
{
    let row = find_live(repo, tenant, id)?;
    if of(&row) != provider.id {
        return Err(ApiError::not_found(format!("{} {id}", repo.table())));
    }
    Ok(row)
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn store_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreProviderRequest, body).await?;
    let provider = providers(&services).create(tenant.tenant_id(), |id| Provider::create(ProviderId(id), new, Utc::now()))?;
    tracing::info!(provider_id = %provider.id, kind = %provider.provider_type, "provider registered");
    Ok(created(provider))
}

pub async fn list_providers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let items = live(&providers(&services), &tenant)?;
    Ok(ok(json!({ "items": items })))
}

pub async fn show_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let provider = find_live(&providers(&services), &tenant, id)?;
    Ok(ok(provider))
}

pub async fn update_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = providers(&services);
    let mut provider = find_live(&repo, &tenant, id)?;
    let request = UpdateProviderRequest { provider: provider.clone() };
    let changes = validated(&services, &tenant, &principal, &request, body).await?;
    provider.apply(changes, Utc::now());
    repo.save(tenant.tenant_id(), id, &provider)?;
    Ok(ok(provider))
}

pub async fn destroy_provider(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.delete")?;
    let repo = providers(&services);
    let mut provider = find_live(&repo, &tenant, id)?;
    let now = Utc::now();
    provider.deleted_at = Some(now);
    provider.timestamps.touch(now);
    repo.save(tenant.tenant_id(), id, &provider)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn toggle_provider_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = providers(&services);
    let mut provider = find_live(&repo, &tenant, id)?;
    let request = ToggleProviderStatusRequest { provider: provider.clone() };
    let change = validated(&services, &tenant, &principal, &request, body).await?;
    let moved = provider.change_status(change, Utc::now())?;
    repo.save(tenant.tenant_id(), id, &provider)?;
    tracing::info!(provider_id = id, from = %moved.from, to = %moved.to, "provider status changed");
    Ok(ok(provider))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn bulk_providers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let op = validated(&services, &tenant, &principal, &BulkProviderRequest, body).await?;
    let repo = providers(&services);
    let now = Utc::now();
    let (mut affected, mut skipped) = (Vec::new(), Vec::new());

    for id in op.ids {
        let Some(mut provider) = repo.find(tenant.tenant_id(), id.get())?.filter(|p| p.deleted_at.is_none()) else {
            skipped.push(id);
            continue;
        };
        match op.action.target_status() {
            None => {
                provider.deleted_at = Some(now);
                provider.timestamps.touch(now);
            }
            Some(target) => {
                let change = ProviderStatusChange { status: target, reason: op.reason.clone() };
                if provider.status == target || provider.change_status(change, now).is_err() {
                    skipped.push(id);
                    continue;
                }
            }
        }
        repo.save(tenant.tenant_id(), id.get(), &provider)?;
        affected.push(id);
    }

    tracing::info!(action = %op.action, affected = affected.len(), skipped = skipped.len(), "bulk provider update");
    Ok(ok(json!({ "action": op.action, "affected": affected, "skipped": skipped })))
}

pub async fn store_insurance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let request = StoreProviderInsuranceRequest { provider: provider.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let insurance = insurances(&services).create(tenant.tenant_id(), |iid| {
        ProviderInsurance::create(ProviderInsuranceId(iid), provider.id, new, Utc::now())
    })?;
    Ok(created(insurance))
}

pub async fn list_insurances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let provider = find_live(&providers(&services), &tenant, id)?;
    let items = owned_by(live(&insurances(&services), &tenant)?, provider.id, |i| i.provider_id);
    Ok(ok(json!({ "items": items })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), insurance_id = insurance_id))]
pub async fn verify_insurance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, insurance_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let repo = insurances(&services);
    let mut insurance = child_of(&repo, &tenant, &provider, insurance_id, |i| i.provider_id)?;
    let request = VerifyProviderInsuranceRequest { insurance: insurance.clone() };
    let verification = validated(&services, &tenant, &principal, &request, body).await?;

    let moved = insurance.verify(verification, principal.user_id(), Utc::now())?;
    repo.save(tenant.tenant_id(), insurance_id, &insurance)?;
    tracing::info!(from = %moved.from, to = %moved.to, "insurance reviewed");

    if moved.to == InsuranceStatus::Active {
        services
            .notify(&InsuranceVerified::new(insurance.clone(), provider.name.clone()), &recipient(&provider))
            .await;
    }
    Ok(ok(insurance))
}

pub async fn store_certification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let request = StoreProviderCertificationRequest { provider: provider.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let certification = certifications(&services).create(tenant.tenant_id(), |cid| {
        ProviderCertification::create(ProviderCertificationId(cid), provider.id, new, Utc::now())
    })?;
    services
        .notify(&CertificationIssued::new(certification.clone(), provider.name.clone()), &recipient(&provider))
        .await;
    Ok(created(certification))
}

pub async fn list_certifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let provider = find_live(&providers(&services), &tenant, id)?;
    let today = Utc::now().date_naive();
    let items: Vec<_> = owned_by(live(&certifications(&services), &tenant)?, provider.id, |c| c.provider_id)
        .into_iter()
        .map(|c| {
            let next_renewal = c.next_renewal(today);
            json!({ "certification": c, "next_renewal": next_renewal })
        })
        .collect();
    Ok(ok(json!({ "items": items })))
}

/// Persist a certification status move, then broadcast and notify about it.
async fn record_certification_change(
    services: &AppServices,
    tenant_id: TenantId,
    provider: &Provider,
    certification: &ProviderCertification,
    change: StatusChange<CertificationStatus>,
) -> Result<(), ApiError> {
    let now = Utc::now();
    certifications(services).save(tenant_id, certification.id.get(), certification)?;
    tracing::info!(certification_id = %certification.id, from = %change.from, to = %change.to, "certification status changed");
    services.broadcast(tenant_id, &CertificationUpdated::new(certification.clone(), change, now));

    let to = recipient(provider);
    match change.to {
        CertificationStatus::Revoked => {
            services
                .notify(&CertificationRevoked::new(certification.clone(), provider.name.clone()), &to)
                .await;
        }
        CertificationStatus::Expired => {
            services
                .notify(&CertificationExpired::new(certification.clone(), provider.name.clone()), &to)
                .await;
        }
        _ => {}
    }
    Ok(())
}

pub async fn update_certification_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, certification_id)): Path<(i64, i64)>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let mut certification = child_of(&certifications(&services), &tenant, &provider, certification_id, |c| c.provider_id)?;
    let request = UpdateCertificationStatusRequest { certification: certification.clone() };
    let update = validated(&services, &tenant, &principal, &request, body).await?;

    let change = certification.update_status(update, Utc::now())?;
    record_certification_change(&services, tenant.tenant_id(), &provider, &certification, change).await?;
    Ok(ok(certification))
}

pub async fn store_performance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let request = StoreProviderPerformanceRequest { provider: provider.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let performance = services
        .repo::<ProviderPerformance>("provider_performances")
        .create(tenant.tenant_id(), |pid| {
            ProviderPerformance::create(ProviderPerformanceId(pid), provider.id, new, principal.user_id(), Utc::now())
        })?;
    Ok(created(performance))
}

pub async fn list_performances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let provider = find_live(&providers(&services), &tenant, id)?;
    let rows = services.repo::<ProviderPerformance>("provider_performances").all(tenant.tenant_id())?;
    let items: Vec<_> = owned_by(rows, provider.id, |p| p.provider_id)
        .into_iter()
        .map(|p| {
            let on_time_rate = p.on_time_rate();
            json!({ "performance": p, "on_time_rate": on_time_rate })
        })
        .collect();
    Ok(ok(json!({ "items": items })))
}

pub async fn store_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let provider = find_live(&providers(&services), &tenant, id)?;
    let request = StoreProviderLocationRequest { provider: provider.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let locations = services.repo::<ProviderLocation>("provider_locations");
    let location = locations.create(tenant.tenant_id(), |lid| {
        ProviderLocation::create(ProviderLocationId(lid), provider.id, new, Utc::now())
    })?;
    if location.is_primary {
        for mut other in owned_by(locations.all(tenant.tenant_id())?, provider.id, |l| l.provider_id)
            .into_iter()
            .filter(|l| l.id != location.id && l.is_primary)
        {
            other.is_primary = false;
            locations.save(tenant.tenant_id(), other.id.get(), &other)?;
        }
    }
    Ok(created(location))
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.view")?;
    let provider = find_live(&providers(&services), &tenant, id)?;
    let rows = services.repo::<ProviderLocation>("provider_locations").all(tenant.tenant_id())?;
    Ok(ok(json!({ "items": owned_by(rows, provider.id, |l| l.provider_id) })))
}

/// Outcome of one compliance sweep.
#[derive(Debug, Default, serde::Serialize)]
pub struct ComplianceReport {
    pub certifications_expired: Vec<ProviderCertificationId>,
    pub certifications_expiring: Vec<ProviderCertificationId>,
    pub insurances_expired: Vec<ProviderInsuranceId>,
    pub insurances_expiring: Vec<ProviderInsuranceId>,
}

/// Expire lapsed certifications and policies, and warn about those close to lapsing.
pub async fn run_compliance_scan(
    services: &AppServices,
    tenant: &TenantContext,
    today: NaiveDate,
) -> Result<ComplianceReport, ApiError> {
    let tenant_id = tenant.tenant_id();
    let mut report = ComplianceReport::default();
    let owners = live(&providers(services), tenant)?;
    let owner = |id: ProviderId| owners.iter().find(|p| p.id == id);

    for mut certification in live(&certifications(services), tenant)? {
        let Some(provider) = owner(certification.provider_id) else { continue };
        if certification.status != CertificationStatus::Active {
            continue;
        }
        if certification.is_expired_on(today) {
            let update = CertificationStatusUpdate {
                status: CertificationStatus::Expired,
                reason: Some(format!("Expired on {}", certification.expiry_date.unwrap_or(today))),
            };
            let change = certification.update_status(update, Utc::now())?;
            record_certification_change(services, tenant_id, provider, &certification, change).await?;
            report.certifications_expired.push(certification.id);
        } else if certification
            .expiry_date
            .is_some_and(|d| (d - today).num_days() <= EXPIRY_WARNING_DAYS)
        {
            if let Some(warning) = CertificationExpiringSoon::new(certification.clone(), provider.name.clone(), today) {
                services.notify(&warning, &recipient(provider)).await;
                report.certifications_expiring.push(certification.id);
            }
        }
    }

    let repo = insurances(services);
    for mut insurance in live(&repo, tenant)? {
        let Some(provider) = owner(insurance.provider_id) else { continue };
        if insurance.status == InsuranceStatus::Active && insurance.days_until_expiry(today) < 0 {
            let moved = StatusChange::checked(insurance.status, InsuranceStatus::Expired)?;
            insurance.status = moved.to;
            insurance.timestamps.touch(Utc::now());
            repo.save(tenant_id, insurance.id.get(), &insurance)?;
            report.insurances_expired.push(insurance.id);
        } else if insurance.expires_within(today, EXPIRY_WARNING_DAYS) {
            let warning = InsuranceExpiring::new(insurance.clone(), provider.name.clone(), today);
            services.notify(&warning, &recipient(provider)).await;
            report.insurances_expiring.push(insurance.id);
        }
    }

    tracing::info!(
        %tenant_id,
        certifications_expired = report.certifications_expired.len(),
        certifications_expiring = report.certifications_expiring.len(),
        insurances_expired = report.insurances_expired.len(),
        insurances_expiring = report.insurances_expiring.len(),
        "compliance scan finished"
    );
    Ok(report)
}

pub async fn compliance_scan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "providers.manage_certifications")?;
    let report = run_compliance_scan(&services, &tenant, Utc::now().date_naive()).await?;
    Ok(ok(report))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use tradeerp_events::EventBus;

    use super::*;
    use crate::app::routes::catalog::tests::context;

    async fn register(services: &Arc<AppServices>, tenant: TenantContext, principal: &PrincipalContext) {
        store_provider(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Json(json!({"name": "Acme Supply", "email": "ops@acme.test", "provider_type": "supplier"})),
        )
        .await
        .unwrap();
    }

    async fn certify(
        services: &Arc<AppServices>,
        tenant: TenantContext,
        principal: &PrincipalContext,
        number: &str,
        expiry: NaiveDate,
    ) -> ProviderCertification {
        let response = store_certification(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Path(1),
            Json(json!({
                "name": "ISO 9001", "issuing_authority": "ISO", "certification_number": number,
                "issued_date": "2024-01-15", "expiry_date": expiry.to_string(),
            })),
        )
        .await
        .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn revoking_broadcasts_and_notifies_the_provider() {
        let (services, tenant, principal) = context(&["providers.*"]);
        register(&services, tenant, &principal).await;
        certify(&services, tenant, &principal, "iso-1", Utc::now().date_naive() + Duration::days(365)).await;
        let feed = services.realtime().subscribe();

        let response = update_certification_status(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal),
            Path((1, 1)),
            Json(json!({"status": "revoked", "reason": "Audit failed"})),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(feed.try_recv().unwrap().tenant_id(), tenant.tenant_id());

        // Issued on create, revoked on update.
        let unread = services.notification_store().unread("providers", 1).await.unwrap();
        assert_eq!(unread.len(), 2);
    }

    #[tokio::test]
    async fn scan_expires_lapsed_and_warns_about_soon_to_lapse_certifications() {
        let (services, tenant, principal) = context(&["providers.*"]);
        register(&services, tenant, &principal).await;
        let today = Utc::now().date_naive();
        let lapsed = certify(&services, tenant, &principal, "iso-1", today - Duration::days(2)).await;
        let closing = certify(&services, tenant, &principal, "iso-2", today + Duration::days(10)).await;
        let distant = certify(&services, tenant, &principal, "iso-3", today + Duration::days(200)).await;

        let report = run_compliance_scan(&services, &tenant, today).await.unwrap();
        assert_eq!(report.certifications_expired, vec![lapsed.id]);
        assert_eq!(report.certifications_expiring, vec![closing.id]);

        let stored = certifications(&services).find(tenant.tenant_id(), lapsed.id.get()).unwrap().unwrap();
        assert_eq!(stored.status, CertificationStatus::Expired);
        let untouched = certifications(&services).find(tenant.tenant_id(), distant.id.get()).unwrap().unwrap();
        assert_eq!(untouched.status, CertificationStatus::Active);
    }

    #[tokio::test]
    async fn bulk_suspend_needs_a_reason_and_skips_disallowed_moves() {
        let (services, tenant, principal) = context(&["providers.*"]);
        register(&services, tenant, &principal).await;

        let err = bulk_providers(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Json(json!({"action": "suspend", "ids": [1]})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Pending providers cannot be suspended directly.
        let response = bulk_providers(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal),
            Json(json!({"action": "suspend", "ids": [1], "reason": "Late deliveries"})),
        )
        .await
        .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["affected"], json!([]));
        assert_eq!(body["skipped"], json!([1]));

        let stored = providers(&services).find(tenant.tenant_id(), 1).unwrap().unwrap();
        assert_eq!(stored.status, tradeerp_providers::ProviderStatus::Pending);
    }
}

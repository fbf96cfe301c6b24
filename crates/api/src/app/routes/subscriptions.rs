use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use tradeerp_auth::Permission;
use tradeerp_customers::{
    StoreUserSubscriptionRequest, UpdateUserSubscriptionRequest, UserSubscription, UserSubscriptionId,
};
use tradeerp_infra::Repository;
use tradeerp_notifications::SubscriptionStatusChanged;

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find, ok, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(store_subscription).get(list_subscriptions))
        .route("/:id", get(show_subscription).patch(update_subscription))
}

fn subscriptions(services: &AppServices) -> Repository<UserSubscription> {
    services.repo("user_subscriptions")
}

pub async fn store_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let request = StoreUserSubscriptionRequest::for_principal(principal.principal());
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let subscription = subscriptions(&services).create(tenant.tenant_id(), |id| {
        UserSubscription::create(UserSubscriptionId(id), new, Utc::now())
    })?;
    tracing::info!(subscription_id = %subscription.id, user_id = subscription.user_id, plan = %subscription.plan, "subscription created");
    Ok(created(subscription))
}

/// Everyone sees their own subscriptions; `subscriptions.view` sees all of them.
pub async fn list_subscriptions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let sees_all = principal.principal().can(&Permission::new("subscriptions.view"));
    let items: Vec<UserSubscription> = subscriptions(&services)
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|s| sees_all || principal.principal().owns(s.user_id))
        .collect();
    Ok(ok(json!({ "items": items })))
}

pub async fn show_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let subscription = find(&subscriptions(&services), &tenant, id)?;
    if !principal.principal().owns(subscription.user_id) {
        authz::require(&tenant, &principal, "subscriptions.view")?;
    }
    let next_billing_date = subscription.next_billing_date(Utc::now().date_naive());
    Ok(ok(json!({ "subscription": subscription, "next_billing_date": next_billing_date })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), subscription_id = id))]
pub async fn update_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = subscriptions(&services);
    let mut subscription = find(&repo, &tenant, id)?;
    let request = UpdateUserSubscriptionRequest { subscription: subscription.clone() };
    let changes = validated(&services, &tenant, &principal, &request, body).await?;

    let change = subscription.apply(changes, Utc::now())?;
    repo.save(tenant.tenant_id(), id, &subscription)?;

    if let Some(change) = change {
        tracing::info!(from = %change.from, to = %change.to, "subscription status changed");
        let recipient = services.user_recipient(tenant.tenant_id(), subscription.user_id)?;
        services
            .notify(&SubscriptionStatusChanged::new(subscription.clone(), change.from), &recipient)
            .await;
    }
    Ok(ok(subscription))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::Duration;
    use tradeerp_auth::Principal;

    use super::*;
    use crate::app::routes::catalog::tests::context;

    #[tokio::test]
    async fn cancelling_notifies_the_owner_in_app() {
        let (services, tenant, _) = context(&[]);
        services.provision_user(tenant.tenant_id(), 4, "Ana").unwrap();
        let owner = PrincipalContext::new(
            Principal::with_permissions(tenant.tenant_id(), [Permission::new("subscriptions.create")]).acting_as(4),
        );

        let starts = (Utc::now() + Duration::days(1)).date_naive().to_string();
        store_subscription(
            Extension(services.clone()),
            Extension(tenant),
            Extension(owner.clone()),
            Json(json!({"plan": "premium", "price": 49, "starts_at": starts})),
        )
        .await
        .unwrap();

        let response = update_subscription(
            Extension(services.clone()),
            Extension(tenant),
            Extension(owner),
            Path(1),
            Json(json!({"status": "cancelled", "cancellation_reason": "Moving on"})),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let unread = services.notification_store().unread("users", 4).await.unwrap();
        assert_eq!(unread.len(), 1);
    }

    #[tokio::test]
    async fn strangers_cannot_read_a_subscription() {
        let (services, tenant, _) = context(&[]);
        services.provision_user(tenant.tenant_id(), 4, "Ana").unwrap();
        let manager = PrincipalContext::new(Principal::with_permissions(
            tenant.tenant_id(),
            [Permission::new("subscriptions.*")],
        ));
        let starts = (Utc::now() + Duration::days(1)).date_naive().to_string();
        store_subscription(
            Extension(services.clone()),
            Extension(tenant),
            Extension(manager),
            Json(json!({"user_id": 4, "plan": "basic", "price": 9, "starts_at": starts})),
        )
        .await
        .unwrap();

        let stranger = PrincipalContext::new(Principal::with_permissions(tenant.tenant_id(), Vec::<Permission>::new()).acting_as(5));
        let err = show_subscription(Extension(services), Extension(tenant), Extension(stranger), Path(1))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}

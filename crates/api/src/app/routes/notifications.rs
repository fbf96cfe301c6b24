use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::app::errors::ApiError;
use crate::app::routes::common::ok;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(unread_notifications))
        .route("/:id/read", post(mark_as_read))
}

/// Unread in-app notifications of the calling user; service tokens have none.
pub async fn unread_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let items = match principal.user_id() {
        Some(user_id) => services.notification_store().unread("users", user_id).await?,
        None => Vec::new(),
    };
    let unread = items.len();
    Ok(ok(json!({ "items": items, "unread": unread })))
}

pub async fn mark_as_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let missing = || ApiError::not_found(format!("notification {id}"));
    let user_id = principal.user_id().ok_or_else(missing)?;
    let store = services.notification_store();

    let owned = store.unread("users", user_id).await?.iter().any(|n| n.id == id);
    if !owned || !store.mark_as_read(id, Utc::now()).await? {
        return Err(missing());
    }
    tracing::debug!(notification_id = %id, user_id, "notification read");
    Ok(ok(json!({ "id": id, "read": true })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::Json;
    use chrono::Duration;

    use tradeerp_auth::{Permission, Principal};

    use super::*;
    use crate::app::routes::catalog::tests::context;
    use crate::app::routes::subscriptions::{store_subscription, update_subscription};

    #[tokio::test]
    async fn users_read_only_their_own_notifications() {
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
            Json(json!({"plan": "basic", "price": 9, "starts_at": starts})),
        )
        .await
        .unwrap();
        update_subscription(
            Extension(services.clone()),
            Extension(tenant),
            Extension(owner.clone()),
            Path(1),
            Json(json!({"status": "cancelled", "cancellation_reason": "Too pricey"})),
        )
        .await
        .unwrap();

        let unread = services.notification_store().unread("users", 4).await.unwrap();
        let id = unread[0].id;

        let stranger = PrincipalContext::new(Principal::with_permissions(tenant.tenant_id(), Vec::<Permission>::new()).acting_as(5));
        let err = mark_as_read(Extension(services.clone()), Extension(stranger), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let response = mark_as_read(Extension(services.clone()), Extension(owner.clone()), Path(id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(services.notification_store().unread("users", 4).await.unwrap().is_empty());

        let again = mark_as_read(Extension(services), Extension(owner), Path(id)).await.unwrap_err();
        assert_eq!(again.into_response().status(), StatusCode::NOT_FOUND);
    }
}

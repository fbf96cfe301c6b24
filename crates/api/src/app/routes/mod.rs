use axum::{routing::get, Router};

pub mod catalog;
pub mod common;
pub mod customers;
pub mod employees;
pub mod notifications;
pub mod orders;
pub mod providers;
pub mod subscriptions;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/products", catalog::products_router())
        .nest("/catalog", catalog::taxonomy_router())
        .nest("/customers", customers::router())
        .nest("/segments", customers::segments_router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/orders", orders::router())
        .nest("/employees", employees::router())
        .nest("/providers", providers::router())
        .nest("/notifications", notifications::router())
}

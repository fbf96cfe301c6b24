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

use tradeerp_catalog::{Product, ProductVariant};
use tradeerp_core::TenantId;
use tradeerp_customers::Customer;
use tradeerp_infra::Repository;
use tradeerp_notifications::{OrderStatusChanged, OrderStatusUpdated, Recipient};
use tradeerp_orders::{
    Ledger, Order, OrderId, OrderItem, OrderItemId, OrderStatusHistory, OrderStatusHistoryId, SearchOrderRequest,
    Shipment, ShipmentId, ShipmentItem, ShipmentItemId, StoreOrderRequest, StoreShipmentRequest,
    StoreTransactionRequest, Transaction, TransactionId, UpdateOrderStatusRequest,
};

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find_live, ok, query_body, reserve_ids, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(search_orders))
        .route("/:id", get(show_order))
        .route("/:id/status", post(update_order_status))
        .route("/:id/shipments", post(store_shipment).get(list_shipments))
        .route("/:id/transactions", post(store_transaction).get(list_transactions))
}

fn orders(services: &AppServices) -> Repository<Order> {
    services.repo("orders")
}

fn children<T, K: PartialEq>(repo: &Repository<T>, tenant_id: TenantId, key: K, of: impl Fn(&T) -> K) -> Result<Vec<T>, ApiError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    Ok(repo.all(tenant_id)?.into_iter().filter(|row| of(row) == key).collect())
}

/// Who hears about an order: its customer when it has one, otherwise the placing user.
fn order_recipient(services: &AppServices, tenant_id: TenantId, order: &Order) -> Result<Option<Recipient>, ApiError> {
    if let Some(customer_id) = order.customer_id {
        let customer = services.repo::<Customer>("customers").find(tenant_id, customer_id.get())?;
        return Ok(customer.map(|c| {
            Recipient::new("customers", c.id.get(), c.display_name()).with_email(c.email.clone())
        }));
    }
    match order.user_id {
        Some(user_id) => Ok(Some(services.user_recipient(tenant_id, user_id)?)),
        None => Ok(None),
    }
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreOrderRequest, body).await?;
    let tenant_id = tenant.tenant_id();
    let catalog = services.repo::<Product>("products").all(tenant_id)?;
    let variants = services.repo::<ProductVariant>("product_variants").all(tenant_id)?;

    let repo = orders(&services);
    let items_repo = services.repo::<OrderItem>("order_items");
    let id = repo.next_id(tenant_id)?;
    let mut item_ids = reserve_ids(&items_repo, &tenant, new.items.len())?.into_iter();
    let (order, items) = Order::place(
        OrderId(id),
        principal.user_id(),
        new,
        &catalog,
        &variants,
        || OrderItemId(item_ids.next().unwrap_or_default()),
        Utc::now(),
    )?;

    repo.save(tenant_id, id, &order)?;
    for item in &items {
        items_repo.save(tenant_id, item.id.get(), item)?;
    }
    tracing::info!(order_number = %order.order_number, total = order.total, lines = items.len(), "order placed");
    Ok(created(json!({ "order": order, "items": items })))
}

pub async fn search_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let search = validated(&services, &tenant, &principal, &SearchOrderRequest, query_body(params)).await?;
    Ok(ok(search.run(orders(&services).all(tenant.tenant_id())?)))
}

pub async fn show_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "orders.view")?;
    let order = find_live(&orders(&services), &tenant, id)?;
    let tenant_id = tenant.tenant_id();
    let items = children(&services.repo::<OrderItem>("order_items"), tenant_id, order.id, |i| i.order_id)?;
    let history = children(
        &services.repo::<OrderStatusHistory>("order_status_histories"),
        tenant_id,
        order.id,
        |h| h.order_id,
    )?;
    Ok(ok(json!({ "order": order, "items": items, "status_history": history })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), order_id = id))]
pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = orders(&services);
    let tenant_id = tenant.tenant_id();
    let mut order = find_live(&repo, &tenant, id)?;
    let request = UpdateOrderStatusRequest { order: order.clone() };
    let update = validated(&services, &tenant, &principal, &request, body).await?;

    let now = Utc::now();
    let change = order.change_status(update.clone(), now)?;
    repo.save(tenant_id, id, &order)?;
    let history = services
        .repo::<OrderStatusHistory>("order_status_histories")
        .create(tenant_id, |hid| {
            OrderStatusHistory::record(OrderStatusHistoryId(hid), order.id, change, &update, principal.user_id(), now)
        })?;
    tracing::info!(from = %change.from, to = %change.to, "order status changed");

    services.broadcast(tenant_id, &OrderStatusUpdated::new(order.clone(), change, now));
    if update.notify_customer {
        if let Some(recipient) = order_recipient(&services, tenant_id, &order)? {
            services
                .notify(&OrderStatusChanged::new(order.clone(), history.clone()), &recipient)
                .await;
        }
    }
    Ok(ok(json!({ "order": order, "history": history })))
}

pub async fn store_shipment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let tenant_id = tenant.tenant_id();
    let order = find_live(&orders(&services), &tenant, id)?;
    let shipments_repo = services.repo::<Shipment>("shipments");
    let lines_repo = services.repo::<ShipmentItem>("shipment_items");

    let items = children(&services.repo::<OrderItem>("order_items"), tenant_id, order.id, |i| i.order_id)?;
    let earlier: Vec<ShipmentId> = children(&shipments_repo, tenant_id, order.id, |s| s.order_id)?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let shipped: Vec<ShipmentItem> = lines_repo
        .all(tenant_id)?
        .into_iter()
        .filter(|l| earlier.contains(&l.shipment_id))
        .collect();

    let request = StoreShipmentRequest { order: order.clone(), items, shipped };
    let new = validated(&services, &tenant, &principal, &request, body).await?;

    let shipment_id = shipments_repo.next_id(tenant_id)?;
    let mut line_ids = reserve_ids(&lines_repo, &tenant, new.items.len())?.into_iter();
    let (shipment, lines) = Shipment::create(
        ShipmentId(shipment_id),
        order.id,
        new,
        || ShipmentItemId(line_ids.next().unwrap_or_default()),
        Utc::now(),
    );
    shipments_repo.save(tenant_id, shipment_id, &shipment)?;
    for line in &lines {
        lines_repo.save(tenant_id, line.id.get(), line)?;
    }
    Ok(created(json!({ "shipment": shipment, "items": lines })))
}

pub async fn list_shipments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "orders.view")?;
    let order = find_live(&orders(&services), &tenant, id)?;
    let items = children(&services.repo::<Shipment>("shipments"), tenant.tenant_id(), order.id, |s| s.order_id)?;
    Ok(ok(json!({ "items": items })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), order_id = id))]
pub async fn store_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let tenant_id = tenant.tenant_id();
    let repo = orders(&services);
    let mut order = find_live(&repo, &tenant, id)?;
    let transactions_repo = services.repo::<Transaction>("transactions");
    let mut transactions = children(&transactions_repo, tenant_id, order.id, |t| t.order_id)?;

    let request = StoreTransactionRequest { order: order.clone(), transactions: transactions.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;

    let now = Utc::now();
    let transaction = transactions_repo.create(tenant_id, |tid| {
        Transaction::create(TransactionId(tid), order.id, new, now)
    })?;
    transactions.push(transaction.clone());

    let payment_status = Ledger::of(&transactions).payment_status(&order);
    if payment_status != order.payment_status {
        tracing::info!(from = %order.payment_status, to = %payment_status, "payment status changed");
        order.payment_status = payment_status;
        order.timestamps.touch(now);
        repo.save(tenant_id, id, &order)?;
    }
    Ok(created(json!({ "transaction": transaction, "payment_status": order.payment_status })))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "orders.view")?;
    let order = find_live(&orders(&services), &tenant, id)?;
    let items = children(&services.repo::<Transaction>("transactions"), tenant.tenant_id(), order.id, |t| t.order_id)?;
    let ledger = Ledger::of(&items);
    Ok(ok(json!({
        "items": items,
        "refundable": ledger.refundable(&order),
        "payment_status": ledger.payment_status(&order),
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use tradeerp_events::EventBus;

    use super::*;
    use crate::app::routes::catalog::tests::context;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(services: &Arc<AppServices>, tenant: TenantContext, principal: &PrincipalContext) -> Value {
        crate::app::routes::catalog::store_product(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Json(json!({"name": "Desk Lamp", "sku": "LAMP-1", "price": 40})),
        )
        .await
        .unwrap();
        crate::app::routes::customers::store_customer(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Json(json!({"first_name": "Ana", "last_name": "Lima", "email": "ana@example.com"})),
        )
        .await
        .unwrap();
        let placed = place_order(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Json(json!({"customer_id": 1, "items": [{"product_id": 1, "quantity": 2}], "shipping_amount": 5})),
        )
        .await
        .unwrap();
        assert_eq!(placed.status(), StatusCode::CREATED);
        body_json(placed).await
    }

    #[tokio::test]
    async fn placing_prices_lines_from_the_catalog() {
        let (services, tenant, principal) = context(&["products.*", "customers.*", "orders.*"]);
        let placed = seed(&services, tenant, &principal).await;

        assert_eq!(placed["order"]["subtotal"], 80.0);
        assert_eq!(placed["order"]["total"], 85.0);
        assert_eq!(placed["items"][0]["sku"], "LAMP-1");
        assert_eq!(placed["order"]["status"], "pending");
    }

    #[tokio::test]
    async fn status_change_records_history_notifies_and_broadcasts() {
        let (services, tenant, principal) = context(&["products.*", "customers.*", "orders.*"]);
        seed(&services, tenant, &principal).await;
        let feed = services.realtime().subscribe();

        let response = update_order_status(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal.clone()),
            Path(1),
            Json(json!({"status": "processing", "comment": "Picking"})),
        )
        .await
        .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["history"]["from_status"], "pending");
        assert_eq!(body["history"]["to_status"], "processing");

        let unread = services.notification_store().unread("customers", 1).await.unwrap();
        assert_eq!(unread.len(), 1);
        let envelope = feed.try_recv().unwrap();
        assert_eq!(envelope.tenant_id(), tenant.tenant_id());

        let err = update_order_status(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal),
            Path(1),
            Json(json!({"status": "pending"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn full_payment_marks_the_order_paid() {
        let (services, tenant, principal) = context(&["products.*", "customers.*", "orders.*"]);
        seed(&services, tenant, &principal).await;

        let response = store_transaction(
            Extension(services.clone()),
            Extension(tenant),
            Extension(principal),
            Path(1),
            Json(json!({"type": "payment", "amount": 85})),
        )
        .await
        .unwrap();
        assert_eq!(body_json(response).await["payment_status"], "paid");
    }
}

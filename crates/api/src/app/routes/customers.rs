use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use tradeerp_core::Timestamps;
use tradeerp_customers::{
    Address, AddressId, Customer, CustomerCommunication, CustomerCommunicationId, CustomerId, CustomerSegment,
    CustomerSegmentId, CustomerStats, CustomerStoreRequest, CustomerUpdateRequest, LoyaltyTransaction,
    LoyaltyTransactionId, StoreAddressRequest, StoreCustomerCommunicationRequest, StoreCustomerSegmentRequest,
    StoreLoyaltyTransactionRequest,
};
use tradeerp_infra::Repository;
use tradeerp_orders::{Order, OrderStatus};

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find, find_live, live, ok, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(store_customer).get(list_customers))
        .route("/:id", get(show_customer).patch(update_customer).delete(destroy_customer))
        .route("/:id/addresses", post(store_address).get(list_addresses))
        .route("/:id/addresses/:address_id/default", post(make_default_address))
        .route("/:id/communications", post(store_communication).get(list_communications))
        .route("/:id/loyalty", post(store_loyalty_transaction).get(list_loyalty_transactions))
}

pub fn segments_router() -> Router {
    Router::new()
        .route("/", post(store_segment).get(list_segments))
        .route("/:id/members", get(segment_members))
}

fn customers(services: &AppServices) -> Repository<Customer> {
    services.repo("customers")
}

/// Order aggregates for one customer. Cancelled and refunded orders do not count.
pub fn customer_stats(customer_id: CustomerId, orders: &[Order], now: DateTime<Utc>) -> CustomerStats {
    let counted: Vec<&Order> = orders
        .iter()
        .filter(|o| o.customer_id == Some(customer_id) && o.deleted_at.is_none())
        .filter(|o| !matches!(o.status, OrderStatus::Cancelled | OrderStatus::Refunded))
        .collect();
    let last_order_days = counted
        .iter()
        .map(|o| o.timestamps.created_at)
        .max()
        .map(|at| (now - at).num_days().max(0) as u32);
    CustomerStats {
        total_spent: counted.iter().map(|o| o.total).sum(),
        order_count: counted.len() as u32,
        last_order_days,
    }
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn store_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &CustomerStoreRequest, body).await?;
    let customer = customers(&services).create(tenant.tenant_id(), |id| Customer::create(CustomerId(id), new, Utc::now()))?;
    tracing::info!(customer_id = %customer.id, "customer created");
    Ok(created(customer))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let items = live(&customers(&services), &tenant)?;
    Ok(ok(json!({ "items": items })))
}

pub async fn show_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let customer = find_live(&customers(&services), &tenant, id)?;
    let orders = services.repo::<Order>("orders").all(tenant.tenant_id())?;
    let stats = customer_stats(customer.id, &orders, Utc::now());
    Ok(ok(json!({
        "customer": customer,
        "display_name": customer.display_name(),
        "stats": {
            "total_spent": stats.total_spent,
            "order_count": stats.order_count,
            "last_order_days": stats.last_order_days,
        },
    })))
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = customers(&services);
    let mut customer = find_live(&repo, &tenant, id)?;
    let request = CustomerUpdateRequest { customer: customer.clone() };
    let changes = validated(&services, &tenant, &principal, &request, body).await?;
    customer.apply(changes, Utc::now());
    repo.save(tenant.tenant_id(), id, &customer)?;
    Ok(ok(customer))
}

pub async fn destroy_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.delete")?;
    let repo = customers(&services);
    let mut customer = find_live(&repo, &tenant, id)?;
    let now = Utc::now();
    customer.deleted_at = Some(now);
    customer.timestamps.touch(now);
    repo.save(tenant.tenant_id(), id, &customer)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn store_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let customer = find_live(&customers(&services), &tenant, id)?;
    let request = StoreAddressRequest { customer_id: customer.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;

    let repo = services.repo::<Address>("addresses");
    let address = repo.create(tenant.tenant_id(), |aid| Address::create(AddressId(aid), customer.id, new, Utc::now()))?;
    if address.is_default {
        save_default(&repo, &tenant, customer.id, address.id)?;
    }
    Ok(created(address))
}

/// Make `address_id` the customer's default of its type and persist every flag flip.
fn save_default(
    repo: &Repository<Address>,
    tenant: &TenantContext,
    customer_id: CustomerId,
    address_id: AddressId,
) -> Result<Vec<Address>, ApiError> {
    let mut addresses: Vec<Address> = repo
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|a| a.customer_id == customer_id)
        .collect();
    let before = addresses.clone();
    Address::make_default(&mut addresses, address_id);
    for (old, new) in before.iter().zip(&addresses) {
        if old.is_default != new.is_default {
            repo.save(tenant.tenant_id(), new.id.get(), new)?;
        }
    }
    Ok(addresses)
}

pub async fn list_addresses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let customer = find_live(&customers(&services), &tenant, id)?;
    let items: Vec<Address> = services
        .repo::<Address>("addresses")
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|a| a.customer_id == customer.id)
        .collect();
    Ok(ok(json!({ "items": items })))
}

pub async fn make_default_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, address_id)): Path<(i64, i64)>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.update")?;
    let customer = find_live(&customers(&services), &tenant, id)?;
    let repo = services.repo::<Address>("addresses");
    let address = find(&repo, &tenant, address_id)?;
    if address.customer_id != customer.id {
        return Err(ApiError::not_found(format!("addresses {address_id}")));
    }
    let items = save_default(&repo, &tenant, customer.id, address.id)?;
    Ok(ok(json!({ "items": items })))
}

pub async fn store_communication(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let customer = find_live(&customers(&services), &tenant, id)?;
    let request = StoreCustomerCommunicationRequest { customer_id: customer.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let communication = services
        .repo::<CustomerCommunication>("customer_communications")
        .create(tenant.tenant_id(), |cid| {
            CustomerCommunication::create(CustomerCommunicationId(cid), customer.id, principal.user_id(), new, Utc::now())
        })?;
    Ok(created(communication))
}

pub async fn list_communications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let customer = find_live(&customers(&services), &tenant, id)?;
    let mut items: Vec<CustomerCommunication> = services
        .repo::<CustomerCommunication>("customer_communications")
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|c| c.customer_id == customer.id)
        .collect();
    items.sort_by(|a, b| b.communicated_at.cmp(&a.communicated_at));
    Ok(ok(json!({ "items": items })))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), customer_id = id))]
pub async fn store_loyalty_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = customers(&services);
    let mut customer = find_live(&repo, &tenant, id)?;
    let request = StoreLoyaltyTransactionRequest { customer: customer.clone() };
    let new = validated(&services, &tenant, &principal, &request, body).await?;

    let now = Utc::now();
    let balance_after = customer.apply_loyalty(new.kind, new.points)?;
    customer.timestamps.touch(now);
    repo.save(tenant.tenant_id(), id, &customer)?;

    let transaction = services
        .repo::<LoyaltyTransaction>("loyalty_transactions")
        .create(tenant.tenant_id(), |tid| LoyaltyTransaction {
            id: LoyaltyTransactionId(tid),
            customer_id: customer.id,
            order_id: new.order_id,
            kind: new.kind,
            points: new.points,
            balance_after,
            description: new.description,
            timestamps: Timestamps::new(now),
        })?;
    tracing::info!(kind = %transaction.kind, points = transaction.points, balance_after, "loyalty points moved");
    Ok(created(transaction))
}

pub async fn list_loyalty_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let customer = find_live(&customers(&services), &tenant, id)?;
    let items: Vec<LoyaltyTransaction> = services
        .repo::<LoyaltyTransaction>("loyalty_transactions")
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|t| t.customer_id == customer.id)
        .collect();
    Ok(ok(json!({ "balance": customer.loyalty_points, "items": items })))
}

pub async fn store_segment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreCustomerSegmentRequest, body).await?;
    let segment = services
        .repo::<CustomerSegment>("customer_segments")
        .create(tenant.tenant_id(), |id| CustomerSegment::create(CustomerSegmentId(id), new, Utc::now()))?;
    Ok(created(segment))
}

pub async fn list_segments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let items = services.repo::<CustomerSegment>("customer_segments").all(tenant.tenant_id())?;
    Ok(ok(json!({ "items": items })))
}

pub async fn segment_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "customers.view")?;
    let segment = find(&services.repo::<CustomerSegment>("customer_segments"), &tenant, id)?;
    let orders = services.repo::<Order>("orders").all(tenant.tenant_id())?;
    let now = Utc::now();
    let members: Vec<Customer> = live(&customers(&services), &tenant)?
        .into_iter()
        .filter(|c| segment.matches(c, &customer_stats(c.id, &orders, now)))
        .collect();
    Ok(ok(json!({ "segment": segment.slug, "count": members.len(), "items": members })))
}

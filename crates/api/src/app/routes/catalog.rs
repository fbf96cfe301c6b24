use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use tradeerp_catalog::{
    average_rating, Brand, BrandId, BulkProductAction, BulkProductRequest, Category, CategoryId, Product,
    ProductAttribute, ProductAttributeId, ProductAttributeValue, ProductAttributeValueId, ProductDiscount,
    ProductDiscountId, ProductId, ProductMeta, ProductMetaId, ProductReview, ProductReviewId, ProductTag,
    ProductTagId, ProductVariant, ProductVariantId, SearchProductRequest, StoreBrandRequest, StoreCategoryRequest,
    StoreProductAttributeRequest, StoreProductDiscountRequest, StoreProductMetaRequest, StoreProductRequest,
    StoreProductReviewRequest, StoreProductVariantRequest, ToggleProductStatusRequest, UpdateProductRequest,
};
use tradeerp_core::{StatusChange, TenantId};
use tradeerp_infra::Repository;

use crate::app::errors::ApiError;
use crate::app::routes::common::{created, find_live, live, ok, query_body, reserve_ids, validated};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::{PrincipalContext, TenantContext};

pub fn products_router() -> Router {
    Router::new()
        .route("/", post(store_product).get(search_products))
        .route("/bulk", post(bulk_products))
        .route("/:id", get(show_product).patch(update_product).delete(destroy_product))
        .route("/:id/status", post(toggle_product_status))
        .route("/:id/variants", post(store_variant).get(list_variants))
        .route("/:id/discounts", post(store_discount))
        .route("/:id/reviews", post(store_review).get(list_reviews))
        .route("/:id/metas", post(store_meta))
}

pub fn taxonomy_router() -> Router {
    Router::new()
        .route("/brands", post(store_brand).get(list_brands))
        .route("/categories", post(store_category).get(list_categories))
        .route("/attributes", post(store_attribute))
}

fn products(services: &AppServices) -> Repository<Product> {
    services.repo("products")
}

/// Replace the `product_tags` rows of a product with its current tag list.
fn sync_tags(services: &AppServices, tenant_id: TenantId, product: &Product) -> Result<(), ApiError> {
    let tags: Repository<ProductTag> = services.repo("product_tags");
    for tag in tags.all(tenant_id)?.iter().filter(|t| t.product_id == product.id) {
        tags.delete(tenant_id, tag.id.get())?;
    }
    for name in &product.tags {
        tags.create(tenant_id, |id| ProductTag::new(ProductTagId(id), product.id, name))?;
    }
    Ok(())
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn store_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreProductRequest, body).await?;
    let product = products(&services).create(tenant.tenant_id(), |id| Product::create(ProductId(id), new, Utc::now()))?;
    sync_tags(&services, tenant.tenant_id(), &product)?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    Ok(created(product))
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let search = validated(&services, &tenant, &principal, &SearchProductRequest, query_body(params)).await?;
    let page = search.run(live(&products(&services), &tenant)?);
    Ok(ok(page))
}

pub async fn show_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let product = find_live(&products(&services), &tenant, id)?;
    let discount_percent = product.discount_percent();
    let mut body = serde_json::to_value(&product).map_err(|e| tradeerp_infra::StoreError::Encode(e.to_string()))?;
    body["discount_percent"] = json!(discount_percent);
    body["in_stock"] = json!(product.in_stock());
    Ok(ok(body))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id(), product_id = id))]
pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let repo = products(&services);
    let mut product = find_live(&repo, &tenant, id)?;
    let request = UpdateProductRequest { product: product.clone() };
    let changes = validated(&services, &tenant, &principal, &request, body).await?;
    let retag = changes.tags.is_some();
    product.apply(changes, Utc::now());
    repo.save(tenant.tenant_id(), id, &product)?;
    if retag {
        sync_tags(&services, tenant.tenant_id(), &product)?;
    }
    Ok(ok(product))
}

pub async fn destroy_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.delete")?;
    let repo = products(&services);
    let mut product = find_live(&repo, &tenant, id)?;
    let now = Utc::now();
    product.deleted_at = Some(now);
    product.timestamps.touch(now);
    repo.save(tenant.tenant_id(), id, &product)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn toggle_product_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Response, ApiError> {
    let repo = products(&services);
    let mut product = find_live(&repo, &tenant, id)?;
    let request = ToggleProductStatusRequest { product: product.clone() };
    let body = body.map_or_else(|| json!({}), |Json(b)| b);
    let change = validated(&services, &tenant, &principal, &request, body).await?;

    let moved = StatusChange::checked(product.status, change.status)?;
    product.status = moved.to;
    product.timestamps.touch(Utc::now());
    repo.save(tenant.tenant_id(), id, &product)?;
    tracing::info!(product_id = id, from = %moved.from, to = %moved.to, "product status changed");
    Ok(ok(product))
}

#[tracing::instrument(skip_all, fields(tenant = %tenant.tenant_id()))]
pub async fn bulk_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let op = validated(&services, &tenant, &principal, &BulkProductRequest, body).await?;
    let repo = products(&services);
    let now = Utc::now();
    let (mut affected, mut skipped) = (Vec::new(), Vec::new());

    for id in op.ids {
        let Some(mut product) = repo.find(tenant.tenant_id(), id.get())?.filter(|p| p.deleted_at.is_none()) else {
            skipped.push(id);
            continue;
        };
        match op.action.target_status() {
            None => product.deleted_at = Some(now),
            Some(target) if product.status == target => {
                skipped.push(id);
                continue;
            }
            Some(target) => match StatusChange::checked(product.status, target) {
                Ok(moved) => product.status = moved.to,
                Err(_) => {
                    skipped.push(id);
                    continue;
                }
            },
        }
        product.timestamps.touch(now);
        repo.save(tenant.tenant_id(), id.get(), &product)?;
        affected.push(id);
    }

    tracing::info!(action = %op.action, affected = affected.len(), skipped = skipped.len(), "bulk product update");
    Ok(ok(json!({
        "action": op.action,
        "affected": affected,
        "skipped": skipped,
        "deleted": op.action == BulkProductAction::Delete,
    })))
}

pub async fn store_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let product = find_live(&products(&services), &tenant, id)?;
    let request = StoreProductVariantRequest { product_id: product.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;

    let variants: Repository<ProductVariant> = services.repo("product_variants");
    let variant = variants.create(tenant.tenant_id(), |vid| {
        ProductVariant::create(ProductVariantId(vid), product.id, new, Utc::now())
    })?;
    if variant.is_default {
        for mut other in variants
            .all(tenant.tenant_id())?
            .into_iter()
            .filter(|v| v.product_id == product.id && v.id != variant.id && v.is_default)
        {
            other.is_default = false;
            variants.save(tenant.tenant_id(), other.id.get(), &other)?;
        }
    }
    Ok(created(variant))
}

pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let product = find_live(&products(&services), &tenant, id)?;
    let variants: Repository<ProductVariant> = services.repo("product_variants");
    let items: Vec<_> = variants
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|v| v.product_id == product.id)
        .map(|v| {
            let price = v.effective_price(product.price);
            json!({ "variant": v, "effective_price": price })
        })
        .collect();
    Ok(ok(json!({ "items": items })))
}

pub async fn store_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let product = find_live(&products(&services), &tenant, id)?;
    let request = StoreProductDiscountRequest { product_id: product.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let discount = services
        .repo::<ProductDiscount>("product_discounts")
        .create(tenant.tenant_id(), |did| {
            ProductDiscount::create(ProductDiscountId(did), product.id, new, Utc::now())
        })?;
    Ok(created(discount))
}

pub async fn store_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let product = find_live(&products(&services), &tenant, id)?;
    let request = StoreProductReviewRequest { product_id: product.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let review = services
        .repo::<ProductReview>("product_reviews")
        .create(tenant.tenant_id(), |rid| {
            ProductReview::create(ProductReviewId(rid), product.id, principal.user_id(), new, Utc::now())
        })?;
    Ok(created(review))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let product = find_live(&products(&services), &tenant, id)?;
    let reviews: Vec<ProductReview> = services
        .repo::<ProductReview>("product_reviews")
        .all(tenant.tenant_id())?
        .into_iter()
        .filter(|r| r.product_id == product.id)
        .collect();
    Ok(ok(json!({
        "average_rating": average_rating(&reviews),
        "items": reviews,
    })))
}

pub async fn store_meta(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let product = find_live(&products(&services), &tenant, id)?;
    let request = StoreProductMetaRequest { product_id: product.id };
    let new = validated(&services, &tenant, &principal, &request, body).await?;
    let meta = services
        .repo::<ProductMeta>("product_metas")
        .create(tenant.tenant_id(), |mid| ProductMeta::create(ProductMetaId(mid), product.id, new, Utc::now()))?;
    Ok(created(meta))
}

pub async fn store_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreBrandRequest, body).await?;
    let brand = services
        .repo::<Brand>("brands")
        .create(tenant.tenant_id(), |id| Brand::create(BrandId(id), new, Utc::now()))?;
    Ok(created(brand))
}

pub async fn list_brands(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let items = live(&services.repo::<Brand>("brands"), &tenant)?;
    Ok(ok(json!({ "items": items })))
}

pub async fn store_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreCategoryRequest, body).await?;
    let categories = services.repo::<Category>("categories");
    if let Some(parent) = new.parent_id {
        find_live(&categories, &tenant, parent.get())?;
    }
    let category = categories.create(tenant.tenant_id(), |id| Category::create(CategoryId(id), new, Utc::now()))?;
    Ok(created(category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    authz::require(&tenant, &principal, "products.view")?;
    let all = live(&services.repo::<Category>("categories"), &tenant)?;
    let items: Vec<_> = all
        .iter()
        .map(|c| json!({ "category": c, "ancestry": Category::ancestry(c.id, &all) }))
        .collect();
    Ok(ok(json!({ "items": items })))
}

pub async fn store_attribute(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let new = validated(&services, &tenant, &principal, &StoreProductAttributeRequest, body).await?;
    let attributes = services.repo::<ProductAttribute>("product_attributes");
    let values_repo = services.repo::<ProductAttributeValue>("product_attribute_values");

    let id = attributes.next_id(tenant.tenant_id())?;
    let value_ids = reserve_ids(&values_repo, &tenant, new.values.as_ref().map_or(0, Vec::len))?;
    let mut value_ids = value_ids.into_iter();
    let (attribute, values) = ProductAttribute::create(
        ProductAttributeId(id),
        new,
        || ProductAttributeValueId(value_ids.next().unwrap_or_default()),
        Utc::now(),
    );

    attributes.save(tenant.tenant_id(), id, &attribute)?;
    for value in &values {
        values_repo.save(tenant.tenant_id(), value.id.get(), value)?;
    }
    Ok(created(json!({ "attribute": attribute, "values": values })))
}

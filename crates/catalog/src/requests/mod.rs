//! Form requests for catalog endpoints.

mod parts;
mod product;
mod taxonomy;

pub use parts::{
    StoreProductAttributeRequest, StoreProductDiscountRequest, StoreProductMetaRequest,
    StoreProductReviewRequest, StoreProductVariantRequest,
};
pub use product::{
    BulkProductAction, BulkProductOperation, BulkProductRequest, ProductStatusChange,
    SearchProductRequest, StoreProductRequest, ToggleProductStatusRequest, UpdateProductRequest,
};
pub use taxonomy::{StoreBrandRequest, StoreCategoryRequest};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use tradeerp_auth::{Permission, Principal};
    use tradeerp_core::TenantId;
    use tradeerp_validation::{process_as_of, FormRequest, InMemoryPresenceVerifier, RequestError};

    use super::*;
    use crate::product::tests::product;
    use crate::{BulkProductAction, ProductId, ProductSortField, ProductStatus, SortDirection};

    fn manager() -> Principal {
        Principal::with_permissions(TenantId::new(), [Permission::new("products.*"), Permission::new("attributes.*")])
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn store() -> InMemoryPresenceVerifier {
        InMemoryPresenceVerifier::new()
            .with_row("brands", 1, json!({"name": "Acme", "slug": "acme"}))
            .with_row("categories", 2, json!({"name": "Lighting", "slug": "lighting"}))
            .with_row("products", 10, json!({"sku": "LAMP-1", "slug": "desk-lamp"}))
    }

    async fn run<R: FormRequest>(request: &R, principal: &Principal, body: Value) -> Result<R::Output, RequestError> {
        process_as_of(request, principal, body, &store(), today()).await
    }

    #[tokio::test]
    async fn store_product_derives_slug_and_defaults() {
        let out = run(
            &StoreProductRequest,
            &manager(),
            json!({"name": "Floor Lamp XL", "sku": "lamp-2", "price": "49.90", "is_featured": "on", "brand_id": 1}),
        )
        .await
        .unwrap();
        assert_eq!(out.slug, "floor-lamp-xl");
        assert_eq!(out.sku, "LAMP-2");
        assert_eq!(out.status, ProductStatus::Draft);
        assert!(out.is_featured);
        assert_eq!(out.quantity, 0);
        assert_eq!(out.brand_id, Some(crate::BrandId(1)));
    }

    #[tokio::test]
    async fn store_product_rejects_taken_sku_and_low_compare_price() {
        let err = run(
            &StoreProductRequest,
            &manager(),
            json!({"name": "Desk Lamp", "sku": "lamp-1", "price": 30, "compare_price": 20, "category_id": 99}),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("sku"), Some("This SKU is already in use."));
        assert_eq!(errors.first("slug"), Some("A product with this slug already exists."));
        assert_eq!(
            errors.first("compare_price"),
            Some("The compare price must be greater than or equal to the price.")
        );
        assert_eq!(errors.first("category_id"), Some("The selected category id is invalid."));
    }

    #[tokio::test]
    async fn store_product_requires_permission() {
        let viewer = Principal::with_permissions(TenantId::new(), [Permission::new("products.view")]);
        let err = run(&StoreProductRequest, &viewer, json!({})).await.unwrap_err();
        assert!(matches!(err, RequestError::Forbidden(_)));
    }

    #[tokio::test]
    async fn duplicate_tags_are_caught_case_insensitively() {
        let err = run(
            &StoreProductRequest,
            &manager(),
            json!({"name": "Chair", "sku": "CH-1", "price": 10, "tags": ["Oak", "oak"]}),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("tags.0"), Some("Each tag may only be given once."));
        assert!(errors.has("tags.1"));
    }

    #[tokio::test]
    async fn update_product_ignores_own_sku_and_checks_stored_price() {
        let request = UpdateProductRequest { product: product(10, "Desk Lamp", 40.0) };
        let out = run(&request, &manager(), json!({"sku": "LAMP-1", "quantity": "12"})).await.unwrap();
        assert_eq!(out.sku.as_deref(), Some("LAMP-1"));
        assert_eq!(out.quantity, Some(12));
        assert!(out.name.is_none());

        let err = run(&request, &manager(), json!({"compare_price": 35})).await.unwrap_err();
        assert!(err.validation_errors().unwrap().has("compare_price"));
    }

    #[tokio::test]
    async fn search_applies_defaults() {
        let out = run(&SearchProductRequest, &manager(), json!({"q": " lamp "})).await.unwrap();
        assert_eq!(out.q.as_deref(), Some("lamp"));
        assert_eq!(out.per_page, 15);
        assert_eq!(out.sort_by, ProductSortField::CreatedAt);
        assert_eq!(out.sort_direction, SortDirection::Desc);

        let err = run(&SearchProductRequest, &manager(), json!({"page": 9_999_999_999u64}))
            .await
            .unwrap_err();
        assert!(err.validation_errors().unwrap().has("page"));
    }

    #[tokio::test]
    async fn search_rejects_inverted_price_band() {
        let err = run(&SearchProductRequest, &manager(), json!({"min_price": 100, "max_price": 10}))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("max_price"),
            Some("The maximum price must be greater than or equal to the minimum price.")
        );
    }

    #[tokio::test]
    async fn toggle_flips_and_rejects_no_ops() {
        let request = ToggleProductStatusRequest { product: product(10, "Desk Lamp", 40.0) };
        let out = run(&request, &manager(), json!({})).await.unwrap();
        assert_eq!(out.status, ProductStatus::Inactive);

        let err = run(&request, &manager(), json!({"status": "active"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("status"),
            Some("The product is already active.")
        );
    }

    #[tokio::test]
    async fn bulk_requires_distinct_existing_ids() {
        let out = run(&BulkProductRequest, &manager(), json!({"action": "Archive", "ids": ["10"]}))
            .await
            .unwrap();
        assert_eq!(out.action, BulkProductAction::Archive);
        assert_eq!(out.ids, vec![ProductId(10)]);

        let err = run(&BulkProductRequest, &manager(), json!({"action": "archive", "ids": [10, 10, 11]}))
            .await
            .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has("ids.0"));
        assert_eq!(errors.first("ids.2"), Some("One of the selected products does not exist."));
    }

    #[tokio::test]
    async fn percentage_discount_is_capped() {
        let request = StoreProductDiscountRequest { product_id: ProductId(10) };
        let err = run(
            &request,
            &manager(),
            json!({"type": "percentage", "value": 150, "starts_at": "2025-06-01", "ends_at": "2025-05-01"}),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("value"), Some("A percentage discount cannot exceed 100."));
        assert_eq!(
            errors.first("ends_at"),
            Some("The ends at field must be a date after starts at.")
        );
    }

    #[tokio::test]
    async fn select_attributes_need_values() {
        let err = run(&StoreProductAttributeRequest, &manager(), json!({"name": "Color", "type": "select"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("values"),
            Some("Select attributes need at least one value.")
        );
    }

    #[tokio::test]
    async fn reviews_are_open_to_any_principal() {
        let shopper = Principal::with_permissions(TenantId::new(), Vec::<Permission>::new());
        let request = StoreProductReviewRequest { product_id: ProductId(10) };
        let err = run(&request, &shopper, json!({"rating": 6, "comment": "short"})).await.unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("rating"), Some("Please rate the product from 1 to 5 stars."));
        assert_eq!(errors.first("comment"), Some("Reviews must be at least 10 characters long."));
    }
}

use serde::Deserialize;

use tradeerp_auth::Permission;
use tradeerp_core::Lifecycle;
use tradeerp_validation::{FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{NewProduct, Product, ProductChanges, ProductId, ProductSearch, ProductSortField, ProductStatus, SortDirection};

const MAX_TAGS: f64 = 20.0;

fn normalize_product_input(input: &mut Input) {
    input.coerce_bool("is_featured");
    input.uppercase("sku");
    if let Some(serde_json::Value::Array(tags)) = input.get("tags").cloned() {
        let lowered: Vec<serde_json::Value> = tags
            .into_iter()
            .map(|t| match t {
                serde_json::Value::String(s) => serde_json::Value::String(s.to_lowercase()),
                other => other,
            })
            .collect();
        input.set("tags", lowered);
    }
}

fn product_messages() -> Messages {
    Messages::new()
        .with("sku.unique", "This SKU is already in use.")
        .with("slug.unique", "A product with this slug already exists.")
        .with(
            "compare_price.gte",
            "The compare price must be greater than or equal to the price.",
        )
        .with("tags.*.distinct", "Each tag may only be given once.")
}

pub struct StoreProductRequest;

impl FormRequest for StoreProductRequest {
    type Output = NewProduct;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.slug_from("slug", "name");
        input.default("status", ProductStatus::Draft.as_str());
        input.default("is_featured", false);
        input.default("quantity", 0);
        normalize_product_input(input);
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field(
                "slug",
                [Rule::Required, Rule::String, Rule::Max(255.0), Rule::AlphaDash, Rule::unique("products", "slug")],
            )
            .field(
                "sku",
                [Rule::Required, Rule::String, Rule::Max(100.0), Rule::unique("products", "sku")],
            )
            .field("description", [Rule::Nullable, Rule::String])
            .field("short_description", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
            .field("price", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("compare_price", [Rule::Nullable, Rule::Numeric, Rule::Gte("price")])
            .field("cost_price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("quantity", [Rule::Integer, Rule::Min(0.0)])
            .field("weight", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("status", [Rule::Required, Rule::In(ProductStatus::VALUES)])
            .field("is_featured", [Rule::Boolean])
            .field("brand_id", [Rule::Nullable, Rule::Integer, Rule::exists("brands", "id")])
            .field("category_id", [Rule::Nullable, Rule::Integer, Rule::exists("categories", "id")])
            .field("tags", [Rule::Nullable, Rule::Array, Rule::Max(MAX_TAGS)])
            .field("tags.*", [Rule::String, Rule::Max(50.0), Rule::Distinct])
            .field("meta_title", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("meta_description", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        product_messages()
    }
}

/// Update of an existing product; every field is optional.
pub struct UpdateProductRequest {
    pub product: Product,
}

impl FormRequest for UpdateProductRequest {
    type Output = ProductChanges;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.update"))
    }

    fn prepare(&self, input: &mut Input) {
        if input.has("slug") {
            input.slug_from("slug", "name");
        }
        normalize_product_input(input);
    }

    fn rules(&self) -> Rules {
        let id = self.product.id.get();
        Rules::new()
            .field("name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(255.0)])
            .field(
                "slug",
                [
                    Rule::Sometimes,
                    Rule::Required,
                    Rule::String,
                    Rule::Max(255.0),
                    Rule::AlphaDash,
                    Rule::unique_ignoring("products", "slug", id),
                ],
            )
            .field(
                "sku",
                [
                    Rule::Sometimes,
                    Rule::Required,
                    Rule::String,
                    Rule::Max(100.0),
                    Rule::unique_ignoring("products", "sku", id),
                ],
            )
            .field("description", [Rule::Nullable, Rule::String])
            .field("short_description", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
            .field("price", [Rule::Sometimes, Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("compare_price", [Rule::Nullable, Rule::Numeric, Rule::Gte("price")])
            .field("cost_price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("quantity", [Rule::Sometimes, Rule::Integer, Rule::Min(0.0)])
            .field("weight", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("status", [Rule::Sometimes, Rule::In(ProductStatus::VALUES)])
            .field("is_featured", [Rule::Sometimes, Rule::Boolean])
            .field("brand_id", [Rule::Nullable, Rule::Integer, Rule::exists("brands", "id")])
            .field("category_id", [Rule::Nullable, Rule::Integer, Rule::exists("categories", "id")])
            .field("tags", [Rule::Nullable, Rule::Array, Rule::Max(MAX_TAGS)])
            .field("tags.*", [Rule::String, Rule::Max(50.0), Rule::Distinct])
            .field("meta_title", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("meta_description", [Rule::Nullable, Rule::String, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        product_messages()
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        // Compare against the stored price when the request leaves it alone.
        if !input.has("price") && !errors.has("compare_price") {
            if let Some(compare) = input.get_f64("compare_price") {
                if compare < self.product.price {
                    errors.add(
                        "compare_price",
                        "The compare price must be greater than or equal to the price.",
                    );
                }
            }
        }
        if let Some(status) = input.get_str("status").and_then(|s| s.parse::<ProductStatus>().ok()) {
            if status != self.product.status && !self.product.status.can_transition_to(status) {
                errors.add(
                    "status",
                    format!(
                        "A {} product cannot be moved to {}.",
                        self.product.status.as_str(),
                        status.as_str()
                    ),
                );
            }
        }
    }
}

pub struct SearchProductRequest;

impl FormRequest for SearchProductRequest {
    type Output = ProductSearch;

    fn ability(&self) -> Option<Permission> {
        None
    }

    fn prepare(&self, input: &mut Input) {
        input.default("per_page", tradeerp_core::PageRequest::DEFAULT_PER_PAGE);
        input.default("page", 1);
        input.default("sort_by", ProductSortField::CreatedAt.as_str());
        input.default("sort_direction", SortDirection::Desc.as_str());
        input.lowercase("sort_direction");
        input.coerce_bool("is_featured");
        input.coerce_bool("in_stock");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("q", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("category_id", [Rule::Nullable, Rule::Integer, Rule::exists("categories", "id")])
            .field("brand_id", [Rule::Nullable, Rule::Integer, Rule::exists("brands", "id")])
            .field("status", [Rule::Nullable, Rule::In(ProductStatus::VALUES)])
            .field("min_price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("max_price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0), Rule::Gte("min_price")])
            .field("is_featured", [Rule::Nullable, Rule::Boolean])
            .field("in_stock", [Rule::Nullable, Rule::Boolean])
            .field("sort_by", [Rule::In(ProductSortField::VALUES)])
            .field("sort_direction", [Rule::In(SortDirection::VALUES)])
            .field("per_page", [Rule::Integer, Rule::Between(1.0, 100.0)])
            .field("page", [Rule::Integer, Rule::Between(1.0, f64::from(u32::MAX))])
    }

    fn messages(&self) -> Messages {
        Messages::new().with(
            "max_price.gte",
            "The maximum price must be greater than or equal to the minimum price.",
        )
    }
}

/// Activate or deactivate a single product.
pub struct ToggleProductStatusRequest {
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductStatusChange {
    pub status: ProductStatus,
}

impl FormRequest for ToggleProductStatusRequest {
    type Output = ProductStatusChange;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.update"))
    }

    fn prepare(&self, input: &mut Input) {
        // No explicit target flips between active and inactive.
        let flipped = match self.product.status {
            ProductStatus::Active => ProductStatus::Inactive,
            _ => ProductStatus::Active,
        };
        input.default("status", flipped.as_str());
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new().field(
            "status",
            [Rule::Required, Rule::In(&["active", "inactive"])],
        )
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<ProductStatus>().ok()) else {
            return;
        };
        if target == self.product.status {
            errors.add("status", format!("The product is already {}.", target.as_str()));
        } else if !self.product.status.can_transition_to(target) {
            errors.add(
                "status",
                format!(
                    "A {} product cannot be moved to {}.",
                    self.product.status.as_str(),
                    target.as_str()
                ),
            );
        }
    }
}

tradeerp_core::string_enum! {
    pub enum BulkProductAction {
        Activate => "activate",
        Deactivate => "deactivate",
        Archive => "archive",
        Delete => "delete",
    }
}

impl BulkProductAction {
    /// Status the action moves products to; `None` for deletion.
    pub fn target_status(&self) -> Option<ProductStatus> {
        match self {
            BulkProductAction::Activate => Some(ProductStatus::Active),
            BulkProductAction::Deactivate => Some(ProductStatus::Inactive),
            BulkProductAction::Archive => Some(ProductStatus::Archived),
            BulkProductAction::Delete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkProductOperation {
    pub action: BulkProductAction,
    pub ids: Vec<ProductId>,
}

pub struct BulkProductRequest;

impl FormRequest for BulkProductRequest {
    type Output = BulkProductOperation;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.bulk_update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("action");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("action", [Rule::Required, Rule::In(BulkProductAction::VALUES)])
            .field("ids", [Rule::Required, Rule::Array, Rule::Min(1.0), Rule::Max(100.0)])
            .field(
                "ids.*",
                [Rule::Required, Rule::Integer, Rule::Distinct, Rule::exists("products", "id")],
            )
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("ids.max", "No more than 100 products can be changed at once.")
            .with("ids.*.exists", "One of the selected products does not exist.")
    }
}

use tradeerp_auth::Permission;
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    AttributeType, DiscountType, NewProductAttribute, NewProductDiscount, NewProductMeta,
    NewProductReview, NewProductVariant, ProductId,
};

pub struct StoreProductVariantRequest {
    pub product_id: ProductId,
}

impl FormRequest for StoreProductVariantRequest {
    type Output = NewProductVariant;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.uppercase("sku");
        input.default("is_default", false);
        input.coerce_bool("is_default");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field(
                "sku",
                [Rule::Required, Rule::String, Rule::Max(100.0), Rule::unique("product_variants", "sku")],
            )
            .field("price", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("quantity", [Rule::Required, Rule::Integer, Rule::Min(0.0)])
            .field("options", [Rule::Nullable, Rule::Array, Rule::Max(10.0)])
            .field("options.*.name", [Rule::Required, Rule::String, Rule::Max(50.0), Rule::Distinct])
            .field("options.*.value", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("is_default", [Rule::Boolean])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("options.*.name.distinct", "Each option name may only appear once.")
    }
}

pub struct StoreProductAttributeRequest;

impl FormRequest for StoreProductAttributeRequest {
    type Output = NewProductAttribute;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("attributes.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.slug_from("slug", "name");
        input.lowercase("type");
        input.default("is_filterable", false);
        input.coerce_bool("is_filterable");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field(
                "slug",
                [Rule::Required, Rule::String, Rule::AlphaDash, Rule::unique("product_attributes", "slug")],
            )
            .field("type", [Rule::Required, Rule::In(AttributeType::VALUES)])
            .field("is_filterable", [Rule::Boolean])
            .field(
                "values",
                [Rule::RequiredIf("type", &["select", "multiselect"]), Rule::Nullable, Rule::Array, Rule::Min(1.0)],
            )
            .field("values.*", [Rule::Required, Rule::String, Rule::Max(100.0), Rule::Distinct])
    }

    fn messages(&self) -> Messages {
        Messages::new().with(
            "values.required_if",
            "Select attributes need at least one value.",
        )
    }
}

pub struct StoreProductDiscountRequest {
    pub product_id: ProductId,
}

impl FormRequest for StoreProductDiscountRequest {
    type Output = NewProductDiscount;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("type");
        input.default("is_active", true);
        input.coerce_bool("is_active");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("type", [Rule::Required, Rule::In(DiscountType::VALUES)])
            .field("value", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("starts_at", [Rule::Required, Rule::Date, Rule::AfterOrEqual(DateRef::Today)])
            .field("ends_at", [Rule::Nullable, Rule::Date, Rule::After(DateRef::Field("starts_at"))])
            .field("min_quantity", [Rule::Nullable, Rule::Integer, Rule::Min(1.0)])
            .field("is_active", [Rule::Boolean])
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        let percentage = input.get_str("type") == Some(DiscountType::Percentage.as_str());
        if percentage && !errors.has("value") && input.get_f64("value").is_some_and(|v| v > 100.0) {
            errors.add("value", "A percentage discount cannot exceed 100.");
        }
    }
}

/// Customer review; any authenticated principal may submit one.
pub struct StoreProductReviewRequest {
    pub product_id: ProductId,
}

impl FormRequest for StoreProductReviewRequest {
    type Output = NewProductReview;

    fn ability(&self) -> Option<Permission> {
        None
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("rating", [Rule::Required, Rule::Integer, Rule::Between(1.0, 5.0)])
            .field("title", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("comment", [Rule::Required, Rule::String, Rule::Min(10.0), Rule::Max(2000.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("rating.between", "Please rate the product from 1 to 5 stars.")
            .with("comment.min", "Reviews must be at least :min characters long.")
    }
}

pub struct StoreProductMetaRequest {
    pub product_id: ProductId,
}

impl FormRequest for StoreProductMetaRequest {
    type Output = NewProductMeta;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("products.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("key");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("key", [Rule::Required, Rule::String, Rule::Max(100.0), Rule::AlphaDash])
            .field("value", [Rule::Nullable, Rule::String, Rule::Max(65535.0)])
    }
}

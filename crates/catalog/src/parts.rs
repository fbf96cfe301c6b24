//! Records hanging off a product: variants, attributes, tags, metadata,
//! discounts and reviews.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, Lifecycle, Slug, Timestamps};

use crate::ProductId;

record_id!(ProductVariantId);
record_id!(ProductAttributeId);
record_id!(ProductAttributeValueId);
record_id!(ProductTagId);
record_id!(ProductMetaId);
record_id!(ProductDiscountId);
record_id!(ProductReviewId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: ProductVariantId,
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    /// Overrides the product price when set.
    pub price: Option<f64>,
    pub quantity: i64,
    pub options: Vec<VariantOption>,
    pub is_default: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProductVariant {
    pub name: String,
    pub sku: String,
    pub price: Option<f64>,
    pub quantity: i64,
    #[serde(default)]
    pub options: Option<Vec<VariantOption>>,
    #[serde(default)]
    pub is_default: bool,
}

impl ProductVariant {
    pub fn create(
        id: ProductVariantId,
        product_id: ProductId,
        new: NewProductVariant,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            name: new.name,
            sku: new.sku,
            price: new.price,
            quantity: new.quantity,
            options: new.options.unwrap_or_default(),
            is_default: new.is_default,
            timestamps: Timestamps::new(now),
        }
    }

    pub fn effective_price(&self, product_price: f64) -> f64 {
        self.price.unwrap_or(product_price)
    }
}

string_enum! {
    pub enum AttributeType {
        Text => "text",
        Select => "select",
        Multiselect => "multiselect",
        Boolean => "boolean",
        Number => "number",
    }
}

impl AttributeType {
    /// Whether the attribute carries a fixed list of values.
    pub fn has_options(&self) -> bool {
        matches!(self, AttributeType::Select | AttributeType::Multiselect)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub id: ProductAttributeId,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub is_filterable: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributeValue {
    pub id: ProductAttributeValueId,
    pub attribute_id: ProductAttributeId,
    pub value: String,
    pub slug: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProductAttribute {
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(default)]
    pub is_filterable: bool,
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

impl ProductAttribute {
    /// Build the attribute and its option rows. `next_value_id` hands out
    /// keys for the `product_attribute_values` rows.
    pub fn create(
        id: ProductAttributeId,
        new: NewProductAttribute,
        mut next_value_id: impl FnMut() -> ProductAttributeValueId,
        now: DateTime<Utc>,
    ) -> (Self, Vec<ProductAttributeValue>) {
        let values = new
            .values
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, value)| ProductAttributeValue {
                id: next_value_id(),
                attribute_id: id,
                slug: Slug::from_name(&value).to_string(),
                value,
                sort_order: i as i64,
            })
            .collect();
        let attribute = Self {
            id,
            name: new.name,
            slug: new.slug,
            kind: new.kind,
            is_filterable: new.is_filterable,
            timestamps: Timestamps::new(now),
        };
        (attribute, values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTag {
    pub id: ProductTagId,
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
}

impl ProductTag {
    pub fn new(id: ProductTagId, product_id: ProductId, name: &str) -> Self {
        Self {
            id,
            product_id,
            name: name.to_string(),
            slug: Slug::from_name(name).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMeta {
    pub id: ProductMetaId,
    pub product_id: ProductId,
    pub key: String,
    pub value: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProductMeta {
    pub key: String,
    pub value: Option<String>,
}

impl ProductMeta {
    pub fn create(id: ProductMetaId, product_id: ProductId, new: NewProductMeta, now: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id,
            key: new.key,
            value: new.value,
            timestamps: Timestamps::new(now),
        }
    }
}

string_enum! {
    pub enum DiscountType {
        Percentage => "percentage",
        Fixed => "fixed",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDiscount {
    pub id: ProductDiscountId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub value: f64,
    pub starts_at: NaiveDate,
    pub ends_at: Option<NaiveDate>,
    pub min_quantity: Option<i64>,
    pub is_active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProductDiscount {
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub value: f64,
    pub starts_at: NaiveDate,
    pub ends_at: Option<NaiveDate>,
    pub min_quantity: Option<i64>,
    pub is_active: bool,
}

impl ProductDiscount {
    pub fn create(
        id: ProductDiscountId,
        product_id: ProductId,
        new: NewProductDiscount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            kind: new.kind,
            value: new.value,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            min_quantity: new.min_quantity,
            is_active: new.is_active,
            timestamps: Timestamps::new(now),
        }
    }

    pub fn applies(&self, on: NaiveDate, quantity: i64) -> bool {
        self.is_active
            && on >= self.starts_at
            && self.ends_at.is_none_or(|end| on <= end)
            && self.min_quantity.is_none_or(|min| quantity >= min)
    }

    /// Unit price after this discount, never below zero.
    pub fn apply_to(&self, price: f64) -> f64 {
        let discounted = match self.kind {
            DiscountType::Percentage => price * (1.0 - self.value / 100.0),
            DiscountType::Fixed => price - self.value,
        };
        discounted.max(0.0)
    }
}

string_enum! {
    pub enum ReviewStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Lifecycle for ReviewStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        match self {
            ReviewStatus::Pending => &[ReviewStatus::Approved, ReviewStatus::Rejected],
            ReviewStatus::Approved => &[ReviewStatus::Rejected],
            ReviewStatus::Rejected => &[ReviewStatus::Approved],
        }
    }

    fn as_str(&self) -> &'static str {
        ReviewStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReview {
    pub id: ProductReviewId,
    pub product_id: ProductId,
    pub user_id: Option<i64>,
    pub rating: u8,
    pub title: Option<String>,
    pub comment: String,
    pub status: ReviewStatus,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProductReview {
    pub rating: u8,
    pub title: Option<String>,
    pub comment: String,
}

impl ProductReview {
    pub fn create(
        id: ProductReviewId,
        product_id: ProductId,
        user_id: Option<i64>,
        new: NewProductReview,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            user_id,
            rating: new.rating,
            title: new.title,
            comment: new.comment,
            status: ReviewStatus::Pending,
            timestamps: Timestamps::new(now),
        }
    }
}

/// Mean rating over approved reviews, one decimal.
pub fn average_rating(reviews: &[ProductReview]) -> Option<f64> {
    let approved: Vec<u8> = reviews
        .iter()
        .filter(|r| r.status == ReviewStatus::Approved)
        .map(|r| r.rating)
        .collect();
    if approved.is_empty() {
        return None;
    }
    let mean = approved.iter().map(|r| f64::from(*r)).sum::<f64>() / approved.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discount(kind: DiscountType, value: f64) -> ProductDiscount {
        ProductDiscount::create(
            ProductDiscountId(1),
            ProductId(1),
            NewProductDiscount {
                kind,
                value,
                starts_at: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                ends_at: NaiveDate::from_ymd_opt(2025, 1, 31),
                min_quantity: Some(2),
                is_active: true,
            },
            Utc::now(),
        )
    }

    #[test]
    fn discount_window_and_quantity() {
        let d = discount(DiscountType::Percentage, 10.0);
        let mid = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert!(d.applies(mid, 2));
        assert!(!d.applies(mid, 1));
        assert!(!d.applies(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(), 5));
        assert!((d.apply_to(50.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_discount_never_goes_negative() {
        assert_eq!(discount(DiscountType::Fixed, 80.0).apply_to(50.0), 0.0);
    }

    #[test]
    fn attribute_values_are_numbered_in_order() {
        let mut next = 0;
        let (attr, values) = ProductAttribute::create(
            ProductAttributeId(4),
            NewProductAttribute {
                name: "Size".into(),
                slug: "size".into(),
                kind: AttributeType::Select,
                is_filterable: true,
                values: Some(vec!["Small".into(), "Extra Large".into()]),
            },
            || {
                next += 1;
                ProductAttributeValueId(next)
            },
            Utc::now(),
        );
        assert_eq!(attr.slug, "size");
        assert_eq!(values[1].slug, "extra-large");
        assert_eq!(values[1].sort_order, 1);
        assert_eq!(values[1].attribute_id, ProductAttributeId(4));
    }

    #[test]
    fn average_counts_only_approved_reviews() {
        let mut reviews: Vec<ProductReview> = [5u8, 4, 1]
            .iter()
            .enumerate()
            .map(|(i, r)| {
                ProductReview::create(
                    ProductReviewId(i as i64 + 1),
                    ProductId(1),
                    Some(1),
                    NewProductReview {
                        rating: *r,
                        title: None,
                        comment: "fine product overall".into(),
                    },
                    Utc::now(),
                )
            })
            .collect();
        assert_eq!(average_rating(&reviews), None);
        reviews[0].status = ReviewStatus::Approved;
        reviews[1].status = ReviewStatus::Approved;
        assert_eq!(average_rating(&reviews), Some(4.5));
    }
}

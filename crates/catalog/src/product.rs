use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use tradeerp_core::SortDirection;
use tradeerp_core::{record_id, string_enum, Entity, Lifecycle, Page, PageRequest, SoftDeletes, Timestamps};

use crate::{BrandId, CategoryId};

record_id!(
    /// Key of a `products` row.
    ProductId
);

string_enum! {
    /// Product status lifecycle.
    pub enum ProductStatus {
        Draft => "draft",
        Active => "active",
        Inactive => "inactive",
        Archived => "archived",
    }
}

impl Lifecycle for ProductStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use ProductStatus::*;
        match self {
            Draft => &[Active, Archived],
            Active => &[Inactive, Archived],
            Inactive => &[Active, Archived],
            Archived => &[Draft],
        }
    }

    fn as_str(&self) -> &'static str {
        ProductStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub quantity: i64,
    pub weight: Option<f64>,
    pub status: ProductStatus,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Validated payload of a product creation request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub cost_price: Option<f64>,
    #[serde(default)]
    pub quantity: i64,
    pub weight: Option<f64>,
    pub status: ProductStatus,
    #[serde(default)]
    pub is_featured: bool,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Option<f64>,
    pub compare_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub quantity: Option<i64>,
    pub weight: Option<f64>,
    pub status: Option<ProductStatus>,
    pub is_featured: Option<bool>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl Product {
    pub fn create(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            brand_id: new.brand_id,
            category_id: new.category_id,
            name: new.name,
            slug: new.slug,
            sku: new.sku,
            description: new.description,
            short_description: new.short_description,
            price: new.price,
            compare_price: new.compare_price,
            cost_price: new.cost_price,
            quantity: new.quantity,
            weight: new.weight,
            status: new.status,
            is_featured: new.is_featured,
            meta_title: new.meta_title,
            meta_description: new.meta_description,
            tags: new.tags.unwrap_or_default(),
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, changes: ProductChanges, now: DateTime<Utc>) {
        let c = changes;
        if let Some(v) = c.name {
            self.name = v;
        }
        if let Some(v) = c.slug {
            self.slug = v;
        }
        if let Some(v) = c.sku {
            self.sku = v;
        }
        if let Some(v) = c.price {
            self.price = v;
        }
        if let Some(v) = c.quantity {
            self.quantity = v;
        }
        if let Some(v) = c.status {
            self.status = v;
        }
        if let Some(v) = c.is_featured {
            self.is_featured = v;
        }
        if let Some(v) = c.tags {
            self.tags = v;
        }
        self.description = c.description.or(self.description.take());
        self.short_description = c.short_description.or(self.short_description.take());
        self.compare_price = c.compare_price.or(self.compare_price);
        self.cost_price = c.cost_price.or(self.cost_price);
        self.weight = c.weight.or(self.weight);
        self.brand_id = c.brand_id.or(self.brand_id);
        self.category_id = c.category_id.or(self.category_id);
        self.meta_title = c.meta_title.or(self.meta_title.take());
        self.meta_description = c.meta_description.or(self.meta_description.take());
        self.timestamps.touch(now);
    }

    /// Savings against the compare-at price, as a whole percentage.
    pub fn discount_percent(&self) -> Option<u32> {
        match self.compare_price {
            Some(compare) if compare > self.price && compare > 0.0 => {
                Some((((compare - self.price) / compare) * 100.0).round() as u32)
            }
            _ => None,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

impl SoftDeletes for Product {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

string_enum! {
    pub enum ProductSortField {
        Name => "name",
        Price => "price",
        CreatedAt => "created_at",
        Quantity => "quantity",
    }
}

/// Validated product search query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductSearch {
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub is_featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub sort_by: ProductSortField,
    pub sort_direction: SortDirection,
    pub per_page: u32,
    #[serde(default = "first_page")]
    pub page: u32,
}

fn first_page() -> u32 {
    1
}

impl ProductSearch {
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_trashed() {
            return false;
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            let hit = product.name.to_lowercase().contains(&q)
                || product.sku.to_lowercase().contains(&q)
                || product
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&q));
            if !hit {
                return false;
            }
        }
        self.category_id.is_none_or(|c| product.category_id == Some(c))
            && self.brand_id.is_none_or(|b| product.brand_id == Some(b))
            && self.status.is_none_or(|s| product.status == s)
            && self.min_price.is_none_or(|p| product.price >= p)
            && self.max_price.is_none_or(|p| product.price <= p)
            && self.is_featured.is_none_or(|f| product.is_featured == f)
            && self.in_stock.is_none_or(|s| product.in_stock() == s)
    }

    /// Filter, sort and paginate.
    pub fn run(&self, products: Vec<Product>) -> Page<Product> {
        let mut hits: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        hits.sort_by(|a, b| {
            let ord = match self.sort_by {
                ProductSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                ProductSortField::Price => a.price.total_cmp(&b.price),
                ProductSortField::CreatedAt => a.timestamps.created_at.cmp(&b.timestamps.created_at),
                ProductSortField::Quantity => a.quantity.cmp(&b.quantity),
            };
            self.sort_direction.apply(ord)
        });
        Page::paginate(hits, PageRequest::new(self.page, self.per_page))
    }
}

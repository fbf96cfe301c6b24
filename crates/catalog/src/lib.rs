//! `tradeerp-catalog`: products, their child records, brands and categories.
//!
//! Plain records plus the form requests that guard every catalog endpoint.
//! No IO: persistence and presence lookups are supplied by the caller.

pub mod brand;
pub mod category;
pub mod parts;
pub mod product;
pub mod requests;

pub use brand::{Brand, BrandId, NewBrand};
pub use category::{Category, CategoryId, NewCategory};
pub use parts::{
    average_rating, AttributeType, DiscountType, NewProductAttribute, NewProductDiscount,
    NewProductMeta, NewProductReview, NewProductVariant, ProductAttribute, ProductAttributeId,
    ProductAttributeValue, ProductAttributeValueId, ProductDiscount, ProductDiscountId,
    ProductMeta, ProductMetaId, ProductReview, ProductReviewId, ProductTag, ProductTagId,
    ProductVariant, ProductVariantId, ReviewStatus, VariantOption,
};
pub use product::{
    NewProduct, Product, ProductChanges, ProductId, ProductSearch, ProductSortField,
    ProductStatus, SortDirection,
};
pub use requests::*;

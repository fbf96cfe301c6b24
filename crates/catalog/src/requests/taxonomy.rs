use tradeerp_auth::Permission;
use tradeerp_validation::{FormRequest, Input, Rule, Rules};

use crate::{NewBrand, NewCategory};

pub struct StoreBrandRequest;

impl FormRequest for StoreBrandRequest {
    type Output = NewBrand;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("brands.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.slug_from("slug", "name");
        input.default("is_active", true);
        input.coerce_bool("is_active");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0), Rule::unique("brands", "name")])
            .field("slug", [Rule::Required, Rule::String, Rule::AlphaDash, Rule::unique("brands", "slug")])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
            .field("logo_url", [Rule::Nullable, Rule::Url, Rule::Max(2048.0)])
            .field("website", [Rule::Nullable, Rule::Url, Rule::Max(255.0)])
            .field("is_active", [Rule::Boolean])
    }
}

pub struct StoreCategoryRequest;

impl FormRequest for StoreCategoryRequest {
    type Output = NewCategory;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("categories.create"))
    }

    fn prepare(&self, input: &mut Input) {
        input.slug_from("slug", "name");
        input.default("sort_order", 0);
        input.default("is_active", true);
        input.coerce_bool("is_active");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("parent_id", [Rule::Nullable, Rule::Integer, Rule::exists("categories", "id")])
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("slug", [Rule::Required, Rule::String, Rule::AlphaDash, Rule::unique("categories", "slug")])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(1000.0)])
            .field("sort_order", [Rule::Integer, Rule::Min(0.0)])
            .field("is_active", [Rule::Boolean])
    }
}

use crate::create_table_migration;

create_table_migration!(CreateBrandsTable, "2024_01_01_000100_create_brands_table", "brands", |t| {
    t.id();
    t.string("name", 255);
    t.string("slug", 255).unique();
    t.text("description").nullable();
    t.string("logo_url", 500).nullable();
    t.string("website", 255).nullable();
    t.boolean("is_active").default(true);
    t.timestamps();
    t.soft_deletes();
});

create_table_migration!(
    CreateCategoriesTable,
    "2024_01_01_000200_create_categories_table",
    "categories",
    |t| {
        t.id();
        t.foreign_id("parent_id").nullable().constrained("categories").null_on_delete();
        t.string("name", 255);
        t.string("slug", 255).unique();
        t.text("description").nullable();
        t.integer("sort_order").default(0);
        t.boolean("is_active").default(true);
        t.timestamps();
        t.soft_deletes();
        t.index(&["parent_id", "sort_order"]);
    }
);

create_table_migration!(
    CreateProductsTable,
    "2024_01_01_000300_create_products_table",
    "products",
    |t| {
        t.id();
        t.foreign_id("brand_id").nullable().constrained("brands").null_on_delete();
        t.foreign_id("category_id").nullable().constrained("categories").null_on_delete();
        t.string("name", 255);
        t.string("slug", 255).unique();
        t.string("sku", 100).unique();
        t.text("description").nullable();
        t.string("short_description", 500).nullable();
        t.decimal("price", 10, 2);
        t.decimal("compare_price", 10, 2).nullable();
        t.decimal("cost_price", 10, 2).nullable();
        t.integer("quantity").default(0);
        t.decimal("weight", 8, 2).nullable();
        t.enum_("status", &["draft", "active", "inactive", "archived"]).default("draft");
        t.boolean("is_featured").default(false);
        t.json("tags").nullable();
        t.string("meta_title", 255).nullable();
        t.string("meta_description", 500).nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["status", "is_featured"]);
        t.index(&["category_id", "status"]);
        t.check("products_price_non_negative", "\"price\" >= 0");
    }
);

create_table_migration!(
    CreateProductVariantsTable,
    "2024_01_01_000400_create_product_variants_table",
    "product_variants",
    |t| {
        t.id();
        t.foreign_id("product_id").constrained("products").cascade_on_delete();
        t.string("name", 255);
        t.string("sku", 100).unique();
        t.decimal("price", 10, 2).nullable();
        t.integer("quantity").default(0);
        t.json("options").nullable();
        t.boolean("is_default").default(false);
        t.timestamps();
    }
);

create_table_migration!(
    CreateProductAttributesTable,
    "2024_01_01_000500_create_product_attributes_table",
    "product_attributes",
    |t| {
        t.id();
        t.string("name", 255);
        t.string("slug", 255).unique();
        t.enum_("type", &["text", "select", "multiselect", "boolean", "number"]).default("text");
        t.boolean("is_filterable").default(false);
        t.timestamps();
    }
);

create_table_migration!(
    CreateProductAttributeValuesTable,
    "2024_01_01_000600_create_product_attribute_values_table",
    "product_attribute_values",
    |t| {
        t.id();
        t.foreign_id("attribute_id").constrained("product_attributes").cascade_on_delete();
        t.string("value", 255);
        t.string("slug", 255);
        t.integer("sort_order").default(0);
        t.timestamps();
        t.unique(&["attribute_id", "slug"]);
    }
);

create_table_migration!(
    CreateProductTagsTable,
    "2024_01_01_000700_create_product_tags_table",
    "product_tags",
    |t| {
        t.id();
        t.foreign_id("product_id").constrained("products").cascade_on_delete();
        t.string("name", 100);
        t.string("slug", 100);
        t.timestamps();
        t.unique(&["product_id", "slug"]);
    }
);

create_table_migration!(
    CreateProductMetasTable,
    "2024_01_01_000800_create_product_metas_table",
    "product_metas",
    |t| {
        t.id();
        t.foreign_id("product_id").constrained("products").cascade_on_delete();
        t.string("key", 100);
        t.text("value").nullable();
        t.timestamps();
        t.unique(&["product_id", "key"]);
    }
);

create_table_migration!(
    CreateProductDiscountsTable,
    "2024_01_01_000900_create_product_discounts_table",
    "product_discounts",
    |t| {
        t.id();
        t.foreign_id("product_id").constrained("products").cascade_on_delete();
        t.enum_("type", &["percentage", "fixed"]);
        t.decimal("value", 10, 2);
        t.date("starts_at");
        t.date("ends_at").nullable();
        t.unsigned_integer("min_quantity").nullable();
        t.boolean("is_active").default(true);
        t.timestamps();
        t.index(&["product_id", "is_active", "starts_at"]);
    }
);

create_table_migration!(
    CreateProductReviewsTable,
    "2024_01_01_001000_create_product_reviews_table",
    "product_reviews",
    |t| {
        t.id();
        t.foreign_id("product_id").constrained("products").cascade_on_delete();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.unsigned_integer("rating");
        t.string("title", 255).nullable();
        t.text("comment");
        t.enum_("status", &["pending", "approved", "rejected"]).default("pending");
        t.timestamps();
        t.index(&["product_id", "status"]);
        t.check("product_reviews_rating_range", "\"rating\" between 1 and 5");
    }
);

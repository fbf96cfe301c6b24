//! Changes to tables after their initial release.

use crate::{Migration, Schema, SchemaCommand};

pub struct AddFulltextIndexToProductsTable;

impl Migration for AddFulltextIndexToProductsTable {
    fn name(&self) -> &'static str {
        "2024_02_01_000100_add_fulltext_index_to_products_table"
    }

    fn up(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("products", |t| {
            t.fulltext(&["name", "description"]);
        })]
    }

    fn down(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("products", |t| {
            t.drop_index("products_name_description_fulltext");
        })]
    }
}

pub struct AddLoyaltyColumnsToCustomersTable;

impl Migration for AddLoyaltyColumnsToCustomersTable {
    fn name(&self) -> &'static str {
        "2024_02_01_000200_add_loyalty_columns_to_customers_table"
    }

    fn up(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("customers", |t| {
            t.integer("loyalty_points").default(0);
            t.decimal("lifetime_value", 12, 2).default(0);
            t.index(&["loyalty_points"]);
        })]
    }

    fn down(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("customers", |t| {
            t.drop_index("customers_loyalty_points_index");
            t.drop_column(&["loyalty_points", "lifetime_value"]);
        })]
    }
}

pub struct AddVerificationColumnsToProviderInsurancesTable;

impl Migration for AddVerificationColumnsToProviderInsurancesTable {
    fn name(&self) -> &'static str {
        "2024_02_01_000300_add_verification_columns_to_provider_insurances_table"
    }

    fn up(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("provider_insurances", |t| {
            t.timestamp("verified_at").nullable();
            t.foreign_id("verified_by").nullable().constrained("users").null_on_delete();
            t.text("verification_notes").nullable();
        })]
    }

    fn down(&self) -> Vec<SchemaCommand> {
        vec![Schema::table("provider_insurances", |t| {
            t.drop_foreign("verified_by");
            t.drop_column(&["verified_at", "verified_by", "verification_notes"]);
        })]
    }
}

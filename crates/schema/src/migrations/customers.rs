use crate::create_table_migration;

create_table_migration!(
    CreateCustomersTable,
    "2024_01_02_000100_create_customers_table",
    "customers",
    |t| {
        t.id();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.enum_("customer_type", &["individual", "business"]).default("individual");
        t.string("first_name", 100);
        t.string("last_name", 100);
        t.string("company_name", 255).nullable();
        t.string("email", 255).unique();
        t.string("phone", 30).nullable();
        t.date("date_of_birth").nullable();
        t.string("tax_number", 50).nullable();
        t.enum_("status", &["active", "inactive", "blocked"]).default("active");
        t.boolean("accepts_marketing").default(false);
        t.text("notes").nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["status", "customer_type"]);
        t.index(&["last_name", "first_name"]);
    }
);

create_table_migration!(
    CreateAddressesTable,
    "2024_01_02_000200_create_addresses_table",
    "addresses",
    |t| {
        t.id();
        t.foreign_id("customer_id").constrained("customers").cascade_on_delete();
        t.enum_("type", &["billing", "shipping"]);
        t.string("first_name", 100);
        t.string("last_name", 100);
        t.string("company", 255).nullable();
        t.string("address_line_1", 255);
        t.string("address_line_2", 255).nullable();
        t.string("city", 100);
        t.string("state", 100).nullable();
        t.string("postal_code", 20);
        t.string("country", 2);
        t.string("phone", 30).nullable();
        t.boolean("is_default").default(false);
        t.timestamps();
        t.index(&["customer_id", "type", "is_default"]);
    }
);

create_table_migration!(
    CreateCustomerSegmentsTable,
    "2024_01_02_000300_create_customer_segments_table",
    "customer_segments",
    |t| {
        t.id();
        t.string("name", 255);
        t.string("slug", 255).unique();
        t.text("description").nullable();
        t.json("criteria").nullable();
        t.boolean("is_active").default(true);
        t.timestamps();
    }
);

create_table_migration!(
    CreateCustomerCommunicationsTable,
    "2024_01_02_000400_create_customer_communications_table",
    "customer_communications",
    |t| {
        t.id();
        t.foreign_id("customer_id").constrained("customers").cascade_on_delete();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.enum_("channel", &["email", "phone", "sms", "chat", "in_person"]);
        t.enum_("direction", &["inbound", "outbound"]);
        t.string("subject", 255).nullable();
        t.text("content");
        t.timestamp("communicated_at");
        t.timestamps();
        t.index(&["customer_id", "communicated_at"]);
    }
);

create_table_migration!(
    CreateLoyaltyTransactionsTable,
    "2024_01_02_000500_create_loyalty_transactions_table",
    "loyalty_transactions",
    |t| {
        t.id();
        t.foreign_id("customer_id").constrained("customers").cascade_on_delete();
        t.unsigned_integer("order_id").nullable();
        t.enum_("type", &["earn", "redeem", "adjust", "expire"]);
        t.integer("points");
        t.integer("balance_after");
        t.string("description", 255).nullable();
        t.timestamps();
        t.index(&["customer_id", "created_at"]);
    }
);

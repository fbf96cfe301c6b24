use crate::create_table_migration;

create_table_migration!(
    CreateOrdersTable,
    "2024_01_03_000100_create_orders_table",
    "orders",
    |t| {
        t.id();
        t.string("order_number", 50).unique();
        t.foreign_id("customer_id").nullable().constrained("customers").null_on_delete();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.enum_(
            "status",
            &["pending", "processing", "shipped", "delivered", "cancelled", "returned", "refunded"],
        )
        .default("pending");
        t.enum_("payment_status", &["pending", "paid", "partially_refunded", "refunded", "failed"])
            .default("pending");
        t.string("currency", 3).default("USD");
        t.decimal("subtotal", 12, 2);
        t.decimal("discount_amount", 12, 2).default(0);
        t.decimal("tax_amount", 12, 2).default(0);
        t.decimal("shipping_amount", 12, 2).default(0);
        t.decimal("total", 12, 2);
        t.foreign_id("billing_address_id").nullable().constrained("addresses").null_on_delete();
        t.foreign_id("shipping_address_id").nullable().constrained("addresses").null_on_delete();
        t.string("shipping_method", 100).nullable();
        t.string("tracking_number", 100).nullable();
        t.text("notes").nullable();
        t.timestamp("shipped_at").nullable();
        t.timestamp("delivered_at").nullable();
        t.timestamp("cancelled_at").nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["status", "created_at"]);
        t.index(&["customer_id", "status"]);
    }
);

create_table_migration!(
    CreateOrderItemsTable,
    "2024_01_03_000200_create_order_items_table",
    "order_items",
    |t| {
        t.id();
        t.foreign_id("order_id").constrained("orders").cascade_on_delete();
        t.foreign_id("product_id").constrained("products").on_delete(crate::ReferentialAction::Restrict);
        t.foreign_id("variant_id").nullable().constrained("product_variants").null_on_delete();
        t.string("name", 255);
        t.string("sku", 100);
        t.unsigned_integer("quantity");
        t.decimal("unit_price", 10, 2);
        t.decimal("total", 12, 2);
        t.timestamps();
    }
);

create_table_migration!(
    CreateOrderStatusHistoriesTable,
    "2024_01_03_000300_create_order_status_histories_table",
    "order_status_histories",
    |t| {
        t.id();
        t.foreign_id("order_id").constrained("orders").cascade_on_delete();
        t.string("from_status", 50).nullable();
        t.string("to_status", 50);
        t.text("comment").nullable();
        t.foreign_id("user_id").nullable().constrained("users").null_on_delete();
        t.boolean("notify_customer").default(true);
        t.timestamp("created_at").nullable();
        t.index(&["order_id", "created_at"]);
    }
);

create_table_migration!(
    CreateShipmentsTable,
    "2024_01_03_000400_create_shipments_table",
    "shipments",
    |t| {
        t.id();
        t.foreign_id("order_id").constrained("orders").cascade_on_delete();
        t.string("carrier", 100);
        t.string("tracking_number", 100).nullable().index();
        t.enum_("status", &["pending", "shipped", "in_transit", "delivered", "returned"]).default("pending");
        t.timestamp("shipped_at").nullable();
        t.timestamp("delivered_at").nullable();
        t.text("notes").nullable();
        t.timestamps();
    }
);

create_table_migration!(
    CreateShipmentItemsTable,
    "2024_01_03_000500_create_shipment_items_table",
    "shipment_items",
    |t| {
        t.id();
        t.foreign_id("shipment_id").constrained("shipments").cascade_on_delete();
        t.foreign_id("order_item_id").constrained("order_items").cascade_on_delete();
        t.unsigned_integer("quantity");
        t.timestamps();
        t.unique(&["shipment_id", "order_item_id"]);
    }
);

create_table_migration!(
    CreateTransactionsTable,
    "2024_01_03_000600_create_transactions_table",
    "transactions",
    |t| {
        t.id();
        t.foreign_id("order_id").constrained("orders").cascade_on_delete();
        t.enum_("type", &["payment", "refund"]);
        t.enum_("status", &["pending", "completed", "failed"]).default("pending");
        t.decimal("amount", 12, 2);
        t.string("currency", 3);
        t.string("gateway", 50).nullable();
        t.string("reference", 255).nullable().unique();
        t.text("notes").nullable();
        t.timestamp("processed_at").nullable();
        t.timestamps();
        t.index(&["order_id", "type", "status"]);
    }
);

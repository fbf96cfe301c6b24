use crate::create_table_migration;

create_table_migration!(
    CreateUsersTable,
    "2024_01_01_000000_create_users_table",
    "users",
    |t| {
        t.id();
        t.string("name", 255);
        t.string("email", 255).unique();
        t.timestamp("email_verified_at").nullable();
        t.string("password", 255);
        t.string("remember_token", 100).nullable();
        t.timestamps();
    }
);

create_table_migration!(
    CreateUserSubscriptionsTable,
    "2024_01_06_000100_create_user_subscriptions_table",
    "user_subscriptions",
    |t| {
        t.id();
        t.foreign_id("user_id").constrained("users").cascade_on_delete();
        t.enum_("plan", &["basic", "standard", "premium", "enterprise"]);
        t.enum_("status", &["trialing", "active", "paused", "cancelled", "expired"]).default("active");
        t.decimal("price", 10, 2);
        t.enum_("billing_cycle", &["monthly", "quarterly", "yearly"]).default("monthly");
        t.date("starts_at");
        t.date("trial_ends_at").nullable();
        t.date("ends_at").nullable();
        t.timestamp("cancelled_at").nullable();
        t.string("cancellation_reason", 500).nullable();
        t.boolean("auto_renew").default(true);
        t.timestamps();
        t.index(&["user_id", "status"]);
    }
);

create_table_migration!(
    /// In-app notification records, one row per recipient.
    CreateNotificationsTable,
    "2024_01_06_000200_create_notifications_table",
    "notifications",
    |t| {
        t.uuid("id").primary();
        t.string("type", 255);
        t.morphs("notifiable");
        t.json("data");
        t.timestamp("read_at").nullable();
        t.timestamps();
    }
);

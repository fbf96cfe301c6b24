use crate::create_table_migration;

create_table_migration!(
    CreateProvidersTable,
    "2024_01_05_000100_create_providers_table",
    "providers",
    |t| {
        t.id();
        t.string("name", 255);
        t.string("email", 255).unique();
        t.string("phone", 30).nullable();
        t.enum_(
            "provider_type",
            &["supplier", "manufacturer", "distributor", "contractor", "consultant", "service_provider"],
        );
        t.enum_("status", &["pending", "active", "inactive", "suspended"]).default("pending");
        t.string("status_reason", 500).nullable();
        t.string("tax_id", 50).nullable();
        t.string("website", 255).nullable();
        t.string("contact_person", 255).nullable();
        t.text("description").nullable();
        t.string("address_line_1", 255).nullable();
        t.string("city", 100).nullable();
        t.string("state", 100).nullable();
        t.string("postal_code", 20).nullable();
        t.string("country", 2).nullable();
        t.decimal("rating", 3, 2).nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["status", "provider_type"]);
    }
);

create_table_migration!(
    CreateProviderInsurancesTable,
    "2024_01_05_000200_create_provider_insurances_table",
    "provider_insurances",
    |t| {
        t.id();
        t.foreign_id("provider_id").constrained("providers").cascade_on_delete();
        t.enum_(
            "insurance_type",
            &[
                "general_liability",
                "professional_liability",
                "workers_compensation",
                "property",
                "commercial_auto",
                "cyber",
            ],
        );
        t.string("policy_number", 100).unique();
        t.string("insurer_name", 255);
        t.decimal("coverage_amount", 15, 2);
        t.decimal("deductible", 15, 2).nullable();
        t.date("effective_date");
        t.date("expiry_date");
        t.enum_("status", &["pending", "active", "expired", "suspended", "revoked"]).default("pending");
        t.string("document_url", 500).nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["provider_id", "status"]);
        t.index(&["expiry_date"]);
    }
);

create_table_migration!(
    CreateProviderCertificationsTable,
    "2024_01_05_000300_create_provider_certifications_table",
    "provider_certifications",
    |t| {
        t.id();
        t.foreign_id("provider_id").constrained("providers").cascade_on_delete();
        t.string("name", 255);
        t.string("issuing_authority", 255);
        t.string("certification_number", 100).unique();
        t.date("issued_date");
        t.date("expiry_date").nullable();
        t.enum_("status", &["active", "expired", "suspended", "revoked"]).default("active");
        t.string("status_reason", 500).nullable();
        t.boolean("is_recurring").default(false);
        t.unsigned_integer("renewal_period_months").nullable();
        t.string("document_url", 500).nullable();
        t.timestamps();
        t.soft_deletes();
        t.index(&["provider_id", "status"]);
        t.index(&["expiry_date"]);
        t.check(
            "provider_certifications_renewal_period_range",
            "\"renewal_period_months\" is null or \"renewal_period_months\" between 1 and 120",
        );
    }
);

create_table_migration!(
    CreateProviderPerformancesTable,
    "2024_01_05_000400_create_provider_performances_table",
    "provider_performances",
    |t| {
        t.id();
        t.foreign_id("provider_id").constrained("providers").cascade_on_delete();
        t.date("period_start");
        t.date("period_end");
        t.decimal("quality_score", 5, 2);
        t.decimal("delivery_score", 5, 2);
        t.decimal("communication_score", 5, 2);
        t.decimal("cost_score", 5, 2);
        t.decimal("overall_score", 5, 2);
        t.unsigned_integer("on_time_deliveries").default(0);
        t.unsigned_integer("total_deliveries").default(0);
        t.text("notes").nullable();
        t.foreign_id("evaluated_by").nullable().constrained("users").null_on_delete();
        t.timestamps();
        t.unique(&["provider_id", "period_start", "period_end"]);
    }
);

create_table_migration!(
    CreateProviderLocationsTable,
    "2024_01_05_000500_create_provider_locations_table",
    "provider_locations",
    |t| {
        t.id();
        t.foreign_id("provider_id").constrained("providers").cascade_on_delete();
        t.string("name", 255);
        t.string("address_line_1", 255);
        t.string("address_line_2", 255).nullable();
        t.string("city", 100);
        t.string("state", 100).nullable();
        t.string("postal_code", 20).nullable();
        t.string("country", 2);
        t.decimal("latitude", 10, 8).nullable();
        t.decimal("longitude", 11, 8).nullable();
        t.decimal("service_radius_km", 8, 2).nullable();
        t.string("phone", 30).nullable();
        t.boolean("is_primary").default(false);
        t.timestamps();
        t.index(&["provider_id", "is_primary"]);
        t.index(&["latitude", "longitude"]);
    }
);

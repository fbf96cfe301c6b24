use tradeerp_auth::Permission;
use tradeerp_validation::{Attributes, DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{NewProviderLocation, NewProviderPerformance, Provider};

const SCORES: [&str; 4] = ["quality_score", "delivery_score", "communication_score", "cost_score"];

pub struct StoreProviderPerformanceRequest {
    pub provider: Provider,
}

impl FormRequest for StoreProviderPerformanceRequest {
    type Output = NewProviderPerformance;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.manage_performance"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("on_time_deliveries", 0);
        input.default("total_deliveries", 0);
    }

    fn rules(&self) -> Rules {
        let score = || [Rule::Required, Rule::Numeric, Rule::Between(0.0, 100.0)];
        SCORES
            .iter()
            .fold(Rules::new(), |rules, field| rules.field(*field, score()))
            .field("overall_score", [Rule::Nullable, Rule::Numeric, Rule::Between(0.0, 100.0)])
            .field("period_start", [Rule::Required, Rule::Date])
            .field("period_end", [Rule::Required, Rule::Date, Rule::After(DateRef::Field("period_start"))])
            .field("on_time_deliveries", [Rule::Integer, Rule::Between(0.0, f64::from(u32::MAX))])
            .field("total_deliveries", [Rule::Integer, Rule::Between(0.0, f64::from(u32::MAX))])
            .field("notes", [Rule::Nullable, Rule::String, Rule::Max(2000.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("period_end.after", "The review period must end after it starts.")
            .with("between", "The :attribute must be between 0 and 100.")
    }

    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("quality_score", "quality score")
            .with("delivery_score", "delivery score")
            .with("communication_score", "communication score")
            .with("cost_score", "cost score")
            .with("overall_score", "overall score")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("on_time_deliveries") || errors.has("total_deliveries") {
            return;
        }
        let on_time = input.get_f64("on_time_deliveries").unwrap_or(0.0);
        let total = input.get_f64("total_deliveries").unwrap_or(0.0);
        if on_time > total {
            errors.add(
                "on_time_deliveries",
                "On-time deliveries cannot exceed the total number of deliveries.",
            );
        }
    }
}

pub struct StoreProviderLocationRequest {
    pub provider: Provider,
}

impl FormRequest for StoreProviderLocationRequest {
    type Output = NewProviderLocation;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.manage_locations"))
    }

    fn prepare(&self, input: &mut Input) {
        input.uppercase("country");
        input.default("is_primary", false);
        input.coerce_bool("is_primary");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("address_line_1", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("address_line_2", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("city", [Rule::Required, Rule::String, Rule::Max(100.0)])
            .field("state", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("postal_code", [Rule::Nullable, Rule::String, Rule::Max(20.0)])
            .field("country", [Rule::Required, Rule::String, Rule::Min(2.0), Rule::Max(2.0)])
            .field(
                "latitude",
                [Rule::RequiredWith("longitude"), Rule::Nullable, Rule::Numeric, Rule::Between(-90.0, 90.0)],
            )
            .field(
                "longitude",
                [Rule::RequiredWith("latitude"), Rule::Nullable, Rule::Numeric, Rule::Between(-180.0, 180.0)],
            )
            .field("service_radius_km", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("is_primary", [Rule::Boolean])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("latitude.between", "The latitude must be between -90 and 90 degrees.")
            .with("longitude.between", "The longitude must be between -180 and 180 degrees.")
            .with("country.max", "Use the two-letter ISO country code.")
            .with("country.min", "Use the two-letter ISO country code.")
    }
}

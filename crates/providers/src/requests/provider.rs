use tradeerp_auth::Permission;
use tradeerp_core::Lifecycle;
use tradeerp_validation::{Attributes, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    BulkProviderAction, BulkProviderOperation, NewProvider, Provider, ProviderChanges, ProviderStatus,
    ProviderStatusChange, ProviderType,
};

fn provider_messages() -> Messages {
    Messages::new()
        .with("email.unique", "A provider with this email address already exists.")
        .with("country.max", "Use the two-letter ISO country code.")
}

fn normalize_provider(input: &mut Input) {
    input.lowercase("email");
    input.lowercase("provider_type");
    input.uppercase("country");
}

pub struct StoreProviderRequest;

impl FormRequest for StoreProviderRequest {
    type Output = NewProvider;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.create"))
    }

    fn prepare(&self, input: &mut Input) {
        normalize_provider(input);
        input.lowercase("status");
        input.default("status", ProviderStatus::Pending.as_str());
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("email", [Rule::Required, Rule::Email, Rule::Max(255.0), Rule::unique("providers", "email")])
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("provider_type", [Rule::Required, Rule::In(ProviderType::VALUES)])
            .field("status", [Rule::Required, Rule::In(ProviderStatus::VALUES)])
            .field("tax_id", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field("website", [Rule::Nullable, Rule::Url, Rule::Max(255.0)])
            .field("contact_person", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(2000.0)])
            .field("address_line_1", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("city", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("state", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("postal_code", [Rule::Nullable, Rule::String, Rule::Max(20.0)])
            .field("country", [Rule::Nullable, Rule::String, Rule::Min(2.0), Rule::Max(2.0)])
    }

    fn messages(&self) -> Messages {
        provider_messages()
    }

    fn attributes(&self) -> Attributes {
        Attributes::new().with("provider_type", "provider type").with("tax_id", "tax ID")
    }
}

pub struct UpdateProviderRequest {
    pub provider: Provider,
}

impl FormRequest for UpdateProviderRequest {
    type Output = ProviderChanges;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.update"))
    }

    fn prepare(&self, input: &mut Input) {
        normalize_provider(input);
    }

    fn rules(&self) -> Rules {
        let id = self.provider.id.get();
        Rules::new()
            .field("name", [Rule::Sometimes, Rule::Required, Rule::String, Rule::Max(255.0)])
            .field(
                "email",
                [Rule::Sometimes, Rule::Required, Rule::Email, Rule::unique_ignoring("providers", "email", id)],
            )
            .field("phone", [Rule::Nullable, Rule::String, Rule::Max(30.0)])
            .field("provider_type", [Rule::Sometimes, Rule::In(ProviderType::VALUES)])
            .field("tax_id", [Rule::Nullable, Rule::String, Rule::Max(50.0)])
            .field("website", [Rule::Nullable, Rule::Url, Rule::Max(255.0)])
            .field("contact_person", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("description", [Rule::Nullable, Rule::String, Rule::Max(2000.0)])
            .field("address_line_1", [Rule::Nullable, Rule::String, Rule::Max(255.0)])
            .field("city", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("state", [Rule::Nullable, Rule::String, Rule::Max(100.0)])
            .field("postal_code", [Rule::Nullable, Rule::String, Rule::Max(20.0)])
            .field("country", [Rule::Nullable, Rule::String, Rule::Min(2.0), Rule::Max(2.0)])
    }

    fn messages(&self) -> Messages {
        provider_messages()
    }
}

pub struct ToggleProviderStatusRequest {
    pub provider: Provider,
}

impl FormRequest for ToggleProviderStatusRequest {
    type Output = ProviderStatusChange;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("status", [Rule::Required, Rule::In(&["active", "inactive", "suspended"])])
            .field("reason", [Rule::RequiredIf("status", &["suspended"]), Rule::Nullable, Rule::String, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new().with("reason.required_if", "A reason is required when suspending a provider.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("status") {
            return;
        }
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<ProviderStatus>().ok()) else {
            return;
        };
        let current = self.provider.status;
        if target == current {
            errors.add("status", format!("The provider is already {}.", target.as_str()));
        } else if !current.can_transition_to(target) {
            errors.add(
                "status",
                format!("Cannot change provider status from {} to {}.", current.as_str(), target.as_str()),
            );
        }
    }
}

pub struct BulkProviderRequest;

impl FormRequest for BulkProviderRequest {
    type Output = BulkProviderOperation;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.bulk_update"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("action");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("action", [Rule::Required, Rule::In(BulkProviderAction::VALUES)])
            .field("ids", [Rule::Required, Rule::Array, Rule::Min(1.0), Rule::Max(100.0)])
            .field("ids.*", [Rule::Required, Rule::Integer, Rule::Distinct, Rule::exists("providers", "id")])
            .field("reason", [Rule::RequiredIf("action", &["suspend"]), Rule::Nullable, Rule::String, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("ids.max", "No more than 100 providers can be changed at once.")
            .with("ids.*.exists", "One of the selected providers does not exist.")
            .with("reason.required_if", "A reason is required when suspending providers.")
    }
}

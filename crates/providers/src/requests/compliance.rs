use tradeerp_auth::Permission;
use tradeerp_core::Lifecycle;
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    CertificationStatus, CertificationStatusUpdate, InsuranceStatus, InsuranceType, InsuranceVerification,
    NewProviderCertification, NewProviderInsurance, Provider, ProviderCertification, ProviderInsurance,
    ProviderStatus,
};

fn reject_suspended(provider: &Provider, errors: &mut ValidationErrors) {
    if provider.status == ProviderStatus::Suspended {
        errors.add("provider", "Suspended providers cannot receive new compliance records.");
    }
}

pub struct StoreProviderInsuranceRequest {
    pub provider: Provider,
}

impl FormRequest for StoreProviderInsuranceRequest {
    type Output = NewProviderInsurance;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.manage_insurance"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("insurance_type");
        input.uppercase("policy_number");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("insurance_type", [Rule::Required, Rule::In(InsuranceType::VALUES)])
            .field(
                "policy_number",
                [Rule::Required, Rule::String, Rule::Max(100.0), Rule::unique("provider_insurances", "policy_number")],
            )
            .field("insurer_name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("coverage_amount", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("deductible", [Rule::Nullable, Rule::Numeric, Rule::Min(0.0)])
            .field("effective_date", [Rule::Required, Rule::Date])
            .field("expiry_date", [Rule::Required, Rule::Date, Rule::After(DateRef::Field("effective_date"))])
            .field("document_url", [Rule::Nullable, Rule::Url, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("policy_number.unique", "This policy number has already been registered.")
            .with("expiry_date.after", "The expiry date must be after the effective date.")
            .with("coverage_amount.min", "The coverage amount cannot be negative.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        reject_suspended(&self.provider, errors);
        if errors.has("deductible") || errors.has("coverage_amount") {
            return;
        }
        if let (Some(deductible), Some(coverage)) = (input.get_f64("deductible"), input.get_f64("coverage_amount")) {
            if deductible > coverage {
                errors.add("deductible", "The deductible cannot exceed the coverage amount.");
            }
        }
    }
}

pub struct VerifyProviderInsuranceRequest {
    pub insurance: ProviderInsurance,
}

impl FormRequest for VerifyProviderInsuranceRequest {
    type Output = InsuranceVerification;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.verify_insurance"))
    }

    fn forbidden_message(&self) -> &'static str {
        "You are not authorized to verify insurance policies."
    }

    fn prepare(&self, input: &mut Input) {
        input.default("status", InsuranceStatus::Active.as_str());
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("status", [Rule::Required, Rule::In(&["active", "expired", "suspended", "revoked"])])
            .field(
                "verification_notes",
                [Rule::RequiredIf("status", &["suspended", "revoked"]), Rule::Nullable, Rule::String, Rule::Max(1000.0)],
            )
    }

    fn messages(&self) -> Messages {
        Messages::new().with(
            "verification_notes.required_if",
            "Please explain why the policy is being :value.",
        )
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("status") {
            return;
        }
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<InsuranceStatus>().ok()) else {
            return;
        };
        let current = self.insurance.status;
        if target == current {
            errors.add("status", format!("The policy is already {}.", target.as_str()));
        } else if !current.can_transition_to(target) {
            errors.add(
                "status",
                format!("Cannot change insurance status from {} to {}.", current.as_str(), target.as_str()),
            );
        }
    }
}

pub struct StoreProviderCertificationRequest {
    pub provider: Provider,
}

impl FormRequest for StoreProviderCertificationRequest {
    type Output = NewProviderCertification;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.manage_certifications"))
    }

    fn prepare(&self, input: &mut Input) {
        input.default("is_recurring", false);
        input.coerce_bool("is_recurring");
        input.uppercase("certification_number");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("name", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field("issuing_authority", [Rule::Required, Rule::String, Rule::Max(255.0)])
            .field(
                "certification_number",
                [
                    Rule::Required,
                    Rule::String,
                    Rule::Max(100.0),
                    Rule::unique("provider_certifications", "certification_number"),
                ],
            )
            .field("issued_date", [Rule::Required, Rule::Date, Rule::BeforeOrEqual(DateRef::Today)])
            .field("expiry_date", [Rule::Nullable, Rule::Date, Rule::After(DateRef::Field("issued_date"))])
            .field("is_recurring", [Rule::Boolean])
            .field(
                "renewal_period_months",
                [Rule::RequiredIf("is_recurring", &["true"]), Rule::Nullable, Rule::Integer, Rule::Between(1.0, 120.0)],
            )
            .field("document_url", [Rule::Nullable, Rule::Url, Rule::Max(500.0)])
    }

    fn messages(&self) -> Messages {
        Messages::new()
            .with("issued_date.before_or_equal", "The issue date cannot be in the future.")
            .with("renewal_period_months.required_if", "Recurring certifications need a renewal period.")
            .with("renewal_period_months.between", "The renewal period must be between 1 and 120 months.")
    }

    fn after(&self, _input: &Input, errors: &mut ValidationErrors) {
        reject_suspended(&self.provider, errors);
    }
}

pub struct UpdateCertificationStatusRequest {
    pub certification: ProviderCertification,
}

impl FormRequest for UpdateCertificationStatusRequest {
    type Output = CertificationStatusUpdate;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("providers.manage_certifications"))
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("status");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("status", [Rule::Required, Rule::In(CertificationStatus::VALUES)])
            .field(
                "reason",
                [Rule::RequiredIf("status", &["revoked", "suspended"]), Rule::Nullable, Rule::String, Rule::Max(500.0)],
            )
    }

    fn messages(&self) -> Messages {
        Messages::new().with("reason.required_if", "A reason is required when a certification is :value.")
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("status") {
            return;
        }
        let Some(target) = input.get_str("status").and_then(|s| s.parse::<CertificationStatus>().ok()) else {
            return;
        };
        let current = self.certification.status;
        if target == current {
            errors.add("status", format!("The certification is already {}.", target.as_str()));
        } else if !current.can_transition_to(target) {
            errors.add(
                "status",
                format!("Cannot change certification status from {} to {}.", current.as_str(), target.as_str()),
            );
        }
    }
}


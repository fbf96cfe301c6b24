//! Form requests for providers and their compliance records.

mod compliance;
mod operations;
mod provider;

pub use compliance::{
    StoreProviderCertificationRequest, StoreProviderInsuranceRequest, UpdateCertificationStatusRequest,
    VerifyProviderInsuranceRequest,
};
pub use operations::{StoreProviderLocationRequest, StoreProviderPerformanceRequest};
pub use provider::{BulkProviderRequest, StoreProviderRequest, ToggleProviderStatusRequest, UpdateProviderRequest};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use tradeerp_auth::{Permission, Principal};
    use tradeerp_core::TenantId;
    use tradeerp_validation::{process_as_of, FormRequest, InMemoryPresenceVerifier, RequestError};

    use super::*;
    use crate::compliance::tests::{certification, insurance};
    use crate::provider::tests::provider;
    use crate::{
        BulkProviderAction, CertificationStatus, InsuranceStatus, InsuranceType, ProviderId, ProviderStatus,
        ProviderType,
    };

    fn manager() -> Principal {
        Principal::with_permissions(TenantId::new(), [Permission::new("providers.*")])
    }

    fn store() -> InMemoryPresenceVerifier {
        InMemoryPresenceVerifier::new()
            .with_row("providers", 1, json!({"email": "p1@acme.test"}))
            .with_row("providers", 2, json!({"email": "p2@acme.test"}))
            .with_row("provider_insurances", 1, json!({"policy_number": "GL-1"}))
            .with_row("provider_certifications", 1, json!({"certification_number": "ISO-42"}))
    }

    async fn run_as<R: FormRequest>(
        request: &R,
        principal: &Principal,
        body: Value,
    ) -> Result<R::Output, RequestError> {
        process_as_of(request, principal, body, &store(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()).await
    }

    async fn run<R: FormRequest>(request: &R, body: Value) -> Result<R::Output, RequestError> {
        run_as(request, &manager(), body).await
    }

    #[tokio::test]
    async fn new_providers_start_pending_with_normalized_contact() {
        let out = run(
            &StoreProviderRequest,
            json!({"name": "Northwind", "email": "Sales@Northwind.test", "provider_type": "Distributor", "country": "gb"}),
        )
        .await
        .unwrap();
        assert_eq!(out.status, ProviderStatus::Pending);
        assert_eq!(out.email, "sales@northwind.test");
        assert_eq!(out.provider_type, ProviderType::Distributor);
        assert_eq!(out.country.as_deref(), Some("GB"));

        let err = run(&StoreProviderRequest, json!({"name": "Dup", "email": "p1@acme.test", "provider_type": "supplier"}))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("email"),
            Some("A provider with this email address already exists.")
        );
    }

    #[tokio::test]
    async fn updates_may_keep_their_own_email() {
        let request = UpdateProviderRequest { provider: provider(1, ProviderStatus::Active) };
        let out = run(&request, json!({"email": "p1@acme.test", "city": "Leeds"})).await.unwrap();
        assert_eq!(out.city.as_deref(), Some("Leeds"));
        assert!(run(&request, json!({"email": "p2@acme.test"})).await.is_err());
    }

    #[tokio::test]
    async fn suspension_needs_a_reason_and_a_legal_transition() {
        let request = ToggleProviderStatusRequest { provider: provider(1, ProviderStatus::Active) };
        let err = run(&request, json!({"status": "Suspended"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("reason"),
            Some("A reason is required when suspending a provider.")
        );
        let out = run(&request, json!({"status": "suspended", "reason": "Audit"})).await.unwrap();
        assert_eq!(out.status, ProviderStatus::Suspended);

        let pending = ToggleProviderStatusRequest { provider: provider(2, ProviderStatus::Pending) };
        let err = run(&pending, json!({"status": "suspended", "reason": "Audit"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("status"),
            Some("Cannot change provider status from pending to suspended.")
        );
    }

    #[tokio::test]
    async fn bulk_actions_validate_ids_and_reason() {
        let out = run(&BulkProviderRequest, json!({"action": "Activate", "ids": ["1", 2]})).await.unwrap();
        assert_eq!(out.action, BulkProviderAction::Activate);
        assert_eq!(out.ids, vec![ProviderId(1), ProviderId(2)]);

        let err = run(&BulkProviderRequest, json!({"action": "suspend", "ids": [1, 1, 9]})).await.unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has("ids.0"));
        assert_eq!(errors.first("ids.2"), Some("One of the selected providers does not exist."));
        assert_eq!(errors.first("reason"), Some("A reason is required when suspending providers."));
    }

    #[tokio::test]
    async fn insurance_dates_and_policy_numbers_are_checked() {
        let request = StoreProviderInsuranceRequest { provider: provider(1, ProviderStatus::Active) };
        let err = run(
            &request,
            json!({
                "insurance_type": "general_liability", "policy_number": "gl-1", "insurer_name": "Mutual",
                "coverage_amount": -5, "effective_date": "2025-01-01", "expiry_date": "2025-01-01"
            }),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("policy_number"), Some("This policy number has already been registered."));
        assert_eq!(errors.first("expiry_date"), Some("The expiry date must be after the effective date."));
        assert_eq!(errors.first("coverage_amount"), Some("The coverage amount cannot be negative."));

        let out = run(
            &request,
            json!({
                "insurance_type": "Cyber", "policy_number": "cy-9", "insurer_name": "Mutual",
                "coverage_amount": "250000", "deductible": 1000, "effective_date": "2025-01-01",
                "expiry_date": "2026-01-01"
            }),
        )
        .await
        .unwrap();
        assert_eq!(out.insurance_type, InsuranceType::Cyber);
        assert_eq!(out.policy_number, "CY-9");
    }

    #[tokio::test]
    async fn verification_follows_the_insurance_lifecycle() {
        let pending = VerifyProviderInsuranceRequest { insurance: insurance(InsuranceStatus::Pending) };
        let out = run(&pending, json!({})).await.unwrap();
        assert_eq!(out.status, InsuranceStatus::Active);

        let err = run(&pending, json!({"status": "revoked", "verification_notes": "Forged"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("status"),
            Some("Cannot change insurance status from pending to revoked.")
        );

        let active = VerifyProviderInsuranceRequest { insurance: insurance(InsuranceStatus::Active) };
        let err = run(&active, json!({"status": "suspended"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("verification_notes"),
            Some("Please explain why the policy is being suspended.")
        );

        let viewer = Principal::with_permissions(TenantId::new(), [Permission::new("providers.view")]);
        let err = run_as(&pending, &viewer, json!({})).await.unwrap_err();
        assert!(matches!(err, RequestError::Forbidden(m) if m == "You are not authorized to verify insurance policies."));
    }

    #[tokio::test]
    async fn recurring_certifications_need_a_renewal_period() {
        let request = StoreProviderCertificationRequest { provider: provider(1, ProviderStatus::Active) };
        let base = json!({
            "name": "ISO 14001", "issuing_authority": "BSI", "certification_number": "iso-77",
            "issued_date": "2025-02-01", "is_recurring": "yes"
        });
        let err = run(&request, base.clone()).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("renewal_period_months"),
            Some("Recurring certifications need a renewal period.")
        );

        let mut too_long = base.clone();
        too_long["renewal_period_months"] = json!(121);
        let err = run(&request, too_long).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("renewal_period_months"),
            Some("The renewal period must be between 1 and 120 months.")
        );

        let mut ok = base;
        ok["renewal_period_months"] = json!("24");
        let out = run(&request, ok).await.unwrap();
        assert!(out.is_recurring);
        assert_eq!(out.renewal_period_months, Some(24));
        assert_eq!(out.certification_number, "ISO-77");

        let one_off = run(
            &request,
            json!({"name": "Gas Safe", "issuing_authority": "HSE", "certification_number": "GS-1", "issued_date": "2025-01-01"}),
        )
        .await
        .unwrap();
        assert!(!one_off.is_recurring);
    }

    #[tokio::test]
    async fn suspended_providers_cannot_add_certifications() {
        let request = StoreProviderCertificationRequest { provider: provider(1, ProviderStatus::Suspended) };
        let err = run(
            &request,
            json!({"name": "Gas Safe", "issuing_authority": "HSE", "certification_number": "GS-2", "issued_date": "2025-01-01"}),
        )
        .await
        .unwrap_err();
        assert!(err.validation_errors().unwrap().has("provider"));
    }

    #[tokio::test]
    async fn certification_status_changes_need_reasons() {
        let request = UpdateCertificationStatusRequest {
            certification: certification(CertificationStatus::Active, None),
        };
        let err = run(&request, json!({"status": "revoked"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("reason"),
            Some("A reason is required when a certification is revoked.")
        );
        let out = run(&request, json!({"status": "Suspended", "reason": "Lapsed audit"})).await.unwrap();
        assert_eq!(out.status, CertificationStatus::Suspended);

        let revoked = UpdateCertificationStatusRequest {
            certification: certification(CertificationStatus::Revoked, None),
        };
        let err = run(&revoked, json!({"status": "active"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("status"),
            Some("Cannot change certification status from revoked to active.")
        );
    }

    #[tokio::test]
    async fn performance_scores_are_bounded() {
        let request = StoreProviderPerformanceRequest { provider: provider(1, ProviderStatus::Active) };
        let err = run(
            &request,
            json!({
                "quality_score": 101, "delivery_score": 80, "communication_score": 80, "cost_score": 80,
                "period_start": "2025-03-31", "period_end": "2025-01-01",
                "on_time_deliveries": 5, "total_deliveries": 4
            }),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.first("quality_score"), Some("The quality score must be between 0 and 100."));
        assert_eq!(errors.first("period_end"), Some("The review period must end after it starts."));
        assert!(errors.has("on_time_deliveries"));

        let out = run(
            &request,
            json!({
                "quality_score": "90", "delivery_score": 85, "communication_score": 70, "cost_score": 66,
                "period_start": "2025-01-01", "period_end": "2025-03-31"
            }),
        )
        .await
        .unwrap();
        assert_eq!(out.quality_score, 90.0);
        assert_eq!(out.total_deliveries, 0);
        assert_eq!(out.overall_score, None);

        let err = run(
            &request,
            json!({
                "quality_score": 90, "delivery_score": 85, "communication_score": 70, "cost_score": 66,
                "period_start": "2025-01-01", "period_end": "2025-03-31",
                "on_time_deliveries": 1, "total_deliveries": 5_000_000_000u64
            }),
        )
        .await
        .unwrap_err();
        assert!(err.validation_errors().unwrap().has("total_deliveries"));
    }

    #[tokio::test]
    async fn coordinates_come_in_pairs_and_within_range() {
        let request = StoreProviderLocationRequest { provider: provider(1, ProviderStatus::Active) };
        let base = json!({"name": "Depot", "address_line_1": "1 Quay", "city": "London", "country": "gb"});

        let mut half = base.clone();
        half["latitude"] = json!(51.5);
        let err = run(&request, half).await.unwrap_err();
        assert!(err.validation_errors().unwrap().has("longitude"));

        let mut out_of_range = base.clone();
        out_of_range["latitude"] = json!(91);
        out_of_range["longitude"] = json!(-181);
        let errors = run(&request, out_of_range).await.unwrap_err();
        let errors = errors.validation_errors().unwrap();
        assert_eq!(errors.first("latitude"), Some("The latitude must be between -90 and 90 degrees."));
        assert_eq!(errors.first("longitude"), Some("The longitude must be between -180 and 180 degrees."));

        let mut ok = base;
        ok["latitude"] = json!("51.5074");
        ok["longitude"] = json!(-0.1278);
        ok["is_primary"] = json!("on");
        let out = run(&request, ok).await.unwrap();
        assert_eq!(out.country, "GB");
        assert!(out.is_primary);
        assert_eq!(out.latitude, Some(51.5074));
    }
}

//! Form requests for customer, engagement and subscription endpoints.

mod customer;
mod engagement;
mod subscription;

pub use customer::{CustomerStoreRequest, CustomerUpdateRequest, StoreAddressRequest};
pub use engagement::{
    StoreCustomerCommunicationRequest, StoreCustomerSegmentRequest, StoreLoyaltyTransactionRequest,
};
pub use subscription::{StoreUserSubscriptionRequest, UpdateUserSubscriptionRequest};

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use tradeerp_auth::{Permission, Principal};
    use tradeerp_core::TenantId;
    use tradeerp_validation::{process_as_of, FormRequest, InMemoryPresenceVerifier, RequestError};

    use super::*;
    use crate::customer::tests::customer;
    use crate::subscription::tests::subscription;
    use crate::{CustomerType, LoyaltyType, SubscriptionStatus};

    fn staff() -> Principal {
        Principal::with_permissions(
            TenantId::new(),
            [Permission::new("customers.*"), Permission::new("subscriptions.*")],
        )
    }

    fn shopper(user_id: i64) -> Principal {
        Principal::with_permissions(TenantId::new(), [Permission::new("subscriptions.create")])
            .acting_as(user_id)
    }

    fn store() -> InMemoryPresenceVerifier {
        InMemoryPresenceVerifier::new()
            .with_row("users", 5, json!({"email": "five@example.com"}))
            .with_row("users", 6, json!({"email": "six@example.com"}))
            .with_row("customers", 1, json!({"email": "taken@example.com"}))
    }

    async fn run<R: FormRequest>(request: &R, principal: &Principal, body: Value) -> Result<R::Output, RequestError> {
        process_as_of(request, principal, body, &store(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()).await
    }

    #[tokio::test]
    async fn customer_type_defaults_to_individual() {
        let out = run(
            &CustomerStoreRequest,
            &staff(),
            json!({"first_name": "Grace", "last_name": "Hopper", "email": " Grace@Navy.MIL "}),
        )
        .await
        .unwrap();
        assert_eq!(out.customer_type, CustomerType::Individual);
        assert_eq!(out.email, "grace@navy.mil");
        assert!(!out.accepts_marketing);
    }

    #[tokio::test]
    async fn business_customers_need_a_company_and_unique_email() {
        let err = run(
            &CustomerStoreRequest,
            &staff(),
            json!({"customer_type": "business", "first_name": "A", "last_name": "B", "email": "TAKEN@example.com"}),
        )
        .await
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(
            errors.first("company_name"),
            Some("The company name is required for business customers.")
        );
        assert_eq!(
            errors.first("email"),
            Some("A customer with this email address already exists.")
        );
    }

    #[tokio::test]
    async fn updating_keeps_own_email() {
        let request = CustomerUpdateRequest { customer: customer(1, 0) };
        let out = run(&request, &staff(), json!({"email": "taken@example.com"})).await.unwrap();
        assert_eq!(out.email.as_deref(), Some("taken@example.com"));
    }

    #[tokio::test]
    async fn address_country_is_uppercased_and_checked() {
        let request = StoreAddressRequest { customer_id: crate::CustomerId(1) };
        let body = json!({
            "type": "Shipping", "first_name": "A", "last_name": "B",
            "address_line_1": "1 Main St", "city": "Oslo", "postal_code": "0150", "country": "no"
        });
        let out = run(&request, &staff(), body).await.unwrap();
        assert_eq!(out.country, "NO");

        let bad = json!({
            "type": "billing", "first_name": "A", "last_name": "B",
            "address_line_1": "1 Main St", "city": "Oslo", "postal_code": "0150", "country": "NOR"
        });
        let err = run(&request, &staff(), bad).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("country"),
            &["The country must be a two-letter ISO code."]
        );
    }

    #[tokio::test]
    async fn redemption_is_capped_by_balance() {
        let request = StoreLoyaltyTransactionRequest { customer: customer(1, 50) };
        let err = run(&request, &staff(), json!({"type": "redeem", "points": 80})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("points"),
            Some("The customer only has 50 points available.")
        );

        let out = run(&request, &staff(), json!({"type": "adjust", "points": "-20"})).await.unwrap();
        assert_eq!(out.kind, LoyaltyType::Adjust);
        assert_eq!(out.points, -20);
    }

    #[tokio::test]
    async fn email_communications_need_a_subject() {
        let request = StoreCustomerCommunicationRequest { customer_id: crate::CustomerId(1) };
        let err = run(&request, &staff(), json!({"channel": "email", "content": "Hello"})).await.unwrap_err();
        assert_eq!(err.validation_errors().unwrap().first("subject"), Some("Emails need a subject."));

        let out = run(
            &request,
            &staff(),
            json!({"channel": "phone", "content": "Called back", "communicated_at": "2025-05-30"}),
        )
        .await
        .unwrap();
        assert!(out.communicated_at.is_some());
    }

    #[tokio::test]
    async fn shoppers_subscribe_only_themselves() {
        let request = StoreUserSubscriptionRequest::for_principal(&shopper(5));
        let body = json!({"plan": "premium", "price": 19, "starts_at": "2025-06-02"});
        let out = run(&request, &shopper(5), body.clone()).await.unwrap();
        assert_eq!(out.user_id, 5);
        assert_eq!(out.status, SubscriptionStatus::Active);
        assert!(out.auto_renew);

        let mut other = body;
        other["user_id"] = json!(6);
        let err = run(&request, &shopper(5), other).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("user_id"),
            Some("You may only create subscriptions for yourself.")
        );
    }

    #[tokio::test]
    async fn cancelled_subscription_cannot_be_reactivated() {
        let request = UpdateUserSubscriptionRequest {
            subscription: subscription(SubscriptionStatus::Cancelled, 5),
        };
        let err = run(&request, &shopper(5), json!({"status": "active"})).await.unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().first("status"),
            Some("Cannot change subscription status from cancelled to active.")
        );
    }

    #[tokio::test]
    async fn cancelling_requires_a_reason() {
        let request = UpdateUserSubscriptionRequest {
            subscription: subscription(SubscriptionStatus::Active, 5),
        };
        let err = run(&request, &shopper(5), json!({"status": "cancelled"})).await.unwrap_err();
        assert!(err.validation_errors().unwrap().has("cancellation_reason"));

        let out = run(&request, &shopper(5), json!({"status": "cancelled", "cancellation_reason": "Too pricey"}))
            .await
            .unwrap();
        assert_eq!(out.status, Some(SubscriptionStatus::Cancelled));
    }

    #[tokio::test]
    async fn strangers_get_the_fixed_forbidden_message() {
        let request = UpdateUserSubscriptionRequest {
            subscription: subscription(SubscriptionStatus::Active, 5),
        };
        let err = run(&request, &shopper(6), json!({"auto_renew": false})).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Forbidden(m) if m == "You are not authorized to update this subscription."
        ));
        assert!(run(&request, &staff(), json!({"auto_renew": "0"})).await.is_ok());
    }
}

use tradeerp_auth::{Permission, Principal};
use tradeerp_core::Lifecycle;
use tradeerp_validation::{DateRef, FormRequest, Input, Messages, Rule, Rules, ValidationErrors};

use crate::{
    BillingCycle, NewUserSubscription, SubscriptionChanges, SubscriptionPlan, SubscriptionStatus,
    UserSubscription,
};

/// Create a subscription. Principals without `subscriptions.manage` may only
/// subscribe themselves.
pub struct StoreUserSubscriptionRequest {
    pub acting_user_id: Option<i64>,
    pub manages_subscriptions: bool,
}

impl StoreUserSubscriptionRequest {
    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            acting_user_id: principal.user_id,
            manages_subscriptions: principal.can(&Permission::new("subscriptions.manage")),
        }
    }
}

impl FormRequest for StoreUserSubscriptionRequest {
    type Output = NewUserSubscription;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("subscriptions.create"))
    }

    fn prepare(&self, input: &mut Input) {
        if let Some(user_id) = self.acting_user_id {
            input.default("user_id", user_id);
        }
        input.lowercase("plan");
        input.lowercase("billing_cycle");
        input.default("billing_cycle", BillingCycle::Monthly.as_str());
        let initial = if input.filled("trial_ends_at") {
            SubscriptionStatus::Trialing
        } else {
            SubscriptionStatus::Active
        };
        input.default("status", initial.as_str());
        input.default("auto_renew", true);
        input.coerce_bool("auto_renew");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("user_id", [Rule::Required, Rule::Integer, Rule::exists("users", "id")])
            .field("plan", [Rule::Required, Rule::In(SubscriptionPlan::VALUES)])
            .field("status", [Rule::Required, Rule::In(&["trialing", "active"])])
            .field("price", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
            .field("billing_cycle", [Rule::Required, Rule::In(BillingCycle::VALUES)])
            .field("starts_at", [Rule::Required, Rule::Date, Rule::AfterOrEqual(DateRef::Today)])
            .field(
                "trial_ends_at",
                [
                    Rule::RequiredIf("status", &["trialing"]),
                    Rule::Nullable,
                    Rule::Date,
                    Rule::After(DateRef::Field("starts_at")),
                ],
            )
            .field("ends_at", [Rule::Nullable, Rule::Date, Rule::After(DateRef::Field("starts_at"))])
            .field("auto_renew", [Rule::Boolean])
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if self.manages_subscriptions || errors.has("user_id") {
            return;
        }
        let requested = input.get_f64("user_id").map(|v| v as i64);
        if requested != self.acting_user_id {
            errors.add("user_id", "You may only create subscriptions for yourself.");
        }
    }
}

/// Change an existing subscription. Owners may change their own; anyone else
/// needs `subscriptions.update`.
pub struct UpdateUserSubscriptionRequest {
    pub subscription: UserSubscription,
}

impl FormRequest for UpdateUserSubscriptionRequest {
    type Output = SubscriptionChanges;

    fn ability(&self) -> Option<Permission> {
        Some(Permission::new("subscriptions.update"))
    }

    fn authorize(&self, principal: &Principal) -> bool {
        principal.owns(self.subscription.user_id)
            || self.ability().is_some_and(|a| principal.can(&a))
    }

    fn forbidden_message(&self) -> &'static str {
        "You are not authorized to update this subscription."
    }

    fn prepare(&self, input: &mut Input) {
        input.lowercase("status");
        input.lowercase("plan");
        input.lowercase("billing_cycle");
        input.coerce_bool("auto_renew");
    }

    fn rules(&self) -> Rules {
        Rules::new()
            .field("status", [Rule::Sometimes, Rule::Required, Rule::In(SubscriptionStatus::VALUES)])
            .field("plan", [Rule::Sometimes, Rule::In(SubscriptionPlan::VALUES)])
            .field("billing_cycle", [Rule::Sometimes, Rule::In(BillingCycle::VALUES)])
            .field("auto_renew", [Rule::Sometimes, Rule::Boolean])
            .field("ends_at", [Rule::Nullable, Rule::Date, Rule::AfterOrEqual(DateRef::Today)])
            .field(
                "cancellation_reason",
                [Rule::RequiredIf("status", &["cancelled"]), Rule::Nullable, Rule::String, Rule::Max(500.0)],
            )
    }

    fn messages(&self) -> Messages {
        Messages::new().with(
            "cancellation_reason.required_if",
            "Please tell us why you are cancelling.",
        )
    }

    fn after(&self, input: &Input, errors: &mut ValidationErrors) {
        if errors.has("status") {
            return;
        }
        let Some(target) = input
            .get_str("status")
            .and_then(|s| s.parse::<SubscriptionStatus>().ok())
        else {
            return;
        };
        let current = self.subscription.status;
        if target != current && !current.can_transition_to(target) {
            errors.add(
                "status",
                format!(
                    "Cannot change subscription status from {} to {}.",
                    current.as_str(),
                    target.as_str()
                ),
            );
        }
    }
}

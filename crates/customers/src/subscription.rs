use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, DomainResult, Entity, Lifecycle, StatusChange, Timestamps};

record_id!(UserSubscriptionId);

string_enum! {
    pub enum SubscriptionStatus {
        Trialing => "trialing",
        Active => "active",
        Paused => "paused",
        Cancelled => "cancelled",
        Expired => "expired",
    }
}

impl Lifecycle for SubscriptionStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use SubscriptionStatus::*;
        match self {
            Trialing => &[Active, Cancelled, Expired],
            Active => &[Paused, Cancelled, Expired],
            Paused => &[Active, Cancelled],
            Cancelled | Expired => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        SubscriptionStatus::as_str(self)
    }
}

string_enum! {
    pub enum SubscriptionPlan {
        Basic => "basic",
        Standard => "standard",
        Premium => "premium",
        Enterprise => "enterprise",
    }
}

string_enum! {
    pub enum BillingCycle {
        Monthly => "monthly",
        Quarterly => "quarterly",
        Yearly => "yearly",
    }
}

impl BillingCycle {
    pub fn months(&self) -> u32 {
        match self {
            BillingCycle::Monthly => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Yearly => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: UserSubscriptionId,
    pub user_id: i64,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub starts_at: NaiveDate,
    pub trial_ends_at: Option<NaiveDate>,
    pub ends_at: Option<NaiveDate>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub auto_renew: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewUserSubscription {
    pub user_id: i64,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub starts_at: NaiveDate,
    pub trial_ends_at: Option<NaiveDate>,
    pub ends_at: Option<NaiveDate>,
    pub auto_renew: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscriptionChanges {
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<SubscriptionPlan>,
    pub billing_cycle: Option<BillingCycle>,
    pub auto_renew: Option<bool>,
    pub ends_at: Option<NaiveDate>,
    pub cancellation_reason: Option<String>,
}

impl UserSubscription {
    pub fn create(id: UserSubscriptionId, new: NewUserSubscription, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            plan: new.plan,
            status: new.status,
            price: new.price,
            billing_cycle: new.billing_cycle,
            starts_at: new.starts_at,
            trial_ends_at: new.trial_ends_at,
            ends_at: new.ends_at,
            cancelled_at: None,
            cancellation_reason: None,
            auto_renew: new.auto_renew,
            timestamps: Timestamps::new(now),
        }
    }

    /// Apply an update. A status change must follow the allow-list; cancelling
    /// stamps `cancelled_at` and turns auto-renew off.
    pub fn apply(
        &mut self,
        c: SubscriptionChanges,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<StatusChange<SubscriptionStatus>>> {
        let mut change = None;
        if let Some(next) = c.status.filter(|s| *s != self.status) {
            let moved = StatusChange::checked(self.status, next)?;
            self.status = moved.to;
            if next == SubscriptionStatus::Cancelled {
                self.cancelled_at = Some(now);
                self.auto_renew = false;
            }
            change = Some(moved);
        }
        if let Some(v) = c.plan {
            self.plan = v;
        }
        if let Some(v) = c.billing_cycle {
            self.billing_cycle = v;
        }
        if let Some(v) = c.auto_renew {
            self.auto_renew = v && self.status != SubscriptionStatus::Cancelled;
        }
        self.ends_at = c.ends_at.or(self.ends_at);
        self.cancellation_reason = c.cancellation_reason.or(self.cancellation_reason.take());
        self.timestamps.touch(now);
        Ok(change)
    }

    /// Next billing date on or after `today`, if the subscription renews.
    pub fn next_billing_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        if !self.auto_renew || self.status.is_terminal() || self.status == SubscriptionStatus::Paused {
            return None;
        }
        let anchor = self.trial_ends_at.unwrap_or(self.starts_at);
        let step = Months::new(self.billing_cycle.months());
        let mut next = anchor;
        while next < today {
            next = next.checked_add_months(step)?;
        }
        match self.ends_at {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }
}

impl Entity for UserSubscription {
    type Id = UserSubscriptionId;

    fn id(&self) -> &UserSubscriptionId {
        &self.id
    }
}

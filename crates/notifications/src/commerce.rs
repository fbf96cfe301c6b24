//! Customer-facing order and subscription notifications.

use serde_json::{json, Value};

use tradeerp_core::SoftDeletes;
use tradeerp_customers::{SubscriptionStatus, UserSubscription};
use tradeerp_orders::{Order, OrderStatus, OrderStatusHistory};

use crate::notification::amount;
use crate::{MailMessage, Notification, NotificationContext, Recipient};

#[derive(Debug, Clone)]
pub struct OrderStatusChanged {
    pub order: Order,
    pub history: OrderStatusHistory,
}

impl OrderStatusChanged {
    pub fn new(order: Order, history: OrderStatusHistory) -> Self {
        Self { order, history }
    }

    fn message(&self) -> String {
        let headline = match self.history.to_status {
            OrderStatus::Processing => "is being processed",
            OrderStatus::Shipped => "has shipped",
            OrderStatus::Delivered => "has been delivered",
            OrderStatus::Cancelled => "has been cancelled",
            OrderStatus::Returned => "has been returned",
            OrderStatus::Refunded => "has been refunded",
            OrderStatus::Pending => "is pending",
        };
        format!("Your order {} {headline}.", self.order.order_number)
    }

    fn path(&self) -> String {
        format!("/orders/{}", self.order.id)
    }
}

impl Notification for OrderStatusChanged {
    fn notification_type(&self) -> &'static str {
        "order_status_changed"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let o = &self.order;
        let shipped = self.history.to_status == OrderStatus::Shipped;
        let mail = MailMessage::new()
            .subject(format!("Order {} Update", o.order_number))
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Order total: {} {}", amount(o.total), o.currency))
            .line_if(shipped && o.tracking_number.is_some(), || {
                format!("Tracking number: {}", o.tracking_number.clone().unwrap_or_default())
            })
            .line_if(self.history.comment.is_some(), || {
                self.history.comment.clone().unwrap_or_default()
            })
            .action("View Order", ctx.url(&self.path()));
        match self.history.to_status {
            OrderStatus::Delivered => mail.success(),
            OrderStatus::Cancelled => mail.error(),
            _ => mail,
        }
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let o = &self.order;
        json!({
            "type": self.notification_type(),
            "order_id": o.id,
            "order_number": o.order_number,
            "previous_status": self.history.from_status,
            "status": self.history.to_status,
            "total": o.total,
            "currency": o.currency,
            "tracking_number": o.tracking_number,
            "message": self.message(),
            "action_url": ctx.url(&self.path()),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["order", "status", "customer"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        !self.order.is_trashed()
            && self.history.notify_customer
            && self.history.order_id == self.order.id
            && self.order.status == self.history.to_status
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionStatusChanged {
    pub subscription: UserSubscription,
    pub previous: SubscriptionStatus,
}

impl SubscriptionStatusChanged {
    pub fn new(subscription: UserSubscription, previous: SubscriptionStatus) -> Self {
        Self { subscription, previous }
    }

    fn message(&self) -> String {
        format!(
            "Your {} subscription is now {}.",
            self.subscription.plan, self.subscription.status
        )
    }
}

impl Notification for SubscriptionStatusChanged {
    fn notification_type(&self) -> &'static str {
        "subscription_status_changed"
    }

    fn to_mail(&self, recipient: &Recipient, ctx: &NotificationContext) -> MailMessage {
        let s = &self.subscription;
        let next_billing = s.next_billing_date(ctx.today());
        let mail = MailMessage::new()
            .subject("Subscription Update")
            .greeting(format!("Hello {},", recipient.name))
            .line(self.message())
            .line(format!("Previous status: {}", self.previous))
            .line_if(
                s.status == SubscriptionStatus::Cancelled && s.cancellation_reason.is_some(),
                || format!("Reason: {}", s.cancellation_reason.clone().unwrap_or_default()),
            )
            .line_if(next_billing.is_some(), || {
                format!(
                    "Next billing date: {}",
                    next_billing.map(|d| d.to_string()).unwrap_or_default()
                )
            })
            .action("Manage Subscription", ctx.url(&format!("/subscriptions/{}", s.id)));
        if s.status == SubscriptionStatus::Active { mail.success() } else { mail }
    }

    fn to_array(&self, ctx: &NotificationContext) -> Value {
        let s = &self.subscription;
        json!({
            "type": self.notification_type(),
            "subscription_id": s.id,
            "plan": s.plan,
            "previous_status": self.previous,
            "status": s.status,
            "billing_cycle": s.billing_cycle,
            "next_billing_date": s.next_billing_date(ctx.today()),
            "message": self.message(),
            "action_url": ctx.url(&format!("/subscriptions/{}", s.id)),
            "created_at": ctx.now,
        })
    }

    fn tags(&self) -> &'static [&'static str] {
        &["subscription", "billing", "status"]
    }

    fn should_send(&self, _recipient: &Recipient) -> bool {
        self.subscription.status != self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ctx, order, status_history, subscription, user};
    use crate::MailLevel;

    #[test]
    fn shipped_orders_mention_tracking() {
        let mut o = order(OrderStatus::Shipped);
        o.tracking_number = Some("1Z999".into());
        let n = OrderStatusChanged::new(o, status_history(OrderStatus::Processing, OrderStatus::Shipped));

        let mail = n.to_mail(&user(), &ctx());
        assert!(mail.lines().any(|l| l == "Tracking number: 1Z999"));
        assert_eq!(n.to_array(&ctx())["message"], "Your order ORD-0001 has shipped.");
        assert_eq!(n.to_array(&ctx())["previous_status"], "processing");
        assert!(n.should_send(&user()));
    }

    #[test]
    fn outdated_or_silent_history_is_not_sent() {
        let n = OrderStatusChanged::new(
            order(OrderStatus::Delivered),
            status_history(OrderStatus::Processing, OrderStatus::Shipped),
        );
        assert!(!n.should_send(&user()));

        let mut quiet = status_history(OrderStatus::Pending, OrderStatus::Processing);
        quiet.notify_customer = false;
        assert!(!OrderStatusChanged::new(order(OrderStatus::Processing), quiet).should_send(&user()));
    }

    #[test]
    fn cancellation_reason_is_shown() {
        let mut s = subscription(SubscriptionStatus::Cancelled);
        s.cancellation_reason = Some("Too expensive".into());
        let n = SubscriptionStatusChanged::new(s, SubscriptionStatus::Active);

        let mail = n.to_mail(&user(), &ctx());
        assert!(mail.lines().any(|l| l == "Reason: Too expensive"));
        assert_eq!(n.to_array(&ctx())["message"], "Your premium subscription is now cancelled.");
        assert_eq!(n.to_array(&ctx())["next_billing_date"], Value::Null);
    }

    #[test]
    fn reactivation_is_a_success_mail_with_billing_date() {
        let n = SubscriptionStatusChanged::new(subscription(SubscriptionStatus::Active), SubscriptionStatus::Paused);
        let mail = n.to_mail(&user(), &ctx());
        assert_eq!(mail.level, MailLevel::Success);
        assert!(mail.lines().any(|l| l == "Next billing date: 2025-06-15"));

        let unchanged = SubscriptionStatusChanged::new(subscription(SubscriptionStatus::Active), SubscriptionStatus::Active);
        assert!(!unchanged.should_send(&user()));
    }
}

//! Live updates pushed to browsers watching a record.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use tradeerp_core::{StatusChange, TenantId};
use tradeerp_events::{BroadcastEnvelope, BroadcastEvent, Channel, Event, EventBus};
use tradeerp_hr::{EmployeeId, EmployeeSalaryHistory};
use tradeerp_orders::{Order, OrderStatus};
use tradeerp_providers::{CertificationStatus, ProviderCertification};

#[derive(Debug, Clone, PartialEq)]
pub struct CertificationUpdated {
    pub certification: ProviderCertification,
    pub previous_status: CertificationStatus,
    pub occurred_at: DateTime<Utc>,
}

impl CertificationUpdated {
    pub fn new(
        certification: ProviderCertification,
        change: StatusChange<CertificationStatus>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            certification,
            previous_status: change.from,
            occurred_at,
        }
    }
}

impl Event for CertificationUpdated {
    fn event_type(&self) -> &'static str {
        "providers.certification.updated"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl BroadcastEvent for CertificationUpdated {
    fn broadcast_on(&self) -> Vec<Channel> {
        vec![
            Channel::private(format!("providers.{}", self.certification.provider_id)),
            Channel::private(format!("certifications.{}", self.certification.id)),
        ]
    }

    fn broadcast_as(&self) -> &'static str {
        "certification.updated"
    }

    fn broadcast_with(&self) -> Value {
        let c = &self.certification;
        json!({
            "id": c.id,
            "provider_id": c.provider_id,
            "name": c.name,
            "certification_number": c.certification_number,
            "status": c.status,
            "previous_status": self.previous_status,
            "status_reason": c.status_reason,
            "expiry_date": c.expiry_date,
            "updated_at": c.timestamps.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusUpdated {
    pub order: Order,
    pub previous_status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

impl OrderStatusUpdated {
    pub fn new(order: Order, change: StatusChange<OrderStatus>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            order,
            previous_status: change.from,
            occurred_at,
        }
    }
}

impl Event for OrderStatusUpdated {
    fn event_type(&self) -> &'static str {
        "orders.order.status_updated"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl BroadcastEvent for OrderStatusUpdated {
    fn broadcast_on(&self) -> Vec<Channel> {
        let mut channels = vec![Channel::private(format!("orders.{}", self.order.id))];
        if let Some(customer) = self.order.customer_id {
            channels.push(Channel::private(format!("customers.{customer}")));
        }
        channels
    }

    fn broadcast_as(&self) -> &'static str {
        "order.status.updated"
    }

    fn broadcast_with(&self) -> Value {
        let o = &self.order;
        json!({
            "id": o.id,
            "order_number": o.order_number,
            "status": o.status,
            "previous_status": self.previous_status,
            "payment_status": o.payment_status,
            "tracking_number": o.tracking_number,
            "updated_at": o.timestamps.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeSalaryUpdated {
    pub employee_id: EmployeeId,
    pub previous_salary: f64,
    pub new_salary: f64,
    pub percent_change: Option<f64>,
    pub effective_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

impl EmployeeSalaryUpdated {
    pub fn from_history(history: &EmployeeSalaryHistory) -> Self {
        Self {
            employee_id: history.employee_id,
            previous_salary: history.previous_salary,
            new_salary: history.new_salary,
            percent_change: history.percent_change(),
            effective_date: history.effective_date,
            occurred_at: history.created_at,
        }
    }
}

impl Event for EmployeeSalaryUpdated {
    fn event_type(&self) -> &'static str {
        "hr.employee.salary_updated"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl BroadcastEvent for EmployeeSalaryUpdated {
    // Salaries only go to the employee and HR, never a public channel.
    fn broadcast_on(&self) -> Vec<Channel> {
        vec![
            Channel::private(format!("employees.{}", self.employee_id)),
            Channel::private("hr.salaries"),
        ]
    }

    fn broadcast_as(&self) -> &'static str {
        "employee.salary.updated"
    }

    fn broadcast_with(&self) -> Value {
        json!({
            "employee_id": self.employee_id,
            "previous_salary": self.previous_salary,
            "new_salary": self.new_salary,
            "percent_change": self.percent_change.map(|p| (p * 100.0).round() / 100.0),
            "effective_date": self.effective_date,
        })
    }
}

/// Publish `event` for `tenant_id`. Broadcasting is best effort: failures are
/// logged and reported as `false`.
pub fn broadcast<E, B>(bus: &B, tenant_id: TenantId, event: &E) -> bool
where
    E: BroadcastEvent,
    B: EventBus<BroadcastEnvelope> + ?Sized,
{
    let envelope = BroadcastEnvelope::from_event(tenant_id, event);
    match bus.publish(envelope) {
        Ok(()) => {
            tracing::debug!(event = event.broadcast_as(), %tenant_id, "broadcast published");
            true
        }
        Err(err) => {
            tracing::warn!(event = event.broadcast_as(), %tenant_id, error = ?err, "broadcast failed");
            false
        }
    }
}

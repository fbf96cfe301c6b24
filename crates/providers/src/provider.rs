use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, DomainResult, Entity, Lifecycle, SoftDeletes, StatusChange, Timestamps};

record_id!(
    /// Key of a `providers` row.
    ProviderId
);

string_enum! {
    pub enum ProviderType {
        Supplier => "supplier",
        Manufacturer => "manufacturer",
        Distributor => "distributor",
        Contractor => "contractor",
        Consultant => "consultant",
        ServiceProvider => "service_provider",
    }
}

string_enum! {
    pub enum ProviderStatus {
        Pending => "pending",
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

impl Lifecycle for ProviderStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use ProviderStatus::*;
        match self {
            Pending => &[Active, Inactive],
            Active => &[Inactive, Suspended],
            Inactive => &[Active, Suspended],
            Suspended => &[Active, Inactive],
        }
    }

    fn as_str(&self) -> &'static str {
        ProviderStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub provider_type: ProviderType,
    pub status: ProviderStatus,
    pub status_reason: Option<String>,
    pub tax_id: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
    pub address_line_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub rating: Option<f64>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProvider {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub provider_type: ProviderType,
    pub status: ProviderStatus,
    pub tax_id: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
    pub address_line_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub provider_type: Option<ProviderType>,
    pub tax_id: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub description: Option<String>,
    pub address_line_1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Validated status toggle; `reason` accompanies suspensions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderStatusChange {
    pub status: ProviderStatus,
    pub reason: Option<String>,
}

impl Provider {
    pub fn create(id: ProviderId, new: NewProvider, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            provider_type: new.provider_type,
            status: new.status,
            status_reason: None,
            tax_id: new.tax_id,
            website: new.website,
            contact_person: new.contact_person,
            description: new.description,
            address_line_1: new.address_line_1,
            city: new.city,
            state: new.state,
            postal_code: new.postal_code,
            country: new.country,
            rating: None,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, c: ProviderChanges, now: DateTime<Utc>) {
        if let Some(v) = c.name {
            self.name = v;
        }
        if let Some(v) = c.email {
            self.email = v;
        }
        if let Some(v) = c.provider_type {
            self.provider_type = v;
        }
        self.phone = c.phone.or(self.phone.take());
        self.tax_id = c.tax_id.or(self.tax_id.take());
        self.website = c.website.or(self.website.take());
        self.contact_person = c.contact_person.or(self.contact_person.take());
        self.description = c.description.or(self.description.take());
        self.address_line_1 = c.address_line_1.or(self.address_line_1.take());
        self.city = c.city.or(self.city.take());
        self.state = c.state.or(self.state.take());
        self.postal_code = c.postal_code.or(self.postal_code.take());
        self.country = c.country.or(self.country.take());
        self.timestamps.touch(now);
    }

    pub fn change_status(
        &mut self,
        change: ProviderStatusChange,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange<ProviderStatus>> {
        let moved = StatusChange::checked(self.status, change.status)?;
        self.status = moved.to;
        self.status_reason = change.reason;
        self.timestamps.touch(now);
        Ok(moved)
    }
}

impl Entity for Provider {
    type Id = ProviderId;

    fn id(&self) -> &ProviderId {
        &self.id
    }
}

impl SoftDeletes for Provider {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

string_enum! {
    pub enum BulkProviderAction {
        Activate => "activate",
        Deactivate => "deactivate",
        Suspend => "suspend",
        Delete => "delete",
    }
}

impl BulkProviderAction {
    /// Status the action moves providers to; `None` for deletion.
    pub fn target_status(&self) -> Option<ProviderStatus> {
        match self {
            BulkProviderAction::Activate => Some(ProviderStatus::Active),
            BulkProviderAction::Deactivate => Some(ProviderStatus::Inactive),
            BulkProviderAction::Suspend => Some(ProviderStatus::Suspended),
            BulkProviderAction::Delete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BulkProviderOperation {
    pub action: BulkProviderAction,
    pub ids: Vec<ProviderId>,
    pub reason: Option<String>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn provider(id: i64, status: ProviderStatus) -> Provider {
        Provider::create(
            ProviderId(id),
            NewProvider {
                name: "Acme Supply".into(),
                email: format!("p{id}@acme.test"),
                phone: None,
                provider_type: ProviderType::Supplier,
                status,
                tax_id: None,
                website: None,
                contact_person: None,
                description: None,
                address_line_1: None,
                city: None,
                state: None,
                postal_code: None,
                country: Some("US".into()),
            },
            Utc::now(),
        )
    }

    #[test]
    fn suspension_keeps_its_reason() {
        let mut p = provider(1, ProviderStatus::Active);
        let moved = p
            .change_status(
                ProviderStatusChange {
                    status: ProviderStatus::Suspended,
                    reason: Some("Late deliveries".into()),
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(moved.from, ProviderStatus::Active);
        assert_eq!(p.status_reason.as_deref(), Some("Late deliveries"));
    }

    #[test]
    fn pending_providers_cannot_be_suspended() {
        let mut p = provider(1, ProviderStatus::Pending);
        let change = ProviderStatusChange { status: ProviderStatus::Suspended, reason: None };
        assert!(p.change_status(change, Utc::now()).is_err());
    }
}

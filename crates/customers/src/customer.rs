use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, DomainError, DomainResult, Entity, SoftDeletes, Timestamps};

use crate::LoyaltyType;

record_id!(CustomerId);
record_id!(AddressId);

string_enum! {
    pub enum CustomerType {
        Individual => "individual",
        Business => "business",
    }
}

string_enum! {
    pub enum CustomerStatus {
        Active => "active",
        Inactive => "inactive",
        Blocked => "blocked",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: Option<i64>,
    pub customer_type: CustomerType,
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub tax_number: Option<String>,
    pub status: CustomerStatus,
    pub accepts_marketing: bool,
    pub loyalty_points: i64,
    pub lifetime_value: f64,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewCustomer {
    pub user_id: Option<i64>,
    pub customer_type: CustomerType,
    pub first_name: String,
    pub last_name: String,
    pub company_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub tax_number: Option<String>,
    pub status: CustomerStatus,
    pub accepts_marketing: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CustomerChanges {
    pub customer_type: Option<CustomerType>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub tax_number: Option<String>,
    pub status: Option<CustomerStatus>,
    pub accepts_marketing: Option<bool>,
    pub notes: Option<String>,
}

impl Customer {
    pub fn create(id: CustomerId, new: NewCustomer, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            customer_type: new.customer_type,
            first_name: new.first_name,
            last_name: new.last_name,
            company_name: new.company_name,
            email: new.email,
            phone: new.phone,
            date_of_birth: new.date_of_birth,
            tax_number: new.tax_number,
            status: new.status,
            accepts_marketing: new.accepts_marketing,
            loyalty_points: 0,
            lifetime_value: 0.0,
            notes: new.notes,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn apply(&mut self, c: CustomerChanges, now: DateTime<Utc>) {
        if let Some(v) = c.customer_type {
            self.customer_type = v;
        }
        if let Some(v) = c.first_name {
            self.first_name = v;
        }
        if let Some(v) = c.last_name {
            self.last_name = v;
        }
        if let Some(v) = c.email {
            self.email = v;
        }
        if let Some(v) = c.status {
            self.status = v;
        }
        if let Some(v) = c.accepts_marketing {
            self.accepts_marketing = v;
        }
        self.company_name = c.company_name.or(self.company_name.take());
        self.phone = c.phone.or(self.phone.take());
        self.date_of_birth = c.date_of_birth.or(self.date_of_birth);
        self.tax_number = c.tax_number.or(self.tax_number.take());
        self.notes = c.notes.or(self.notes.take());
        self.timestamps.touch(now);
    }

    /// Company name for businesses, full name otherwise.
    pub fn display_name(&self) -> String {
        match (&self.customer_type, &self.company_name) {
            (CustomerType::Business, Some(company)) => company.clone(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Apply a loyalty movement and return the new balance.
    ///
    /// `adjust` takes a signed amount; the other kinds take a positive one.
    pub fn apply_loyalty(&mut self, kind: LoyaltyType, points: i64) -> DomainResult<i64> {
        let delta = match kind {
            LoyaltyType::Earn => points,
            LoyaltyType::Adjust => points,
            LoyaltyType::Redeem | LoyaltyType::Expire => -points,
        };
        if kind != LoyaltyType::Adjust && points <= 0 {
            return Err(DomainError::validation("loyalty points must be positive"));
        }
        let balance = self
            .loyalty_points
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant("loyalty balance overflow"))?;
        if balance < 0 {
            return Err(DomainError::invariant(format!(
                "customer {} only has {} points",
                self.id, self.loyalty_points
            )));
        }
        self.loyalty_points = balance;
        Ok(balance)
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &CustomerId {
        &self.id
    }
}

impl SoftDeletes for Customer {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

string_enum! {
    pub enum AddressType {
        Billing => "billing",
        Shipping => "shipping",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    #[serde(rename = "type")]
    pub kind: AddressType,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2.
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAddress {
    #[serde(rename = "type")]
    pub kind: AddressType,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
    pub is_default: bool,
}

impl Address {
    pub fn create(id: AddressId, customer_id: CustomerId, new: NewAddress, now: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id,
            kind: new.kind,
            first_name: new.first_name,
            last_name: new.last_name,
            company: new.company,
            address_line_1: new.address_line_1,
            address_line_2: new.address_line_2,
            city: new.city,
            state: new.state,
            postal_code: new.postal_code,
            country: new.country,
            phone: new.phone,
            is_default: new.is_default,
            timestamps: Timestamps::new(now),
        }
    }

    /// Mark `default_id` as the default address of its type; clears the flag
    /// on the customer's other addresses of the same type.
    pub fn make_default(addresses: &mut [Address], default_id: AddressId) {
        let Some(kind) = addresses.iter().find(|a| a.id == default_id).map(|a| a.kind) else {
            return;
        };
        for address in addresses.iter_mut().filter(|a| a.kind == kind) {
            address.is_default = address.id == default_id;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn customer(id: i64, points: i64) -> Customer {
        let mut c = Customer::create(
            CustomerId(id),
            NewCustomer {
                user_id: Some(id),
                customer_type: CustomerType::Individual,
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                company_name: None,
                email: format!("ada{id}@example.com"),
                phone: None,
                date_of_birth: None,
                tax_number: None,
                status: CustomerStatus::Active,
                accepts_marketing: false,
                notes: None,
            },
            Utc::now(),
        );
        c.loyalty_points = points;
        c
    }

    #[test]
    fn loyalty_cannot_go_negative() {
        let mut c = customer(1, 100);
        assert_eq!(c.apply_loyalty(LoyaltyType::Redeem, 40), Ok(60));
        assert!(c.apply_loyalty(LoyaltyType::Redeem, 61).is_err());
        assert_eq!(c.loyalty_points, 60);
        assert_eq!(c.apply_loyalty(LoyaltyType::Adjust, -10), Ok(50));
        assert!(c.apply_loyalty(LoyaltyType::Earn, 0).is_err());
    }

    #[test]
    fn display_name_prefers_company_for_businesses() {
        let mut c = customer(1, 0);
        assert_eq!(c.display_name(), "Ada Lovelace");
        c.customer_type = CustomerType::Business;
        c.company_name = Some("Analytical Engines Ltd".into());
        assert_eq!(c.display_name(), "Analytical Engines Ltd");
    }

    #[test]
    fn make_default_is_per_address_type() {
        let now = Utc::now();
        let mk = |id: i64, kind: AddressType, is_default: bool| {
            Address::create(
                AddressId(id),
                CustomerId(1),
                NewAddress {
                    kind,
                    first_name: "A".into(),
                    last_name: "B".into(),
                    company: None,
                    address_line_1: "1 Main St".into(),
                    address_line_2: None,
                    city: "Springfield".into(),
                    state: None,
                    postal_code: "12345".into(),
                    country: "US".into(),
                    phone: None,
                    is_default,
                },
                now,
            )
        };
        let mut all = vec![
            mk(1, AddressType::Billing, true),
            mk(2, AddressType::Billing, false),
            mk(3, AddressType::Shipping, true),
        ];
        Address::make_default(&mut all, AddressId(2));
        assert!(!all[0].is_default);
        assert!(all[1].is_default);
        assert!(all[2].is_default);
    }
}

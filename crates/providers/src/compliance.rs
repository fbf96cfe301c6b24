//! Insurance policies and certifications a provider must keep current.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, string_enum, DomainResult, Entity, Lifecycle, SoftDeletes, StatusChange, Timestamps};

use crate::ProviderId;

record_id!(ProviderInsuranceId);
record_id!(ProviderCertificationId);

string_enum! {
    pub enum InsuranceType {
        GeneralLiability => "general_liability",
        ProfessionalLiability => "professional_liability",
        WorkersCompensation => "workers_compensation",
        Property => "property",
        CommercialAuto => "commercial_auto",
        Cyber => "cyber",
    }
}

string_enum! {
    pub enum InsuranceStatus {
        Pending => "pending",
        Active => "active",
        Expired => "expired",
        Suspended => "suspended",
        Revoked => "revoked",
    }
}

impl Lifecycle for InsuranceStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use InsuranceStatus::*;
        match self {
            Pending => &[Active],
            Active => &[Expired, Suspended, Revoked],
            Suspended => &[Active, Revoked],
            Expired | Revoked => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        InsuranceStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInsurance {
    pub id: ProviderInsuranceId,
    pub provider_id: ProviderId,
    pub insurance_type: InsuranceType,
    pub policy_number: String,
    pub insurer_name: String,
    pub coverage_amount: f64,
    pub deductible: Option<f64>,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: InsuranceStatus,
    pub document_url: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<i64>,
    pub verification_notes: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProviderInsurance {
    pub insurance_type: InsuranceType,
    pub policy_number: String,
    pub insurer_name: String,
    pub coverage_amount: f64,
    pub deductible: Option<f64>,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub document_url: Option<String>,
}

/// Outcome of reviewing a policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsuranceVerification {
    pub status: InsuranceStatus,
    pub verification_notes: Option<String>,
}

impl ProviderInsurance {
    /// New policies wait for verification.
    pub fn create(
        id: ProviderInsuranceId,
        provider_id: ProviderId,
        new: NewProviderInsurance,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            provider_id,
            insurance_type: new.insurance_type,
            policy_number: new.policy_number,
            insurer_name: new.insurer_name,
            coverage_amount: new.coverage_amount,
            deductible: new.deductible,
            effective_date: new.effective_date,
            expiry_date: new.expiry_date,
            status: InsuranceStatus::Pending,
            document_url: new.document_url,
            verified_at: None,
            verified_by: None,
            verification_notes: None,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn verify(
        &mut self,
        v: InsuranceVerification,
        verified_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange<InsuranceStatus>> {
        let moved = StatusChange::checked(self.status, v.status)?;
        self.status = moved.to;
        self.verified_at = Some(now);
        self.verified_by = verified_by;
        self.verification_notes = v.verification_notes;
        self.timestamps.touch(now);
        Ok(moved)
    }

    /// Days left on the policy; negative once it has lapsed.
    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }

    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        self.status == InsuranceStatus::Active && (0..=days).contains(&self.days_until_expiry(today))
    }
}

impl Entity for ProviderInsurance {
    type Id = ProviderInsuranceId;

    fn id(&self) -> &ProviderInsuranceId {
        &self.id
    }
}

impl SoftDeletes for ProviderInsurance {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

string_enum! {
    pub enum CertificationStatus {
        Active => "active",
        Expired => "expired",
        Suspended => "suspended",
        Revoked => "revoked",
    }
}

impl Lifecycle for CertificationStatus {
    fn allowed_transitions(&self) -> &'static [Self] {
        use CertificationStatus::*;
        match self {
            Active => &[Expired, Suspended, Revoked],
            Suspended => &[Active, Revoked],
            Expired | Revoked => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        CertificationStatus::as_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCertification {
    pub id: ProviderCertificationId,
    pub provider_id: ProviderId,
    pub name: String,
    pub issuing_authority: String,
    pub certification_number: String,
    pub issued_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub status: CertificationStatus,
    pub status_reason: Option<String>,
    pub is_recurring: bool,
    pub renewal_period_months: Option<u32>,
    pub document_url: Option<String>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProviderCertification {
    pub name: String,
    pub issuing_authority: String,
    pub certification_number: String,
    pub issued_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub is_recurring: bool,
    pub renewal_period_months: Option<u32>,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CertificationStatusUpdate {
    pub status: CertificationStatus,
    pub reason: Option<String>,
}

impl ProviderCertification {
    pub fn create(
        id: ProviderCertificationId,
        provider_id: ProviderId,
        new: NewProviderCertification,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            provider_id,
            name: new.name,
            issuing_authority: new.issuing_authority,
            certification_number: new.certification_number,
            issued_date: new.issued_date,
            expiry_date: new.expiry_date,
            status: CertificationStatus::Active,
            status_reason: None,
            is_recurring: new.is_recurring,
            renewal_period_months: new.renewal_period_months.filter(|_| new.is_recurring),
            document_url: new.document_url,
            timestamps: Timestamps::new(now),
            deleted_at: None,
        }
    }

    pub fn update_status(
        &mut self,
        update: CertificationStatusUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange<CertificationStatus>> {
        let moved = StatusChange::checked(self.status, update.status)?;
        self.status = moved.to;
        self.status_reason = update.reason;
        self.timestamps.touch(now);
        Ok(moved)
    }

    /// First renewal date after `today` for recurring certifications.
    pub fn next_renewal(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months = self.renewal_period_months.filter(|m| self.is_recurring && *m > 0)?;
        let mut next = self.issued_date.checked_add_months(Months::new(months))?;
        while next <= today {
            next = next.checked_add_months(Months::new(months))?;
        }
        Some(next)
    }

    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }
}

impl Entity for ProviderCertification {
    type Id = ProviderCertificationId;

    fn id(&self) -> &ProviderCertificationId {
        &self.id
    }
}

impl SoftDeletes for ProviderCertification {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn insurance(status: InsuranceStatus) -> ProviderInsurance {
        let mut i = ProviderInsurance::create(
            ProviderInsuranceId(1),
            ProviderId(1),
            NewProviderInsurance {
                insurance_type: InsuranceType::GeneralLiability,
                policy_number: "GL-1".into(),
                insurer_name: "Mutual".into(),
                coverage_amount: 1_000_000.0,
                deductible: None,
                effective_date: day(2025, 1, 1),
                expiry_date: day(2025, 12, 31),
                document_url: None,
            },
            Utc::now(),
        );
        i.status = status;
        i
    }

    pub(crate) fn certification(status: CertificationStatus, recurring: Option<u32>) -> ProviderCertification {
        let mut c = ProviderCertification::create(
            ProviderCertificationId(1),
            ProviderId(1),
            NewProviderCertification {
                name: "ISO 9001".into(),
                issuing_authority: "BSI".into(),
                certification_number: "ISO-42".into(),
                issued_date: day(2024, 1, 15),
                expiry_date: Some(day(2027, 1, 15)),
                is_recurring: recurring.is_some(),
                renewal_period_months: recurring,
                document_url: None,
            },
            Utc::now(),
        );
        c.status = status;
        c
    }

    #[test]
    fn verification_activates_pending_policies() {
        let mut i = insurance(InsuranceStatus::Pending);
        let verified = InsuranceVerification { status: InsuranceStatus::Active, verification_notes: None };
        i.verify(verified, Some(3), Utc::now()).unwrap();
        assert_eq!(i.status, InsuranceStatus::Active);
        assert_eq!(i.verified_by, Some(3));

        let mut revoked = insurance(InsuranceStatus::Revoked);
        let again = InsuranceVerification { status: InsuranceStatus::Active, verification_notes: None };
        assert!(revoked.verify(again, None, Utc::now()).is_err());
    }

    #[test]
    fn expiry_window_counts_days() {
        let i = insurance(InsuranceStatus::Active);
        assert_eq!(i.days_until_expiry(day(2025, 12, 1)), 30);
        assert!(i.expires_within(day(2025, 12, 1), 30));
        assert!(!i.expires_within(day(2025, 10, 1), 30));
        assert!(!insurance(InsuranceStatus::Pending).expires_within(day(2025, 12, 1), 30));
    }

    #[test]
    fn recurring_certifications_roll_forward() {
        let c = certification(CertificationStatus::Active, Some(12));
        assert_eq!(c.next_renewal(day(2025, 6, 1)), Some(day(2026, 1, 15)));
        let once = certification(CertificationStatus::Active, None);
        assert_eq!(once.next_renewal(day(2025, 6, 1)), None);
    }

    proptest! {
        #[test]
        fn insurance_and_certification_share_terminal_states(i in 0usize..5) {
            let s = InsuranceStatus::ALL[i];
            let terminal = matches!(s, InsuranceStatus::Expired | InsuranceStatus::Revoked);
            prop_assert_eq!(s.is_terminal(), terminal);
        }
    }
}

//! `tradeerp-providers`: suppliers and contractors with their compliance
//! records, performance reviews and service locations.

pub mod compliance;
pub mod operations;
pub mod provider;
pub mod requests;

pub use compliance::{
    CertificationStatus, CertificationStatusUpdate, InsuranceStatus, InsuranceType, InsuranceVerification,
    NewProviderCertification, NewProviderInsurance, ProviderCertification, ProviderCertificationId,
    ProviderInsurance, ProviderInsuranceId,
};
pub use operations::{
    NewProviderLocation, NewProviderPerformance, ProviderLocation, ProviderLocationId, ProviderPerformance,
    ProviderPerformanceId,
};
pub use provider::{
    BulkProviderAction, BulkProviderOperation, NewProvider, Provider, ProviderChanges, ProviderId, ProviderStatus,
    ProviderStatusChange, ProviderType,
};
pub use requests::*;

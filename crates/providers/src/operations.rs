//! Performance reviews and service locations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradeerp_core::{record_id, Entity, Timestamps};

use crate::ProviderId;

record_id!(ProviderPerformanceId);
record_id!(ProviderLocationId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderPerformance {
    pub id: ProviderPerformanceId,
    pub provider_id: ProviderId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub quality_score: f64,
    pub delivery_score: f64,
    pub communication_score: f64,
    pub cost_score: f64,
    pub overall_score: f64,
    pub on_time_deliveries: u32,
    pub total_deliveries: u32,
    pub notes: Option<String>,
    pub evaluated_by: Option<i64>,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProviderPerformance {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub quality_score: f64,
    pub delivery_score: f64,
    pub communication_score: f64,
    pub cost_score: f64,
    /// Mean of the four scores when omitted.
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub on_time_deliveries: u32,
    #[serde(default)]
    pub total_deliveries: u32,
    pub notes: Option<String>,
}

impl ProviderPerformance {
    pub fn create(
        id: ProviderPerformanceId,
        provider_id: ProviderId,
        new: NewProviderPerformance,
        evaluated_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        let mean = (new.quality_score + new.delivery_score + new.communication_score + new.cost_score) / 4.0;
        Self {
            id,
            provider_id,
            period_start: new.period_start,
            period_end: new.period_end,
            quality_score: new.quality_score,
            delivery_score: new.delivery_score,
            communication_score: new.communication_score,
            cost_score: new.cost_score,
            overall_score: new.overall_score.unwrap_or((mean * 100.0).round() / 100.0),
            on_time_deliveries: new.on_time_deliveries,
            total_deliveries: new.total_deliveries,
            notes: new.notes,
            evaluated_by,
            timestamps: Timestamps::new(now),
        }
    }

    /// Share of deliveries that arrived on time, in percent.
    pub fn on_time_rate(&self) -> Option<f64> {
        (self.total_deliveries > 0)
            .then(|| f64::from(self.on_time_deliveries) / f64::from(self.total_deliveries) * 100.0)
    }
}

impl Entity for ProviderPerformance {
    type Id = ProviderPerformanceId;

    fn id(&self) -> &ProviderPerformanceId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLocation {
    pub id: ProviderLocationId,
    pub provider_id: ProviderId,
    pub name: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_radius_km: Option<f64>,
    pub phone: Option<String>,
    pub is_primary: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProviderLocation {
    pub name: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_radius_km: Option<f64>,
    pub phone: Option<String>,
    pub is_primary: bool,
}

const EARTH_RADIUS_KM: f64 = 6371.0;

impl ProviderLocation {
    pub fn create(
        id: ProviderLocationId,
        provider_id: ProviderId,
        new: NewProviderLocation,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            provider_id,
            name: new.name,
            address_line_1: new.address_line_1,
            address_line_2: new.address_line_2,
            city: new.city,
            state: new.state,
            postal_code: new.postal_code,
            country: new.country,
            latitude: new.latitude,
            longitude: new.longitude,
            service_radius_km: new.service_radius_km,
            phone: new.phone,
            is_primary: new.is_primary,
            timestamps: Timestamps::new(now),
        }
    }

    /// Great-circle distance to a point, when this location is geocoded.
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let (lat1, lon1) = (self.latitude?.to_radians(), self.longitude?.to_radians());
        let (lat2, lon2) = (latitude.to_radians(), longitude.to_radians());
        let a = ((lat2 - lat1) / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
        Some(2.0 * EARTH_RADIUS_KM * a.sqrt().asin())
    }

    pub fn serves(&self, latitude: f64, longitude: f64) -> bool {
        match (self.service_radius_km, self.distance_km(latitude, longitude)) {
            (Some(radius), Some(distance)) => distance <= radius,
            _ => false,
        }
    }
}

impl Entity for ProviderLocation {
    type Id = ProviderLocationId;

    fn id(&self) -> &ProviderLocationId {
        &self.id
    }
}

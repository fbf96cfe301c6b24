//! Value objects: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// URL-safe identifier derived from a human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl ValueObject for Slug {}

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// ASCII letters and digits are kept (lowercased); every other run of
    /// characters collapses to a single `-`. Leading/trailing dashes are trimmed.
    pub fn from_name(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_dash = false;
        for ch in name.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(ch.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        Self(out)
    }

    /// Accept an already-formed slug (`[a-z0-9]+(-[a-z0-9]+)*`).
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let valid = !raw.is_empty()
            && raw
                .split('-')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DomainError::validation(format!("invalid slug '{raw}'")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

/// Monetary amount in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount_minor: i64,
    /// ISO 4217 code (e.g. "USD").
    pub currency: String,
}

impl ValueObject for Money {}

impl Money {
    pub fn new(amount_minor: i64, currency: impl Into<String>) -> DomainResult<Self> {
        let currency = currency.into();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency must be a 3-letter ISO code, got '{currency}'"
            )));
        }
        Ok(Self {
            amount_minor,
            currency,
        })
    }

    /// Build from a decimal major-unit amount (e.g. `19.99`), rounding half away from zero.
    pub fn from_decimal(amount: f64, currency: impl Into<String>) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::validation("amount must be finite"));
        }
        Self::new((amount * 100.0).round() as i64, currency)
    }

    pub fn zero(currency: impl Into<String>) -> DomainResult<Self> {
        Self::new(0, currency)
    }

    pub fn as_decimal(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }

    pub fn checked_add(&self, other: &Money) -> DomainResult<Money> {
        if self.currency != other.currency {
            return Err(DomainError::invariant(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        let amount_minor = self
            .amount_minor
            .checked_add(other.amount_minor)
            .ok_or_else(|| DomainError::invariant("money overflow"))?;
        Ok(Money {
            amount_minor,
            currency: self.currency.clone(),
        })
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        write!(f, "{sign}{}.{:02} {}", abs / 100, abs % 100, self.currency)
    }
}

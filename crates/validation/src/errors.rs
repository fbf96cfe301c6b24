use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::presence::PresenceError;

/// Field-level validation failures (`field → messages`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&str> {
        self.get(field).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{field}: {message}")?;
            }
        }
        Ok(())
    }
}

/// Why a form request did not produce a validated payload.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The principal may not perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// One or more fields failed their rules.
    #[error("the given data was invalid: {0}")]
    Invalid(ValidationErrors),

    /// The body is not an object, or validated data did not fit the payload type.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// A uniqueness/existence lookup could not be performed.
    #[error(transparent)]
    Presence(#[from] PresenceError),
}

impl RequestError {
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            RequestError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email field is required.");
        errors.add("email", "The email field must be a valid email address.");
        errors.add("name", "The name field is required.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email").len(), 2);
        assert_eq!(errors.first("name"), Some("The name field is required."));
        assert!(errors.get("missing").is_empty());
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut errors = ValidationErrors::new();
        errors.add("status", "bad");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"status": ["bad"]})
        );
    }
}

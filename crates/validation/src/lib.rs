//! `tradeerp-validation`: form requests and the rule engine behind them.
//!
//! A form request bundles an authorization check, input normalization and a
//! declarative rule set for one endpoint. [`process`] runs them in order and
//! yields either a typed, validated payload or a [`RequestError`].

pub mod errors;
pub mod form_request;
pub mod input;
pub mod messages;
pub mod presence;
pub mod rule;
pub mod validator;

pub use errors::{RequestError, ValidationErrors};
pub use form_request::{process, process_as_of, FormRequest};
pub use input::Input;
pub use messages::{Attributes, Messages};
pub use presence::{InMemoryPresenceVerifier, PresenceError, PresenceVerifier};
pub use rule::{DateRef, Rule, Rules};
pub use validator::Validator;

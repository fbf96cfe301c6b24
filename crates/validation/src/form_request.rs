use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use tradeerp_auth::{Permission, Principal};

use crate::errors::{RequestError, ValidationErrors};
use crate::input::{as_number, Input};
use crate::messages::{Attributes, Messages};
use crate::presence::PresenceVerifier;
use crate::rule::{Rule, Rules};
use crate::validator::{is_boolean, is_integer, Validator};

/// One endpoint's input contract.
///
/// Only `ability`, `rules` and `Output` are mandatory; everything else has a
/// no-op default.
pub trait FormRequest: Send + Sync {
    /// Validated payload type.
    type Output: DeserializeOwned + Send;

    /// Permission required to submit this request. `None` means any
    /// authenticated principal.
    fn ability(&self) -> Option<Permission>;

    fn authorize(&self, principal: &Principal) -> bool {
        self.ability().is_none_or(|a| principal.can(&a))
    }

    fn forbidden_message(&self) -> &'static str {
        "This action is unauthorized."
    }

    /// Input normalization that runs before validation.
    fn prepare(&self, _input: &mut Input) {}

    fn rules(&self) -> Rules;

    fn messages(&self) -> Messages {
        Messages::default()
    }

    fn attributes(&self) -> Attributes {
        Attributes::default()
    }

    /// Cross-field checks that need the whole input.
    fn after(&self, _input: &Input, _errors: &mut ValidationErrors) {}
}

/// Authorize, normalize, validate and deserialize a request body.
pub async fn process<R: FormRequest>(
    request: &R,
    principal: &Principal,
    body: Value,
    verifier: &dyn PresenceVerifier,
) -> Result<R::Output, RequestError> {
    process_as_of(request, principal, body, verifier, Utc::now().date_naive()).await
}

/// [`process`] with a fixed "today" for date rules.
pub async fn process_as_of<R: FormRequest>(
    request: &R,
    principal: &Principal,
    body: Value,
    verifier: &dyn PresenceVerifier,
    today: NaiveDate,
) -> Result<R::Output, RequestError> {
    if !request.authorize(principal) {
        debug!(
            principal = %principal.principal_id,
            ability = ?request.ability(),
            "form request rejected"
        );
        return Err(RequestError::Forbidden(request.forbidden_message().to_string()));
    }

    let mut input = Input::from_value(body)?;
    input.normalize();
    request.prepare(&mut input);

    let rules = request.rules();
    let messages = request.messages();
    let attributes = request.attributes();
    let mut errors = Validator::new(&rules, &messages, &attributes)
        .today(today)
        .validate(&input, verifier)
        .await?;
    request.after(&input, &mut errors);

    if !errors.is_empty() {
        debug!(fields = errors.len(), "form request failed validation");
        return Err(RequestError::Invalid(errors));
    }

    cast(&mut input, &rules);
    let validated = Value::Object(input.only(&rules.top_level_keys()));
    serde_json::from_value(validated).map_err(|e| RequestError::Malformed(e.to_string()))
}

/// Turn string-encoded numbers and checkbox values into their JSON types so
/// typed payloads deserialize.
fn cast(input: &mut Input, rules: &Rules) {
    for (pattern, field_rules) in rules.iter() {
        for path in input.expand(pattern) {
            let Some(value) = input.get(&path).cloned() else {
                continue;
            };
            if let Some(cast) = cast_value(&value, field_rules) {
                input.replace(&path, cast);
            }
        }
    }
}

fn cast_value(value: &Value, rules: &[Rule]) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    if rules.contains(&Rule::Boolean) && is_boolean(value) {
        return match value {
            Value::Bool(_) => None,
            Value::Number(n) => Some(Value::Bool(n.as_i64() == Some(1))),
            Value::String(s) => Some(Value::Bool(s == "1")),
            _ => None,
        };
    }
    if rules.contains(&Rule::Integer) && is_integer(value) {
        return match value {
            Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        };
    }
    if rules.contains(&Rule::Numeric) {
        if let Value::String(_) = value {
            return as_number(value)
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::InMemoryPresenceVerifier;
    use serde::Deserialize;
    use serde_json::json;
    use tradeerp_auth::{PrincipalId, TenantMembership};
    use tradeerp_core::TenantId;

    fn principal(permissions: &[&'static str]) -> Principal {
        let tenant_id = TenantId::new();
        Principal {
            principal_id: PrincipalId::new(),
            active_tenant_id: tenant_id,
            membership: TenantMembership {
                tenant_id,
                roles: vec![],
                permissions: permissions.iter().map(|p| Permission::new(*p)).collect(),
            },
            user_id: Some(7),
        }
    }

    struct StoreWidget;

    #[derive(Debug, Deserialize, PartialEq)]
    struct StoreWidgetPayload {
        name: String,
        quantity: i64,
        price: f64,
        is_active: bool,
        notes: Option<String>,
    }

    impl FormRequest for StoreWidget {
        type Output = StoreWidgetPayload;

        fn ability(&self) -> Option<Permission> {
            Some(Permission::new("widgets.create"))
        }

        fn prepare(&self, input: &mut Input) {
            input.default("is_active", true);
            input.coerce_bool("is_active");
        }

        fn rules(&self) -> Rules {
            Rules::new()
                .field("name", [Rule::Required, Rule::String, Rule::Max(50.0)])
                .field("quantity", [Rule::Required, Rule::Integer, Rule::Min(0.0)])
                .field("price", [Rule::Required, Rule::Numeric, Rule::Min(0.0)])
                .field("is_active", [Rule::Boolean])
                .field("notes", [Rule::Nullable, Rule::String])
        }

        fn after(&self, input: &Input, errors: &mut ValidationErrors) {
            if input.get_str("name") == Some("forbidden") {
                errors.add("name", "That name is reserved.");
            }
        }
    }

    async fn submit(p: &Principal, body: Value) -> Result<StoreWidgetPayload, RequestError> {
        process(&StoreWidget, p, body, &InMemoryPresenceVerifier::new()).await
    }

    #[tokio::test]
    async fn unauthorized_principal_is_rejected_before_validation() {
        let err = submit(&principal(&["widgets.view"]), json!({})).await.unwrap_err();
        assert!(matches!(err, RequestError::Forbidden(m) if m == "This action is unauthorized."));
    }

    #[tokio::test]
    async fn valid_body_is_cast_filtered_and_typed() {
        let out = submit(
            &principal(&["widgets.*"]),
            json!({"name": " Bolt ", "quantity": "4", "price": "2.50", "notes": "", "extra": 1}),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            StoreWidgetPayload {
                name: "Bolt".into(),
                quantity: 4,
                price: 2.5,
                is_active: true,
                notes: None,
            }
        );
    }

    #[tokio::test]
    async fn invalid_body_reports_every_field() {
        let err = submit(&principal(&["*"]), json!({"quantity": -1, "price": "abc"}))
            .await
            .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(errors.has("name"));
        assert!(errors.has("quantity"));
        assert_eq!(errors.first("price"), Some("The price field must be a number."));
    }

    #[tokio::test]
    async fn after_hook_adds_errors() {
        let err = submit(
            &principal(&["*"]),
            json!({"name": "forbidden", "quantity": 1, "price": 1}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.validation_errors().unwrap().first("name"), Some("That name is reserved."));
    }

    #[tokio::test]
    async fn non_object_body_is_malformed() {
        let err = submit(&principal(&["*"]), json!("hello")).await.unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
    }
}

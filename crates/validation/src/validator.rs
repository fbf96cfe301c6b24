//! Rule evaluation.
//!
//! Evaluation order per concrete field path:
//! 1. `sometimes` skips absent keys;
//! 2. implicit rules (`required*`) run; a failure ends evaluation for the path;
//! 3. absent keys, and `null` values marked `nullable`, skip everything else;
//! 4. the remaining rules run in declaration order, all failures collected;
//! 5. `exists`/`unique` run last, only if nothing else failed for the path.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::errors::ValidationErrors;
use crate::input::{as_number, Input};
use crate::messages::{default_template, format_number, render, Attributes, Messages, SizeKind};
use crate::presence::{PresenceError, PresenceVerifier};
use crate::rule::{DateRef, Rule, Rules};

pub struct Validator<'a> {
    rules: &'a Rules,
    messages: &'a Messages,
    attributes: &'a Attributes,
    today: NaiveDate,
}

impl<'a> Validator<'a> {
    pub fn new(rules: &'a Rules, messages: &'a Messages, attributes: &'a Attributes) -> Self {
        Self {
            rules,
            messages,
            attributes,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin "today" for `DateRef::Today` comparisons.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Evaluate every rule against `input`.
    ///
    /// Only storage failures are returned as `Err`; rule failures land in the
    /// returned `ValidationErrors`.
    pub async fn validate(
        &self,
        input: &Input,
        verifier: &dyn PresenceVerifier,
    ) -> Result<ValidationErrors, PresenceError> {
        let mut errors = ValidationErrors::new();

        for (pattern, rules) in self.rules.iter() {
            let paths = input.expand(pattern);
            let duplicates = if rules.contains(&Rule::Distinct) {
                duplicate_paths(input, &paths)
            } else {
                HashSet::new()
            };

            for path in &paths {
                self.validate_path(input, path, rules, &duplicates, verifier, &mut errors)
                    .await?;
            }
        }

        Ok(errors)
    }

    async fn validate_path(
        &self,
        input: &Input,
        path: &str,
        rules: &[Rule],
        duplicates: &HashSet<String>,
        verifier: &dyn PresenceVerifier,
        errors: &mut ValidationErrors,
    ) -> Result<(), PresenceError> {
        let value = input.get(path);

        if rules.contains(&Rule::Sometimes) && value.is_none() {
            return Ok(());
        }

        for rule in rules.iter().filter(|r| r.is_implicit()) {
            if !self.implicit_passes(input, path, rule) {
                errors.add(path, self.message(input, path, rule, rules, value));
                return Ok(());
            }
        }

        let value = match value {
            None => return Ok(()),
            Some(Value::Null) if rules.contains(&Rule::Nullable) => return Ok(()),
            Some(v) => v,
        };

        let mut failed = false;
        for rule in rules
            .iter()
            .filter(|r| !r.is_implicit() && !r.is_modifier() && !r.is_presence())
        {
            let passes = match rule {
                Rule::Distinct => !duplicates.contains(path),
                _ => self.passes(input, value, rule, rules),
            };
            if !passes {
                errors.add(path, self.message(input, path, rule, rules, Some(value)));
                failed = true;
            }
        }

        if failed {
            return Ok(());
        }

        for rule in rules.iter().filter(|r| r.is_presence()) {
            let passes = match rule {
                Rule::Exists { table, column } => {
                    verifier.count(table, column, value, None).await? > 0
                }
                Rule::Unique {
                    table,
                    column,
                    ignore,
                } => verifier.count(table, column, value, *ignore).await? == 0,
                _ => true,
            };
            if !passes {
                errors.add(path, self.message(input, path, rule, rules, Some(value)));
            }
        }

        Ok(())
    }

    fn implicit_passes(&self, input: &Input, path: &str, rule: &Rule) -> bool {
        match rule {
            Rule::Required => input.filled(path),
            Rule::RequiredIf(other, values) => {
                let triggered = input
                    .get(other)
                    .and_then(scalar_text)
                    .is_some_and(|v| values.contains(&v.as_str()));
                !triggered || input.filled(path)
            }
            Rule::RequiredWith(other) => !input.filled(other) || input.filled(path),
            _ => true,
        }
    }

    fn passes(&self, input: &Input, value: &Value, rule: &Rule, rules: &[Rule]) -> bool {
        match rule {
            Rule::String => value.is_string(),
            Rule::Integer => is_integer(value),
            Rule::Numeric => as_number(value).is_some(),
            Rule::Boolean => is_boolean(value),
            Rule::Array => value.is_array(),
            Rule::Email => value.as_str().is_some_and(is_email),
            Rule::Url => value.as_str().is_some_and(is_url),
            Rule::Uuid => value
                .as_str()
                .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
            Rule::Date => parse_date(value).is_some(),
            Rule::AlphaDash => value.as_str().is_some_and(|s| {
                s.chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
            }),
            Rule::Min(min) => size_of(value, rules).is_some_and(|(n, _)| n >= *min),
            Rule::Max(max) => size_of(value, rules).is_some_and(|(n, _)| n <= *max),
            Rule::Between(min, max) => {
                size_of(value, rules).is_some_and(|(n, _)| n >= *min && n <= *max)
            }
            Rule::In(allowed) => match value {
                Value::Array(items) => items
                    .iter()
                    .all(|v| scalar_text(v).is_some_and(|s| allowed.contains(&s.as_str()))),
                v => scalar_text(v).is_some_and(|s| allowed.contains(&s.as_str())),
            },
            Rule::NotIn(denied) => {
                scalar_text(value).is_none_or(|s| !denied.contains(&s.as_str()))
            }
            Rule::Gte(other) => match input.get(other).and_then(as_number) {
                // Nothing to compare against.
                None => true,
                Some(other) => as_number(value).is_some_and(|v| v >= other),
            },
            Rule::After(r) => self.compare_date(input, value, *r, |a, b| a > b),
            Rule::AfterOrEqual(r) => self.compare_date(input, value, *r, |a, b| a >= b),
            Rule::BeforeOrEqual(r) => self.compare_date(input, value, *r, |a, b| a <= b),
            Rule::Required
            | Rule::RequiredIf(..)
            | Rule::RequiredWith(_)
            | Rule::Nullable
            | Rule::Sometimes
            | Rule::Distinct
            | Rule::Exists { .. }
            | Rule::Unique { .. } => true,
        }
    }

    /// A missing or unparseable reference field passes; only a parseable value
    /// against a parseable reference is compared.
    fn compare_date(
        &self,
        input: &Input,
        value: &Value,
        reference: DateRef,
        cmp: impl Fn(NaiveDateTime, NaiveDateTime) -> bool,
    ) -> bool {
        let Some(value) = parse_date(value) else {
            return false;
        };
        let reference = match reference {
            DateRef::Today => self.today.and_hms_opt(0, 0, 0),
            DateRef::Field(other) => input.get(other).and_then(parse_date),
        };
        match reference {
            Some(reference) => cmp(value, reference),
            None => true,
        }
    }

    fn message(
        &self,
        input: &Input,
        path: &str,
        rule: &Rule,
        rules: &[Rule],
        value: Option<&Value>,
    ) -> String {
        let size = value.and_then(|v| size_of(v, rules)).map(|(_, kind)| kind);
        let template = self
            .messages
            .find(path, rule.key())
            .unwrap_or_else(|| default_template(rule, size));

        let mut replacements: Vec<(&str, String)> =
            vec![("attribute", self.attributes.name_of(path))];
        match rule {
            Rule::Min(n) => replacements.push(("min", format_number(*n))),
            Rule::Max(n) => replacements.push(("max", format_number(*n))),
            Rule::Between(min, max) => {
                replacements.push(("min", format_number(*min)));
                replacements.push(("max", format_number(*max)));
            }
            Rule::RequiredIf(other, _) => {
                replacements.push(("other", self.attributes.name_of(other)));
                let current = input.get(other).and_then(scalar_text).unwrap_or_default();
                replacements.push(("value", current));
            }
            Rule::RequiredWith(other) => {
                replacements.push(("values", self.attributes.name_of(other)));
            }
            Rule::Gte(other) => {
                let v = input
                    .get(other)
                    .and_then(as_number)
                    .map(format_number)
                    .unwrap_or_else(|| self.attributes.name_of(other));
                replacements.push(("value", v));
            }
            Rule::After(r) | Rule::AfterOrEqual(r) | Rule::BeforeOrEqual(r) => {
                let date = match r {
                    DateRef::Today => "today".to_string(),
                    DateRef::Field(other) => self.attributes.name_of(other),
                };
                replacements.push(("date", date));
            }
            _ => {}
        }
        render(template, &replacements)
    }
}

/// Paths whose value also appears at another path of the same pattern.
fn duplicate_paths(input: &Input, paths: &[String]) -> HashSet<String> {
    let mut dupes = HashSet::new();
    for (i, a) in paths.iter().enumerate() {
        let Some(va) = input.get(a) else { continue };
        if va.is_null() {
            continue;
        }
        for b in paths.iter().skip(i + 1) {
            if input.get(b) == Some(va) {
                dupes.insert(a.clone());
                dupes.insert(b.clone());
            }
        }
    }
    dupes
}

/// Size used by `min`/`max`/`between`.
///
/// Numbers are measured by value only when the field is declared numeric;
/// otherwise strings by character count, arrays by length.
pub(crate) fn size_of(value: &Value, rules: &[Rule]) -> Option<(f64, SizeKind)> {
    let numeric = rules.iter().any(|r| matches!(r, Rule::Numeric | Rule::Integer));
    if numeric {
        if let Some(n) = as_number(value) {
            return Some((n, SizeKind::Numeric));
        }
    }
    match value {
        Value::String(s) => Some((s.chars().count() as f64, SizeKind::String)),
        Value::Array(items) => Some((items.len() as f64, SizeKind::Array)),
        Value::Number(n) => n.as_f64().map(|f| (f, SizeKind::Numeric)),
        _ => None,
    }
}

pub(crate) fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

pub(crate) fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Number(n) => matches!(n.as_i64(), Some(0 | 1)),
        Value::String(s) => matches!(s.as_str(), "0" | "1"),
        _ => false,
    }
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn is_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// `YYYY-MM-DD` (midnight) or RFC 3339.
pub(crate) fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?;
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::InMemoryPresenceVerifier;
    use serde_json::json;

    async fn run(rules: Rules, body: Value) -> ValidationErrors {
        run_with(rules, Messages::new(), body, &InMemoryPresenceVerifier::new()).await
    }

    async fn run_with(
        rules: Rules,
        messages: Messages,
        body: Value,
        verifier: &InMemoryPresenceVerifier,
    ) -> ValidationErrors {
        let mut input = Input::from_value(body).unwrap();
        input.normalize();
        let attributes = Attributes::new();
        Validator::new(&rules, &messages, &attributes)
            .today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .validate(&input, verifier)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn required_fails_on_missing_null_and_blank() {
        let rules = Rules::new().field("name", [Rule::Required, Rule::String]);
        for body in [json!({}), json!({"name": null}), json!({"name": "   "})] {
            let errors = run(rules.clone(), body).await;
            assert_eq!(errors.get("name"), &["The name field is required."]);
        }
    }

    #[tokio::test]
    async fn absent_optional_field_is_skipped() {
        let rules = Rules::new().field("nickname", [Rule::String, Rule::Max(10.0)]);
        assert!(run(rules, json!({})).await.is_empty());
    }

    #[tokio::test]
    async fn null_without_nullable_still_runs_type_rules() {
        let rules = Rules::new().field("nickname", [Rule::String]);
        let errors = run(rules, json!({"nickname": ""})).await;
        assert_eq!(errors.first("nickname"), Some("The nickname field must be a string."));

        let rules = Rules::new().field("nickname", [Rule::Nullable, Rule::String]);
        assert!(run(rules, json!({"nickname": ""})).await.is_empty());
    }

    #[tokio::test]
    async fn size_rules_depend_on_declared_type() {
        let rules = Rules::new()
            .field("code", [Rule::String, Rule::Max(3.0)])
            .field("qty", [Rule::Integer, Rule::Min(1.0)])
            .field("tags", [Rule::Array, Rule::Max(2.0)]);
        let errors = run(rules, json!({"code": "ABCD", "qty": "0", "tags": [1, 2, 3]})).await;
        assert_eq!(
            errors.first("code"),
            Some("The code field must not be greater than 3 characters.")
        );
        assert_eq!(errors.first("qty"), Some("The qty field must be at least 1."));
        assert_eq!(
            errors.first("tags"),
            Some("The tags field must not have more than 2 items.")
        );
    }

    #[tokio::test]
    async fn required_if_only_when_triggered() {
        let rules = Rules::new()
            .field("customer_type", [Rule::Required, Rule::In(&["individual", "business"])])
            .field("company_name", [Rule::RequiredIf("customer_type", &["business"])]);

        assert!(run(rules.clone(), json!({"customer_type": "individual"})).await.is_empty());

        let errors = run(rules, json!({"customer_type": "business"})).await;
        assert_eq!(
            errors.first("company_name"),
            Some("The company name field is required when customer type is business.")
        );
    }

    #[tokio::test]
    async fn wildcard_rules_report_concrete_paths() {
        let rules = Rules::new()
            .field("items", [Rule::Required, Rule::Array, Rule::Min(1.0)])
            .field("items.*.quantity", [Rule::Required, Rule::Integer, Rule::Min(1.0)]);
        let errors = run(
            rules,
            json!({"items": [{"quantity": 2}, {"quantity": 0}, {}]}),
        )
        .await;
        assert!(!errors.has("items.0.quantity"));
        assert_eq!(
            errors.first("items.1.quantity"),
            Some("The items.1.quantity field must be at least 1.")
        );
        assert_eq!(
            errors.first("items.2.quantity"),
            Some("The items.2.quantity field is required.")
        );
    }

    #[tokio::test]
    async fn distinct_flags_every_duplicate() {
        let rules = Rules::new().field("ids.*", [Rule::Integer, Rule::Distinct]);
        let errors = run(rules, json!({"ids": [1, 2, 1]})).await;
        assert!(errors.has("ids.0"));
        assert!(!errors.has("ids.1"));
        assert!(errors.has("ids.2"));
    }

    #[tokio::test]
    async fn date_comparisons_against_fields_and_today() {
        let rules = Rules::new()
            .field("starts_at", [Rule::Required, Rule::Date])
            .field("ends_at", [Rule::Required, Rule::Date, Rule::After(DateRef::Field("starts_at"))])
            .field("effective_date", [Rule::Date, Rule::AfterOrEqual(DateRef::Today)]);
        let errors = run(
            rules,
            json!({"starts_at": "2025-06-10", "ends_at": "2025-06-10", "effective_date": "2025-05-31"}),
        )
        .await;
        assert_eq!(
            errors.first("ends_at"),
            Some("The ends at field must be a date after starts at.")
        );
        assert_eq!(
            errors.first("effective_date"),
            Some("The effective date field must be a date after or equal to today.")
        );
    }

    #[tokio::test]
    async fn gte_compares_numerically() {
        let rules = Rules::new()
            .field("min_price", [Rule::Nullable, Rule::Numeric])
            .field("max_price", [Rule::Nullable, Rule::Numeric, Rule::Gte("min_price")]);
        let errors = run(rules.clone(), json!({"min_price": "50", "max_price": 20})).await;
        assert_eq!(
            errors.first("max_price"),
            Some("The max price field must be greater than or equal to 50.")
        );
        assert!(run(rules, json!({"max_price": 20})).await.is_empty());
    }

    #[tokio::test]
    async fn presence_rules_use_the_verifier() {
        let verifier = InMemoryPresenceVerifier::new()
            .with_row("brands", 3, json!({"name": "Acme"}))
            .with_row("products", 8, json!({"sku": "SKU-1"}));
        let rules = Rules::new()
            .field("brand_id", [Rule::Nullable, Rule::Integer, Rule::exists("brands", "id")])
            .field("sku", [Rule::Required, Rule::String, Rule::unique("products", "sku")]);

        let errors = run_with(
            rules.clone(),
            Messages::new(),
            json!({"brand_id": 4, "sku": "SKU-1"}),
            &verifier,
        )
        .await;
        assert_eq!(errors.first("brand_id"), Some("The selected brand id is invalid."));
        assert_eq!(errors.first("sku"), Some("The sku has already been taken."));

        let errors = run_with(rules, Messages::new(), json!({"brand_id": "3", "sku": "SKU-2"}), &verifier).await;
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn presence_is_skipped_after_other_failures() {
        let verifier = InMemoryPresenceVerifier::new().with_row("users", 1, json!({"email": "taken"}));
        let rules = Rules::new().field("email", [Rule::Email, Rule::unique("users", "email")]);
        let errors = run_with(rules, Messages::new(), json!({"email": "taken"}), &verifier).await;
        assert_eq!(errors.get("email").len(), 1);
    }

    #[tokio::test]
    async fn custom_messages_override_defaults() {
        let rules = Rules::new().field("rating", [Rule::Required, Rule::Integer, Rule::Between(1.0, 5.0)]);
        let messages = Messages::new().with("rating.between", "Ratings go from 1 to 5 stars.");
        let errors = run_with(rules, messages, json!({"rating": 9}), &InMemoryPresenceVerifier::new()).await;
        assert_eq!(errors.get("rating"), &["Ratings go from 1 to 5 stars."]);
    }

    #[test]
    fn format_checks() {
        assert!(is_email("ops@acme.io"));
        assert!(!is_email("ops@acme"));
        assert!(!is_email("ops @acme.io"));
        assert!(is_url("https://acme.io/path?q=1"));
        assert!(!is_url("ftp://acme.io"));
        assert!(parse_date(&json!("2025-02-30")).is_none());
        assert!(parse_date(&json!("2025-02-03T10:00:00Z")).is_some());
        assert!(is_boolean(&json!("1")));
        assert!(!is_boolean(&json!("yes")));
        assert!(is_integer(&json!(i64::MAX)));
        assert!(!is_integer(&json!(u64::MAX)));
        assert!(!is_integer(&json!("9223372036854775808")));
    }
}

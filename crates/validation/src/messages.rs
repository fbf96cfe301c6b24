//! Message templates and attribute naming.

use crate::rule::Rule;

/// How a size rule measured the value; picks the message variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeKind {
    Numeric,
    String,
    Array,
}

/// Custom messages keyed by `"field.rule"` (wildcards allowed) or bare `"rule"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Messages {
    entries: Vec<(String, String)>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.entries.push((key.into(), message.into()));
        self
    }

    /// Most specific custom message for a concrete path and rule.
    pub(crate) fn find(&self, path: &str, rule: &str) -> Option<&str> {
        let exact = format!("{path}.{rule}");
        if let Some((_, m)) = self.entries.iter().find(|(k, _)| *k == exact) {
            return Some(m);
        }
        let wildcard = self.entries.iter().find(|(k, _)| {
            k.strip_suffix(rule)
                .and_then(|field| field.strip_suffix('.'))
                .is_some_and(|field| pattern_matches(field, path))
        });
        if let Some((_, m)) = wildcard {
            return Some(m);
        }
        self.entries
            .iter()
            .find(|(k, _)| k == rule)
            .map(|(_, m)| m.as_str())
    }
}

/// Display names for fields (`"items.*.product_id" → "product"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pattern: impl Into<String>, name: impl Into<String>) -> Self {
        self.entries.push((pattern.into(), name.into()));
        self
    }

    /// Display name for a concrete path: a declared name, else the path with
    /// underscores turned into spaces.
    pub fn name_of(&self, path: &str) -> String {
        self.entries
            .iter()
            .find(|(p, _)| pattern_matches(p, path))
            .map(|(_, n)| n.clone())
            .unwrap_or_else(|| path.replace('_', " "))
    }
}

/// Does a field pattern (with `*` segments) match a concrete path?
pub(crate) fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pat = pattern.split('.');
    let mut concrete = path.split('.');
    loop {
        match (pat.next(), concrete.next()) {
            (None, None) => return true,
            (Some("*"), Some(_)) => continue,
            (Some(a), Some(b)) if a == b => continue,
            _ => return false,
        }
    }
}

/// English default template for a failed rule.
pub(crate) fn default_template(rule: &Rule, size: Option<SizeKind>) -> &'static str {
    match rule {
        Rule::Required => "The :attribute field is required.",
        Rule::RequiredIf(..) => "The :attribute field is required when :other is :value.",
        Rule::RequiredWith(_) => "The :attribute field is required when :values is present.",
        Rule::String => "The :attribute field must be a string.",
        Rule::Integer => "The :attribute field must be an integer.",
        Rule::Numeric => "The :attribute field must be a number.",
        Rule::Boolean => "The :attribute field must be true or false.",
        Rule::Array => "The :attribute field must be an array.",
        Rule::Email => "The :attribute field must be a valid email address.",
        Rule::Url => "The :attribute field must be a valid URL.",
        Rule::Uuid => "The :attribute field must be a valid UUID.",
        Rule::Date => "The :attribute field must be a valid date.",
        Rule::AlphaDash => {
            "The :attribute field must only contain letters, numbers, dashes, and underscores."
        }
        Rule::Min(_) => match size {
            Some(SizeKind::String) => "The :attribute field must be at least :min characters.",
            Some(SizeKind::Array) => "The :attribute field must have at least :min items.",
            _ => "The :attribute field must be at least :min.",
        },
        Rule::Max(_) => match size {
            Some(SizeKind::String) => {
                "The :attribute field must not be greater than :max characters."
            }
            Some(SizeKind::Array) => "The :attribute field must not have more than :max items.",
            _ => "The :attribute field must not be greater than :max.",
        },
        Rule::Between(..) => match size {
            Some(SizeKind::String) => {
                "The :attribute field must be between :min and :max characters."
            }
            Some(SizeKind::Array) => "The :attribute field must have between :min and :max items.",
            _ => "The :attribute field must be between :min and :max.",
        },
        Rule::In(_) | Rule::NotIn(_) | Rule::Exists { .. } => "The selected :attribute is invalid.",
        Rule::Gte(_) => "The :attribute field must be greater than or equal to :value.",
        Rule::After(_) => "The :attribute field must be a date after :date.",
        Rule::AfterOrEqual(_) => "The :attribute field must be a date after or equal to :date.",
        Rule::BeforeOrEqual(_) => "The :attribute field must be a date before or equal to :date.",
        Rule::Distinct => "The :attribute field has a duplicate value.",
        Rule::Unique { .. } => "The :attribute has already been taken.",
        Rule::Nullable | Rule::Sometimes => "The :attribute field is invalid.",
    }
}

/// Replace `:name` placeholders. Longer names go first so `:values` wins over `:value`.
pub(crate) fn render(template: &str, replacements: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = replacements.iter().collect();
    sorted.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
    let mut out = template.to_string();
    for (key, value) in sorted {
        out = out.replace(&format!(":{key}"), value);
    }
    out
}

/// Format a rule parameter the way people write it (`255`, not `255.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

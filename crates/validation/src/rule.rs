//! Declarative rule model.

/// Reference point for date comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateRef {
    /// Another field of the same request.
    Field(&'static str),
    /// The current date (UTC).
    Today,
}

/// A single validation constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    /// Required when `field` equals one of `values`.
    RequiredIf(&'static str, &'static [&'static str]),
    /// Required when `field` is filled.
    RequiredWith(&'static str),
    Nullable,
    /// Only validate when the key is present.
    Sometimes,
    String,
    Integer,
    Numeric,
    Boolean,
    Array,
    Email,
    Url,
    Uuid,
    Date,
    AlphaDash,
    Min(f64),
    Max(f64),
    Between(f64, f64),
    In(&'static [&'static str]),
    NotIn(&'static [&'static str]),
    /// Numerically greater than or equal to another field.
    Gte(&'static str),
    After(DateRef),
    AfterOrEqual(DateRef),
    BeforeOrEqual(DateRef),
    /// No duplicates among the values matched by a wildcard pattern.
    Distinct,
    Exists {
        table: &'static str,
        column: &'static str,
    },
    Unique {
        table: &'static str,
        column: &'static str,
        /// Row id excluded from the check (the record being updated).
        ignore: Option<i64>,
    },
}

impl Rule {
    pub fn exists(table: &'static str, column: &'static str) -> Self {
        Self::Exists { table, column }
    }

    pub fn unique(table: &'static str, column: &'static str) -> Self {
        Self::Unique {
            table,
            column,
            ignore: None,
        }
    }

    pub fn unique_ignoring(table: &'static str, column: &'static str, id: i64) -> Self {
        Self::Unique {
            table,
            column,
            ignore: Some(id),
        }
    }

    /// Rule name used as the message key (`"email.unique"`).
    pub fn key(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::RequiredIf(..) => "required_if",
            Rule::RequiredWith(_) => "required_with",
            Rule::Nullable => "nullable",
            Rule::Sometimes => "sometimes",
            Rule::String => "string",
            Rule::Integer => "integer",
            Rule::Numeric => "numeric",
            Rule::Boolean => "boolean",
            Rule::Array => "array",
            Rule::Email => "email",
            Rule::Url => "url",
            Rule::Uuid => "uuid",
            Rule::Date => "date",
            Rule::AlphaDash => "alpha_dash",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Between(..) => "between",
            Rule::In(_) => "in",
            Rule::NotIn(_) => "not_in",
            Rule::Gte(_) => "gte",
            Rule::After(_) => "after",
            Rule::AfterOrEqual(_) => "after_or_equal",
            Rule::BeforeOrEqual(_) => "before_or_equal",
            Rule::Distinct => "distinct",
            Rule::Exists { .. } => "exists",
            Rule::Unique { .. } => "unique",
        }
    }

    /// Implicit rules run even when the field is absent.
    pub fn is_implicit(&self) -> bool {
        matches!(self, Rule::Required | Rule::RequiredIf(..) | Rule::RequiredWith(_))
    }

    /// Rules that only steer evaluation and never fail on their own.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Rule::Nullable | Rule::Sometimes)
    }

    /// Rules that consult storage.
    pub fn is_presence(&self) -> bool {
        matches!(self, Rule::Exists { .. } | Rule::Unique { .. })
    }
}

/// Field pattern → rule list, in declaration order.
///
/// Patterns are dotted paths; `*` matches every element of an array
/// (`"items.*.quantity"`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rules {
    entries: Vec<(String, Vec<Rule>)>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or extend) the rules for a field pattern.
    pub fn field(mut self, pattern: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let pattern = pattern.into();
        let rules: Vec<Rule> = rules.into_iter().collect();
        match self.entries.iter_mut().find(|(p, _)| *p == pattern) {
            Some((_, existing)) => existing.extend(rules),
            None => self.entries.push((pattern, rules)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r.as_slice()))
    }

    pub fn get(&self, pattern: &str) -> Option<&[Rule]> {
        self.entries
            .iter()
            .find(|(p, _)| p == pattern)
            .map(|(_, r)| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First path segment of every pattern, deduplicated, in order.
    pub fn top_level_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (pattern, _) in &self.entries {
            let head = pattern.split('.').next().unwrap_or(pattern);
            if !keys.contains(&head) {
                keys.push(head);
            }
        }
        keys
    }
}

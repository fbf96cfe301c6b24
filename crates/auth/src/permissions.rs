use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission (ability) identifier.
///
/// Abilities are `<area>.<action>` strings (e.g. `"products.create"`).
/// The wildcard `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Area prefix (`"products"` for `"products.create"`).
    pub fn area(&self) -> &str {
        self.as_str().split('.').next().unwrap_or("")
    }

    /// Whether holding `self` satisfies a check for `required`.
    ///
    /// `"*"` matches everything, `"<area>.*"` matches every ability in the area.
    pub fn grants(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self == required {
            return true;
        }
        match self.as_str().strip_suffix(".*") {
            Some(area) => required.area() == area,
            None => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_wildcard_grants_only_its_area() {
        let held = Permission::new("providers.*");
        assert!(held.grants(&Permission::new("providers.create")));
        assert!(!held.grants(&Permission::new("products.create")));
    }

    #[test]
    fn global_wildcard_grants_everything() {
        assert!(Permission::WILDCARD.grants(&Permission::new("employees.terminate")));
    }
}

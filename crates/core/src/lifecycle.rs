//! Status lifecycles expressed as static allow-lists.
//!
//! Each status enum lists the states it may move to. There is no state machine
//! runtime: callers ask whether a move is allowed and record the new status.

use crate::error::{DomainError, DomainResult};

pub trait Lifecycle: Copy + PartialEq + core::fmt::Debug + 'static {
    /// States reachable from `self` in a single step.
    fn allowed_transitions(&self) -> &'static [Self];

    /// Wire name of the state (e.g. `"active"`).
    fn as_str(&self) -> &'static str;

    fn can_transition_to(&self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// True when no transition leaves this state.
    fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    fn transition_to(&self, next: Self) -> DomainResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::invariant(format!(
                "cannot transition from '{}' to '{}'",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

/// A status move that was applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub from: S,
    pub to: S,
}

impl<S: Lifecycle> StatusChange<S> {
    /// Check `from -> to` against the allow-list.
    pub fn checked(from: S, to: S) -> DomainResult<Self> {
        from.transition_to(to).map(|to| Self { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        Amber,
        Red,
        Broken,
    }

    impl Lifecycle for Light {
        fn allowed_transitions(&self) -> &'static [Self] {
            match self {
                Light::Green => &[Light::Amber, Light::Broken],
                Light::Amber => &[Light::Red, Light::Broken],
                Light::Red => &[Light::Green, Light::Broken],
                Light::Broken => &[],
            }
        }

        fn as_str(&self) -> &'static str {
            match self {
                Light::Green => "green",
                Light::Amber => "amber",
                Light::Red => "red",
                Light::Broken => "broken",
            }
        }
    }

    #[test]
    fn allowed_transition_returns_next_state() {
        assert_eq!(Light::Green.transition_to(Light::Amber), Ok(Light::Amber));
    }

    #[test]
    fn disallowed_transition_names_both_states() {
        let err = Light::Green.transition_to(Light::Red).unwrap_err();
        assert_eq!(
            err,
            DomainError::invariant("cannot transition from 'green' to 'red'")
        );
    }

    #[test]
    fn same_state_is_not_a_transition() {
        assert!(!Light::Amber.can_transition_to(Light::Amber));
    }

    #[test]
    fn terminal_state_has_no_exits() {
        assert!(Light::Broken.is_terminal());
        assert!(!Light::Red.is_terminal());
    }
}

//! `PolicyGuard`: composable resolution-time rules. Each rule returns an
//! allow/deny verdict as a plain value — never by throwing — so the engine
//! decides how to surface a denial (`DiError::PolicyBlocked`).
//!
//! No direct teacher precedent exists for a composable policy-rule chain;
//! the builder/rule-composition shape is loosely modeled on `validation.rs`'s
//! `ValidationBuilder`, adapted from a compile-time validation pass to a
//! per-resolution runtime check.

use crate::glob;
use crate::id::ServiceId;

/// The result of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow)
    }
}

/// One composable rule. Rules are evaluated in registration order; the first
/// denial short-circuits the rest (all-of semantics).
pub trait PolicyRule: Send + Sync {
    /// `known` is true if `id` is a registered definition or a loadable,
    /// instantiable class under the current autowiring rules.
    fn check(&self, id: &str, known: bool) -> Verdict;
}

/// Denies resolution of an id with no registered definition and no
/// autowireable class when strict mode is enabled.
pub struct StrictRule;

impl PolicyRule for StrictRule {
    fn check(&self, id: &str, known: bool) -> Verdict {
        if known {
            Verdict::Allow
        } else {
            Verdict::Deny(format!("strict mode: `{id}` is not a registered definition or loadable class"))
        }
    }
}

/// Denies any id that does not start with one of the configured namespace
/// prefixes.
pub struct AllowlistRule {
    pub prefixes: Vec<String>,
}

impl PolicyRule for AllowlistRule {
    fn check(&self, id: &str, _known: bool) -> Verdict {
        if glob::has_prefix(&self.prefixes, id) {
            Verdict::Allow
        } else {
            Verdict::Deny(format!("`{id}` is outside the allowed namespaces"))
        }
    }
}

/// Denies any id matching a forbidden glob pattern.
pub struct DenylistRule {
    pub patterns: Vec<String>,
}

impl PolicyRule for DenylistRule {
    fn check(&self, id: &str, _known: bool) -> Verdict {
        if self.patterns.iter().any(|p| glob::matches(p, id)) {
            Verdict::Deny(format!("`{id}` matches a denied pattern"))
        } else {
            Verdict::Allow
        }
    }
}

/// A composite guard: every rule must allow (all-of semantics), short
/// circuiting at the first denial.
#[derive(Default)]
pub struct PolicyGuard {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl PolicyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: Box<dyn PolicyRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn check(&self, id: &ServiceId, known: bool) -> Verdict {
        for rule in &self.rules {
            let verdict = rule.check(id.as_str(), known);
            if !verdict.is_allow() {
                return verdict;
            }
        }
        Verdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_guard_always_allows() {
        let guard = PolicyGuard::new();
        assert_eq!(guard.check(&ServiceId::new("Anything"), false), Verdict::Allow);
    }

    #[test]
    fn strict_rule_denies_unknown_ids() {
        let guard = PolicyGuard::new().with_rule(Box::new(StrictRule));
        assert!(!guard.check(&ServiceId::new("Unknown"), false).is_allow());
        assert!(guard.check(&ServiceId::new("Known"), true).is_allow());
    }

    #[test]
    fn allowlist_rule_restricts_namespace() {
        let guard = PolicyGuard::new().with_rule(Box::new(AllowlistRule {
            prefixes: vec!["App\\".into()],
        }));
        assert!(guard.check(&ServiceId::new("App\\Service"), true).is_allow());
        assert!(!guard.check(&ServiceId::new("Vendor\\Service"), true).is_allow());
    }

    #[test]
    fn denylist_blocks_matching_pattern() {
        let guard = PolicyGuard::new().with_rule(Box::new(DenylistRule {
            patterns: vec!["App\\Internal\\*".into()],
        }));
        assert!(!guard.check(&ServiceId::new("App\\Internal\\Secret"), true).is_allow());
        assert!(guard.check(&ServiceId::new("App\\Public\\Api"), true).is_allow());
    }

    #[test]
    fn composite_guard_short_circuits_on_first_denial() {
        let guard = PolicyGuard::new()
            .with_rule(Box::new(StrictRule))
            .with_rule(Box::new(AllowlistRule {
                prefixes: vec!["App\\".into()],
            }));
        assert!(!guard.check(&ServiceId::new("Unknown"), false).is_allow());
    }
}

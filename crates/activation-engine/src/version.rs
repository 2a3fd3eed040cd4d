//! Version constraint evaluation
//!
//! Constraints look like `>=1.2.0`, `!=2`, or a bare `1.4` (which means
//! `>=1.4`). Evaluation never fails: a constraint that does not parse is
//! compared as a plain `>=` bound using the whole string.

use activation_types::defaults;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static CONSTRAINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(>=|<=|==|!=|>|<|=)?\s*(\d+(?:\.\d+)*)\s*$")
        .expect("constraint pattern is valid")
});

/// Comparison operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    Equal,
    NotEqual,
}

impl Comparator {
    /// Parse an operator token; `=` and `==` are synonyms
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            "=" | "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    /// Whether `current <op> bound` holds given `current.cmp(bound)`
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::Greater => ordering == Ordering::Greater,
            Self::Less => ordering == Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
            Self::NotEqual => ordering != Ordering::Equal,
        }
    }

    fn default_operator() -> Self {
        Self::parse(defaults::VERSION_OPERATOR).unwrap_or(Self::GreaterOrEqual)
    }
}

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub comparator: Comparator,
    pub bound: String,
    /// False when the expression did not match the constraint grammar
    pub well_formed: bool,
}

impl VersionConstraint {
    pub fn parse(expression: &str) -> Self {
        match CONSTRAINT_PATTERN.captures(expression) {
            Some(caps) => {
                let comparator = caps
                    .get(1)
                    .and_then(|op| Comparator::parse(op.as_str()))
                    .unwrap_or_else(Comparator::default_operator);
                let bound = caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                Self {
                    comparator,
                    bound,
                    well_formed: true,
                }
            }
            None => Self {
                comparator: Comparator::default_operator(),
                bound: expression.trim().to_string(),
                well_formed: false,
            },
        }
    }

    /// Whether `current` satisfies this constraint
    pub fn matches(&self, current: &str) -> bool {
        self.comparator
            .holds(compare_versions(current, &self.bound))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator.as_str(), self.bound)
    }
}

/// Check `current` against an optional constraint expression.
///
/// An absent or blank constraint is always satisfied.
pub fn satisfies(current: &str, constraint: Option<&str>) -> bool {
    match constraint.map(str::trim) {
        None | Some("") => true,
        Some(expression) => VersionConstraint::parse(expression).matches(current),
    }
}

/// Dotted-numeric ordering; missing trailing components count as zero.
///
/// Anything before the first digit is ignored, then each component
/// contributes its leading digits: `v3.1-beta` reads as `3.1` and a
/// component with no digits reads as `0`.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = components(left);
    let right = components(right);
    let len = left.len().max(right.len());

    for i in 0..len {
        let a = left.get(i).copied().unwrap_or(0);
        let b = right.get(i).copied().unwrap_or(0);
        match a.cmp(&b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn components(version: &str) -> Vec<u64> {
    version
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .split('.')
        .map(|part| {
            let digits: &str = {
                let end = part
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(part.len());
                &part[..end]
            };
            if digits.is_empty() {
                0
            } else {
                digits.parse().unwrap_or(u64::MAX)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_absent_constraint_always_satisfied() {
        assert!(satisfies("0.0.1", None));
        assert!(satisfies("0.0.1", Some("")));
        assert!(satisfies("", Some("   ")));
    }

    #[test]
    fn test_operator_defaults_to_at_least() {
        let constraint = VersionConstraint::parse("1.2.0");
        assert_eq!(constraint.comparator, Comparator::GreaterOrEqual);
        assert!(constraint.well_formed);
        assert!(satisfies("1.2.0", Some("1.2.0")));
        assert!(satisfies("1.10.0", Some("1.2.0")));
        assert!(!satisfies("1.1.9", Some("1.2.0")));
    }

    #[test]
    fn test_each_operator() {
        assert!(satisfies("2.0.0", Some(">1.9.9")));
        assert!(!satisfies("1.9.9", Some(">1.9.9")));
        assert!(satisfies("1.0.0", Some("<1.0.1")));
        assert!(satisfies("1.0.1", Some("<=1.0.1")));
        assert!(satisfies("1.0.0", Some("=1.0")));
        assert!(satisfies("1.0.0", Some("==1")));
        assert!(!satisfies("1.0.1", Some("==1")));
        assert!(satisfies("1.0.1", Some("!=1.0.0")));
        assert!(!satisfies("1.0.0", Some("!=1")));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2.0.1", "1.2"), Ordering::Greater);
        assert_eq!(compare_versions("1.9", "1.10"), Ordering::Less);
    }

    #[test]
    fn test_malformed_constraint_falls_back_to_at_least() {
        let constraint = VersionConstraint::parse("~>1.2.0");
        assert!(!constraint.well_formed);
        assert_eq!(constraint.comparator, Comparator::GreaterOrEqual);
        assert_eq!(constraint.bound, "~>1.2.0");
        assert!(!satisfies("0.0.1", Some("~>1.2.0")));
        assert!(satisfies("1.3", Some("~>1.2.0")));

        assert!(satisfies("2.0", Some(">= 1.5.x")));
        assert!(!satisfies("1.4", Some(">= 1.5.x")));
    }

    #[test]
    fn test_lenient_current_version() {
        assert!(satisfies("3.1-beta", Some(">=3.1")));
        assert!(satisfies("v2.0.0", Some(">=2")));
        assert!(!satisfies("", Some(">=0.0.1")));
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(VersionConstraint::parse(" = 1.2 ").to_string(), "==1.2");
    }

    fn version_strategy() -> impl Strategy<Value = Vec<u32>> {
        proptest::collection::vec(0u32..20, 1..5)
    }

    fn render(parts: &[u32]) -> String {
        parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn padded_cmp(a: &[u32], b: &[u32]) -> Ordering {
        let len = a.len().max(b.len());
        let pad = |v: &[u32]| {
            let mut v = v.to_vec();
            v.resize(len, 0);
            v
        };
        pad(a).cmp(&pad(b))
    }

    proptest! {
        #[test]
        fn property_constraint_matches_direct_comparison(
            current in version_strategy(),
            bound in version_strategy(),
            op in prop::sample::select(vec!["", ">=", "<=", ">", "<", "=", "==", "!="]),
        ) {
            let ordering = padded_cmp(&current, &bound);
            let expected = match op {
                "" | ">=" => ordering != Ordering::Less,
                "<=" => ordering != Ordering::Greater,
                ">" => ordering == Ordering::Greater,
                "<" => ordering == Ordering::Less,
                "=" | "==" => ordering == Ordering::Equal,
                _ => ordering != Ordering::Equal,
            };
            let constraint = format!("{op}{}", render(&bound));
            prop_assert_eq!(satisfies(&render(&current), Some(&constraint)), expected);
        }
    }
}

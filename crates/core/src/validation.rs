//! Ordered, short-circuiting rule validation
//!
//! Rules are evaluated in the order they are chained. The first rule that
//! fails is recorded and every later rule is skipped, so the outcome always
//! names exactly one violated rule.
//!
//! # Example
//!
//! ```rust
//! use apkforge_core::validation::Validator;
//!
//! let outcome = Validator::new()
//!     .ordered("minSdk<=targetSdk", ("minSdk", 36), ("targetSdk", 35))
//!     .positive("versionCode>0", "versionCode", 1)
//!     .validate();
//!
//! assert_eq!(outcome.unwrap_err().rule, "minSdk<=targetSdk");
//! ```

use crate::error::Error as CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

/// The first rule that failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{rule}: {message}")]
pub struct Violation {
    /// Rule name, e.g. `minSdk<=targetSdk`
    pub rule: String,
    /// Human-readable explanation
    pub message: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl Violation {
    /// Create a violation with only a message
    pub fn new(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

impl From<Violation> for CoreError {
    fn from(violation: Violation) -> Self {
        let mut err = CoreError::constraint_violation(&violation.rule, &violation.message);
        if let (Some(expected), Some(actual)) = (&violation.expected, &violation.actual) {
            err = err.with_context(format!("expected {}, found {}", expected, actual));
        }
        err
    }
}

/// Fluent validator builder
#[derive(Debug, Default)]
pub struct Validator {
    failure: Option<Violation>,
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    fn check(mut self, f: impl FnOnce() -> Option<Violation>) -> Self {
        if self.failure.is_none() {
            self.failure = f();
        }
        self
    }

    /// Validate that `lower <= upper`
    pub fn ordered<T: PartialOrd + Display>(
        self,
        rule: &str,
        lower: (&str, T),
        upper: (&str, T),
    ) -> Self {
        self.check(|| {
            let ((lower_name, lower), (upper_name, upper)) = (lower, upper);
            (lower > upper).then(|| {
                Violation::new(
                    rule,
                    format!("{} ({}) must not exceed {} ({})", lower_name, lower, upper_name, upper),
                )
                .with_values(format!("{} <= {}", lower_name, upper_name), format!("{} > {}", lower, upper))
            })
        })
    }

    /// Validate that a number is strictly positive
    pub fn positive(self, rule: &str, field: &str, value: i64) -> Self {
        self.check(|| {
            (value <= 0).then(|| {
                Violation::new(rule, format!("{} must be a positive integer", field))
                    .with_values("> 0", value.to_string())
            })
        })
    }

    /// Validate that a collection is not empty
    pub fn non_empty<T>(self, rule: &str, field: &str, items: &[T]) -> Self {
        self.check(|| {
            items.is_empty().then(|| {
                Violation::new(rule, format!("{} must contain at least one entry", field))
                    .with_values("non-empty list", "empty list")
            })
        })
    }

    /// Validate that every value is in a list of allowed values
    pub fn all_one_of<'a>(
        self,
        rule: &str,
        field: &str,
        values: impl IntoIterator<Item = &'a str>,
        allowed: &[&str],
    ) -> Self {
        self.check(|| {
            values
                .into_iter()
                .find(|value| !allowed.contains(value))
                .map(|value| {
                    Violation::new(
                        rule,
                        format!("{} entry `{}` must be one of: {}", field, value, allowed.join(", ")),
                    )
                    .with_values(allowed.join(", "), value)
                })
        })
    }

    /// Validate against a compiled regex
    pub fn pattern(self, rule: &str, field: &str, value: &str, re: &Regex, description: &str) -> Self {
        self.check(|| {
            (!re.is_match(value)).then(|| {
                Violation::new(rule, format!("{} must match {}", field, description))
                    .with_values(description, value)
            })
        })
    }

    /// Add a custom rule; the closure is only evaluated if no earlier rule failed
    pub fn custom<F>(self, rule: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        self.check(|| f().map(|message| Violation::new(rule, message)))
    }

    /// Complete validation
    pub fn validate(self) -> Result<(), Violation> {
        match self.failure {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ordered_validation() {
        let err = Validator::new()
            .ordered("minSdk<=targetSdk", ("minSdk", 36), ("targetSdk", 35))
            .validate()
            .unwrap_err();
        assert_eq!(err.rule, "minSdk<=targetSdk");
        assert_eq!(err.actual.as_deref(), Some("36 > 35"));
    }

    #[test]
    fn test_positive_validation() {
        let err = Validator::new()
            .positive("versionCode>0", "versionCode", 0)
            .validate()
            .unwrap_err();
        assert_eq!(err.rule, "versionCode>0");
    }

    #[test]
    fn test_non_empty_validation() {
        let empty: [&str; 0] = [];
        let err = Validator::new()
            .non_empty("abiFilters non-empty", "abiFilters", &empty)
            .validate()
            .unwrap_err();
        assert_eq!(err.rule, "abiFilters non-empty");
    }

    #[test]
    fn test_all_one_of_reports_first_unknown() {
        let err = Validator::new()
            .all_one_of("known", "abiFilters", ["x86", "mips", "riscv"], &["x86", "x86_64"])
            .validate()
            .unwrap_err();
        assert!(err.message.contains("`mips`"));
    }

    #[test]
    fn test_pattern_validation() {
        let re = Regex::new(r"^[a-z]+(\.[a-z]+)+$").unwrap();
        let err = Validator::new()
            .pattern("reverse-domain", "applicationId", "app", &re, "reverse-domain form")
            .validate()
            .unwrap_err();
        assert_eq!(err.rule, "reverse-domain");
    }

    #[test]
    fn test_first_failure_wins() {
        let err = Validator::new()
            .positive("first", "a", -1)
            .positive("second", "b", -2)
            .validate()
            .unwrap_err();
        assert_eq!(err.rule, "first");
    }

    #[test]
    fn test_custom_not_evaluated_after_failure() {
        let mut evaluated = false;
        let _ = Validator::new()
            .positive("first", "a", 0)
            .custom("second", || {
                evaluated = true;
                None
            })
            .validate();
        assert!(!evaluated);
    }

    #[test]
    fn test_violation_into_error() {
        let err: CoreError = Violation::new("versionCode>0", "must be positive").into();
        assert_eq!(err.code, crate::ErrorCode::ConstraintViolation);
        assert!(err.message.contains("versionCode>0"));
    }

    #[test]
    fn test_chained_validation() {
        let result = Validator::new()
            .ordered("a<=b", ("a", 1), ("b", 2))
            .positive("p", "p", 3)
            .non_empty("n", "n", &[1])
            .validate();
        assert!(result.is_ok());
    }

    proptest! {
        #[test]
        fn prop_ordered_accepts_exactly_non_decreasing(a in 1u32..100, b in 1u32..100) {
            let ok = Validator::new().ordered("a<=b", ("a", a), ("b", b)).validate().is_ok();
            prop_assert_eq!(ok, a <= b);
        }
    }
}

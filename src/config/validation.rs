//! Catalog validation
//!
//! Runs on a fully deserialized [`Catalog`] and collects every issue
//! instead of stopping at the first one.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::schema::Catalog;
use crate::error::{Severity, ValidationIssue};
use crate::exercise::Exercise;

/// Result of catalog validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Catalog validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a catalog and returns every error and warning found.
    pub fn validate(&mut self, catalog: &Catalog) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let mut seen = HashSet::new();
        for (i, exercise) in catalog.exercises.iter().enumerate() {
            let path = format!("exercises[{i}]");
            self.validate_exercise(exercise, &path);

            if !exercise.name.trim().is_empty() && !seen.insert(exercise.name.as_str()) {
                self.error(
                    format!("{path}.name"),
                    format!("duplicate exercise name '{}'", exercise.name),
                );
            }
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_exercise(&mut self, exercise: &Exercise, path: &str) {
        if exercise.name.trim().is_empty() {
            self.error(format!("{path}.name"), "exercise name must not be empty");
        }

        if exercise.baby_steps_activated {
            if exercise.baby_steps_test_time == Duration::ZERO {
                self.error(
                    format!("{path}.baby_steps_test_time"),
                    "babysteps are activated but the test budget is zero",
                );
            }
            if exercise.baby_steps_code_time == Duration::ZERO {
                self.error(
                    format!("{path}.baby_steps_code_time"),
                    "babysteps are activated but the code budget is zero",
                );
            }
        }

        if exercise.tests.is_empty() {
            self.warning(path.to_string(), "exercise has no test files");
        }
    }

    fn error(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path,
            message: message.into(),
            severity: Severity::Error,
        });
    }

    fn warning(&mut self, path: String, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path,
            message: message.into(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::SourceFile;

    fn with_test(name: &str) -> Exercise {
        Exercise::new(name).with_tests(vec![SourceFile::new("T", "")])
    }

    #[test]
    fn test_valid_catalog() {
        let catalog = Catalog {
            exercises: vec![
                with_test("fizzbuzz")
                    .with_baby_steps(Duration::from_secs(60), Duration::from_secs(90)),
                with_test("roman"),
            ],
        };
        let result = Validator::new().validate(&catalog);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_names() {
        let catalog = Catalog {
            exercises: vec![with_test("a"), with_test("b"), with_test("a")],
        };
        let result = Validator::new().validate(&catalog);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "exercises[2].name");
    }

    #[test]
    fn test_empty_name() {
        let catalog = Catalog {
            exercises: vec![with_test("  ")],
        };
        let result = Validator::new().validate(&catalog);
        assert!(result.has_errors());
        assert!(result.errors[0].message.contains("empty"));
    }

    #[test]
    fn test_activated_zero_budget() {
        let mut exercise = with_test("a");
        exercise.baby_steps_activated = true;
        exercise.baby_steps_code_time = Duration::from_secs(30);

        let result = Validator::new().validate(&Catalog {
            exercises: vec![exercise],
        });
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "exercises[0].baby_steps_test_time");
    }

    #[test]
    fn test_zero_budget_ignored_when_deactivated() {
        let result = Validator::new().validate(&Catalog {
            exercises: vec![with_test("a")],
        });
        assert!(result.is_valid());
    }

    #[test]
    fn test_missing_tests_is_warning() {
        let result = Validator::new().validate(&Catalog {
            exercises: vec![Exercise::new("a")],
        });
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_validator_reusable() {
        let mut validator = Validator::new();
        let bad = Catalog {
            exercises: vec![Exercise::new("")],
        };
        assert!(validator.validate(&bad).has_errors());
        let good = Catalog {
            exercises: vec![with_test("a")],
        };
        assert!(validator.validate(&good).is_valid());
    }
}

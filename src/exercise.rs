//! Exercise data model
//!
//! An [`Exercise`] is a kata as handed to the engine by the selection
//! collaborator: source and test files plus the babystep budgets. The
//! engine never looks inside the files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single named source file of an exercise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File or class name
    pub name: String,
    /// Full file contents
    #[serde(default)]
    pub content: String,
}

impl SourceFile {
    /// Creates a new source file.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A kata together with its babystep configuration.
///
/// The exercise originally selected and the last submission judged valid
/// are both `Exercise` values; they share a name but their file contents
/// diverge as the learner works.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique name within a catalog
    pub name: String,

    /// Free-form description shown to the learner
    #[serde(default)]
    pub description: String,

    /// Production code files
    #[serde(default)]
    pub code: Vec<SourceFile>,

    /// Test files
    #[serde(default)]
    pub tests: Vec<SourceFile>,

    /// Whether babystep budgets are enforced for this exercise
    #[serde(default)]
    pub baby_steps_activated: bool,

    /// Budget for writing production code (GREEN)
    #[serde(default, with = "human_duration")]
    pub baby_steps_code_time: Duration,

    /// Budget for writing a failing test (RED)
    #[serde(default, with = "human_duration")]
    pub baby_steps_test_time: Duration,
}

impl Exercise {
    /// Creates an exercise with no files and babysteps disabled.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a copy with babysteps enabled and the given budgets.
    #[must_use]
    pub fn with_baby_steps(mut self, test_time: Duration, code_time: Duration) -> Self {
        self.baby_steps_activated = true;
        self.baby_steps_test_time = test_time;
        self.baby_steps_code_time = code_time;
        self
    }

    /// Returns a copy with the given production files.
    #[must_use]
    pub fn with_code(mut self, code: Vec<SourceFile>) -> Self {
        self.code = code;
        self
    }

    /// Returns a copy with the given test files.
    #[must_use]
    pub fn with_tests(mut self, tests: Vec<SourceFile>) -> Self {
        self.tests = tests;
        self
    }
}

/// Chooses the exercise a session works on.
///
/// Returning `None` means the learner cancelled the selection.
pub trait ExerciseSelector: Send {
    /// Asks for the next exercise.
    fn select_exercise(&mut self) -> Option<Exercise>;
}

/// Serde adapter for durations written as `"90s"`, `"2m"`, `"1h 30m"`.
pub mod human_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes a duration in humantime form.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    /// Deserializes a duration from humantime form.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string is not a valid duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let exercise = Exercise::default();
        assert!(exercise.name.is_empty());
        assert!(!exercise.baby_steps_activated);
        assert_eq!(exercise.baby_steps_code_time, Duration::ZERO);
        assert_eq!(exercise.baby_steps_test_time, Duration::ZERO);
    }

    #[test]
    fn test_with_baby_steps() {
        let exercise = Exercise::new("fizzbuzz")
            .with_baby_steps(Duration::from_secs(120), Duration::from_secs(180));
        assert!(exercise.baby_steps_activated);
        assert_eq!(exercise.baby_steps_test_time, Duration::from_secs(120));
        assert_eq!(exercise.baby_steps_code_time, Duration::from_secs(180));
    }

    #[test]
    fn test_yaml_durations() {
        let yaml = r"
name: roman
baby_steps_activated: true
baby_steps_code_time: 3m
baby_steps_test_time: 90s
code:
  - name: Roman
    content: 'class Roman {}'
";
        let exercise: Exercise = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(exercise.name, "roman");
        assert_eq!(exercise.baby_steps_code_time, Duration::from_secs(180));
        assert_eq!(exercise.baby_steps_test_time, Duration::from_secs(90));
        assert_eq!(exercise.code[0].name, "Roman");
        assert!(exercise.tests.is_empty());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let yaml = "name: x\nbaby_steps_code_time: soon\n";
        let result: Result<Exercise, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_serializes_human_form() {
        let exercise = Exercise::new("x").with_baby_steps(Duration::from_secs(90), Duration::ZERO);
        let json = serde_json::to_value(&exercise).unwrap();
        assert_eq!(json["baby_steps_test_time"], "1m 30s");
        assert_eq!(json["baby_steps_code_time"], "0s");
    }
}

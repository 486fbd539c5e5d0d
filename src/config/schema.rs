//! Catalog schema
//!
//! A catalog file lists the exercises a session may pick from:
//!
//! ```yaml
//! exercises:
//!   - name: fizzbuzz
//!     baby_steps_activated: true
//!     baby_steps_test_time: 2m
//!     baby_steps_code_time: 3m
//!     code:
//!       - name: FizzBuzz
//!         content: "public class FizzBuzz {}"
//! ```

use serde::{Deserialize, Serialize};

use crate::exercise::Exercise;

/// The set of exercises available to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Exercises in catalog order
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Catalog {
    /// Looks up an exercise by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.name == name)
    }

    /// Exercise names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exercises.iter().map(|e| e.name.as_str())
    }
}

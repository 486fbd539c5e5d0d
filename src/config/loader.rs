//! Catalog loader
//!
//! Loading pipeline:
//! 1. Size check against [`CatalogLimits`]
//! 2. Read (UTF-8 BOM stripped)
//! 3. YAML parsing into a typed [`Catalog`]
//! 4. Validation, collecting every issue

use std::path::Path;

use crate::config::schema::Catalog;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Limits that keep a catalog from exhausting memory.
#[derive(Debug, Clone)]
pub struct CatalogLimits {
    /// Maximum catalog file size in bytes.
    pub max_catalog_size: usize,

    /// Maximum number of exercises.
    pub max_exercises: usize,
}

impl Default for CatalogLimits {
    fn default() -> Self {
        Self {
            max_catalog_size: env_or("TDDTRAINER_MAX_CATALOG_SIZE", 1024 * 1024),
            max_exercises: env_or("TDDTRAINER_MAX_EXERCISES", 500),
        }
    }
}

/// Result of loading a catalog file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated catalog.
    pub catalog: Catalog,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during catalog loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Catalog loader.
#[derive(Debug, Default)]
pub struct CatalogLoader {
    limits: CatalogLimits,
}

impl CatalogLoader {
    /// Creates a loader with the given limits.
    #[must_use]
    pub const fn new(limits: CatalogLimits) -> Self {
        Self { limits }
    }

    /// Loads and validates a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file or exercise count exceeds the limits
    /// - YAML parsing fails
    /// - Validation finds errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.limits.max_catalog_size {
            return Err(ConfigError::LimitExceeded {
                what: "catalog size",
                actual: file_size,
                limit: self.limits.max_catalog_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        self.load_str(raw, path)
    }

    /// Parses and validates catalog text; `path` is used for messages only.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], minus the file access errors.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        if raw.trim().is_empty() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "catalog file is empty".to_string(),
            });
        }

        let catalog: Catalog = serde_yaml::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

        if catalog.exercises.len() > self.limits.max_exercises {
            return Err(ConfigError::LimitExceeded {
                what: "exercise count",
                actual: catalog.exercises.len(),
                limit: self.limits.max_exercises,
            });
        }

        let result = Validator::new().validate(&catalog);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        let warnings = result
            .warnings
            .into_iter()
            .map(|issue| LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            })
            .collect();

        Ok(LoadResult { catalog, warnings })
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

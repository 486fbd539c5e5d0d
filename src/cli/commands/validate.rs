//! Catalog validation command
//!
//! Loads each catalog with the regular loader and reports the outcome per
//! file. Stops at the first file that fails.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{CatalogLoader, LoadResult, LoadWarning};
use crate::error::{ConfigError, Severity, TrainerError, ValidationIssue};

/// Per-file result as printed in JSON mode.
#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: &'a str,
    valid: bool,
    exercises: usize,
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// Validate every catalog named in `args`.
///
/// # Errors
///
/// Returns the loader error of the first invalid file. With `--strict`,
/// warnings are promoted to a validation error.
pub fn run(args: &ValidateArgs) -> Result<(), TrainerError> {
    let loader = CatalogLoader::default();

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating catalog");
        let file = path.display().to_string();

        let result = loader
            .load(path)
            .and_then(|loaded| promote_warnings(path, loaded, args.strict));

        match result {
            Ok(loaded) => {
                for warning in &loaded.warnings {
                    tracing::warn!(
                        location = warning.location.as_deref().unwrap_or("<unknown>"),
                        "{}",
                        warning.message
                    );
                }
                report(
                    args.format,
                    &FileReport {
                        file: &file,
                        valid: true,
                        exercises: loaded.catalog.exercises.len(),
                        warnings: loaded.warnings.iter().map(ToString::to_string).collect(),
                        errors: Vec::new(),
                    },
                );
            }
            Err(err) => {
                let errors = match &err {
                    ConfigError::ValidationError { errors, .. } => {
                        errors.iter().map(ToString::to_string).collect()
                    }
                    other => vec![other.to_string()],
                };
                report(
                    args.format,
                    &FileReport {
                        file: &file,
                        valid: false,
                        exercises: 0,
                        warnings: Vec::new(),
                        errors,
                    },
                );
                return Err(err.into());
            }
        }
    }

    Ok(())
}

fn promote_warnings(
    path: &Path,
    loaded: LoadResult,
    strict: bool,
) -> Result<LoadResult, ConfigError> {
    if !strict || loaded.warnings.is_empty() {
        return Ok(loaded);
    }
    Err(ConfigError::ValidationError {
        path: path.display().to_string(),
        errors: loaded.warnings.into_iter().map(as_error).collect(),
    })
}

fn as_error(warning: LoadWarning) -> ValidationIssue {
    ValidationIssue {
        path: warning.location.unwrap_or_default(),
        message: warning.message,
        severity: Severity::Error,
    }
}

fn report(format: OutputFormat, file: &FileReport<'_>) {
    match format {
        OutputFormat::Human => {
            if file.valid {
                println!(
                    "{}: ok ({} exercises, {} warnings)",
                    file.file,
                    file.exercises,
                    file.warnings.len()
                );
            } else {
                println!("{}: invalid", file.file);
                for error in &file.errors {
                    println!("  {error}");
                }
            }
        }
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(file) {
                println!("{line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn catalog_file(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    fn args(files: Vec<PathBuf>, strict: bool) -> ValidateArgs {
        ValidateArgs {
            files,
            format: OutputFormat::Json,
            strict,
        }
    }

    #[test]
    fn test_valid_catalog_passes() {
        let file = catalog_file("exercises:\n  - name: a\n    tests:\n      - name: T\n");
        assert!(run(&args(vec![file.path().to_path_buf()], false)).is_ok());
    }

    #[test]
    fn test_warning_fails_only_when_strict() {
        let file = catalog_file("exercises:\n  - name: a\n");
        assert!(run(&args(vec![file.path().to_path_buf()], false)).is_ok());

        let err = run(&args(vec![file.path().to_path_buf()], true)).unwrap_err();
        assert!(matches!(
            err,
            TrainerError::Config(ConfigError::ValidationError { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_stops_at_first_invalid_file() {
        let good = catalog_file("exercises:\n  - name: a\n    tests:\n      - name: T\n");
        let err = run(&args(
            vec![good.path().to_path_buf(), PathBuf::from("/nonexistent.yaml")],
            false,
        ))
        .unwrap_err();
        assert!(matches!(
            err,
            TrainerError::Config(ConfigError::MissingFile { .. })
        ));
    }
}

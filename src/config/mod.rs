//! Configuration module
//!
//! Loading and validation of exercise catalog files.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{CatalogLimits, CatalogLoader, LoadResult, LoadWarning};
pub use schema::Catalog;
pub use validation::{ValidationResult, Validator};

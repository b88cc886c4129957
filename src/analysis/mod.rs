//! Line classification and semantic checks for properties files.
//!
//! This module provides:
//! - `${name}` expansion against an injected variable lookup
//! - Structural classification of a line into key, operator, value and comment
//! - Loaded configuration sources and cross-source override detection
//! - Existence checks for path-like values

pub mod classify;
pub mod expand;
pub mod overrides;
pub mod paths;
pub mod sources;

pub use classify::{classify, looks_like_path, split_value_spans, split_values, LineClass};
pub use expand::{expand, Environment, VariableLookup};
pub use overrides::{build_error_message, detect_overrides, OverrideReport};
pub use paths::{validate_path, FileSystem, PathCheck, PathExistenceCheck};
pub use sources::{parse_properties, ConfigurationSource, SourceRegistry};

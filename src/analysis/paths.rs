//! Validation of path-like values against the filesystem.

use std::path::{Path, PathBuf};

use super::expand::{expand, VariableLookup};
use crate::document::{Region, RegionKind};

/// Answers whether a path exists.
pub trait PathExistenceCheck: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Existence check against the real filesystem.
///
/// Relative paths are resolved against `base` when one is set, otherwise
/// against the process working directory.
#[derive(Debug, Clone, Default)]
pub struct FileSystem {
    base: Option<PathBuf>,
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl PathExistenceCheck for FileSystem {
    fn exists(&self, path: &str) -> bool {
        let path = Path::new(path);
        match &self.base {
            Some(base) if path.is_relative() => base.join(path).exists(),
            _ => path.exists(),
        }
    }
}

/// Result of validating one path-like value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    pub ok: bool,
    /// `Invalid path:<expanded value>` when the path is missing.
    pub message: Option<String>,
    /// Invalid path region over the raw value when the path is missing.
    pub region: Option<Region>,
}

/// Check that `raw`, starting at `offset`, names an existing path.
///
/// The lookup uses the raw value with surrounding whitespace removed; the
/// expanded value only appears in the message.
pub fn validate_path(
    raw: &str,
    offset: usize,
    vars: &dyn VariableLookup,
    fs: &dyn PathExistenceCheck,
) -> PathCheck {
    if fs.exists(raw.trim()) {
        return PathCheck {
            ok: true,
            message: None,
            region: None,
        };
    }

    let expanded = expand(raw, vars);
    PathCheck {
        ok: false,
        message: Some(format!("Invalid path:{}", expanded)),
        region: Some(Region::new(offset, raw.len(), RegionKind::InvalidPath)),
    }
}

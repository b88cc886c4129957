//! Settings infrastructure for jpfsp.
//!
//! This module provides support for loading and parsing jpfsp.toml files, which
//! name the configuration sources a properties file is checked against and the
//! variables available to `${name}` placeholders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::{ConfigurationSource, Environment, SourceRegistry};

/// Name of the settings file searched for by [`discover_settings`].
pub const SETTINGS_FILE: &str = "jpfsp.toml";

/// Root settings structure loaded from jpfsp.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// The application properties file being edited.
    /// Defaults to the path of the open document.
    pub app: Option<PathBuf>,

    /// Configuration sources, in load order.
    /// Paths are relative to the directory containing jpfsp.toml.
    pub sources: Option<Vec<PathBuf>>,

    /// Values for `${name}` placeholders; the process environment fills in the rest.
    pub variables: Option<HashMap<String, String>>,
}

/// Load settings from a jpfsp.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Warning: failed to parse {}: {}", SETTINGS_FILE, e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover jpfsp.toml by searching up the directory tree, then direct children.
///
/// Search order:
/// 1. Walk up from `start_dir` to filesystem root
/// 2. If not found, check immediate child directories of `start_dir`
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the directory
/// containing the found jpfsp.toml (used for resolving relative paths).
/// If not found, returns `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    // Phase 1: Walk up from start_dir
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    // Phase 2: Check immediate child directories
    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join(SETTINGS_FILE);
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

/// The origin string for a file: its canonical path when it exists.
pub fn origin_of(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn resolve(path: &Path, settings_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        settings_dir.join(path)
    }
}

/// Read one properties file into a configuration source.
pub fn load_source(path: &Path) -> std::io::Result<ConfigurationSource> {
    let text = std::fs::read_to_string(path)?;
    Ok(ConfigurationSource::parse(origin_of(path), &text))
}

/// Load every configured source, in order.
///
/// Sources that can't be read are skipped with a warning; the rest still load.
pub fn load_sources(settings: &Settings, settings_dir: &Path) -> SourceRegistry {
    let Some(paths) = settings.sources.as_ref() else {
        return SourceRegistry::new();
    };

    let mut registry = SourceRegistry::new();
    for path in paths {
        let full_path = resolve(path, settings_dir);
        match load_source(&full_path) {
            Ok(source) => registry.push(source),
            Err(e) => {
                eprintln!(
                    "Warning: failed to read configuration source '{}': {}",
                    full_path.display(),
                    e
                );
            }
        }
    }
    registry
}

/// Origin of the document being edited.
///
/// The `app` setting wins; otherwise the document's own path is used.
pub fn current_origin(
    settings: &Settings,
    settings_dir: &Path,
    document: Option<&Path>,
) -> Option<String> {
    match (&settings.app, document) {
        (Some(app), _) => Some(origin_of(&resolve(app, settings_dir))),
        (None, Some(document)) => Some(origin_of(document)),
        (None, None) => None,
    }
}

/// Variable lookup for `${name}` expansion.
pub fn build_environment(settings: &Settings) -> Environment {
    Environment::new(settings.variables.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::VariableLookup;

    /// Create a unique temp directory for test isolation.
    fn make_test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("jpfsp-test")
            .join(name)
            .join(format!("{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup_test_dir(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn parse_full_settings() {
        let settings: Settings = toml::from_str(
            r#"
app = "Racer.jpf"
sources = ["site.properties", "jpf-core/jpf.properties"]

[variables]
"jpf-core" = "/opt/jpf-core"
"#,
        )
        .unwrap();

        assert_eq!(settings.app, Some(PathBuf::from("Racer.jpf")));
        assert_eq!(settings.sources.as_ref().map(Vec::len), Some(2));
        let env = build_environment(&settings);
        assert_eq!(env.lookup("jpf-core").as_deref(), Some("/opt/jpf-core"));
    }

    #[test]
    fn empty_settings_parse() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.app.is_none());
        assert!(settings.sources.is_none());
        assert!(settings.variables.is_none());
    }

    #[test]
    fn invalid_settings_fall_back_to_default() {
        let dir = make_test_dir("invalid");
        std::fs::write(dir.join(SETTINGS_FILE), "sources = 42").unwrap();

        let settings = load_settings(&dir.join(SETTINGS_FILE));
        assert!(settings.sources.is_none());

        cleanup_test_dir(&dir);
    }

    #[test]
    fn discover_settings_in_current_dir() {
        let dir = make_test_dir("discover-current");
        std::fs::write(dir.join(SETTINGS_FILE), "sources = [\"a.properties\"]\n").unwrap();

        let (settings, settings_dir) = discover_settings(&dir);
        assert_eq!(settings_dir, dir);
        assert_eq!(settings.sources.unwrap(), vec![PathBuf::from("a.properties")]);

        cleanup_test_dir(&dir);
    }

    #[test]
    fn discover_settings_in_parent_dir() {
        let parent = make_test_dir("discover-parent");
        let child = parent.join("subdir");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(parent.join(SETTINGS_FILE), "app = \"app.jpf\"\n").unwrap();

        let (settings, settings_dir) = discover_settings(&child);
        assert_eq!(settings_dir, parent);
        assert_eq!(settings.app, Some(PathBuf::from("app.jpf")));

        cleanup_test_dir(&parent);
    }

    #[test]
    fn discover_settings_in_child_dir() {
        let parent = make_test_dir("discover-child");
        let child = parent.join("config");
        std::fs::create_dir_all(&child).unwrap();
        std::fs::write(child.join(SETTINGS_FILE), "[variables]\nx = \"1\"\n").unwrap();

        let (settings, settings_dir) = discover_settings(&parent);
        assert_eq!(settings_dir, child);
        assert!(settings.variables.is_some());

        cleanup_test_dir(&parent);
    }

    #[test]
    fn load_sources_skips_unreadable_files() {
        let dir = make_test_dir("load-sources");
        std::fs::write(dir.join("site.properties"), "target=Racer\n").unwrap();
        std::fs::write(dir.join("jpf.properties"), "listener=a.B\n").unwrap();

        let settings = Settings {
            sources: Some(vec![
                PathBuf::from("site.properties"),
                PathBuf::from("missing.properties"),
                dir.join("jpf.properties"),
            ]),
            ..Default::default()
        };

        let registry = load_sources(&settings, &dir);
        assert_eq!(registry.len(), 2);
        let origins: Vec<_> = registry.iter().map(|s| s.origin().to_string()).collect();
        assert_eq!(
            origins,
            vec![
                origin_of(&dir.join("site.properties")),
                origin_of(&dir.join("jpf.properties")),
            ]
        );
        assert_eq!(registry.iter().next().unwrap().get("target"), Some("Racer"));

        cleanup_test_dir(&dir);
    }

    #[test]
    fn load_sources_without_settings() {
        let registry = load_sources(&Settings::default(), Path::new("."));
        assert!(registry.is_empty());
    }

    #[test]
    fn current_origin_prefers_app_setting() {
        let dir = make_test_dir("origin");
        let app = dir.join("app.jpf");
        let doc = dir.join("other.jpf");
        std::fs::write(&app, "").unwrap();
        std::fs::write(&doc, "").unwrap();

        let settings = Settings {
            app: Some(PathBuf::from("app.jpf")),
            ..Default::default()
        };
        assert_eq!(
            current_origin(&settings, &dir, Some(&doc)),
            Some(origin_of(&app))
        );
        assert_eq!(
            current_origin(&Settings::default(), &dir, Some(&doc)),
            Some(origin_of(&doc))
        );
        assert_eq!(current_origin(&Settings::default(), &dir, None), None);

        cleanup_test_dir(&dir);
    }
}

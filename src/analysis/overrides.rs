//! Detection of keys that redefine a property from another source.

use super::sources::SourceRegistry;

/// Outcome of checking one key against the loaded sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideReport {
    /// One message per overridden source, in load order.
    pub warnings: Vec<String>,
    /// Whether the key should be highlighted as redefined.
    pub flagged: bool,
}

/// Check whether `key` is also defined by a source other than the current document.
///
/// Sources whose origin equals `current_origin` are the document's own
/// definition and never count. With no current origin every defining source
/// is reported.
pub fn detect_overrides(
    key: &str,
    current_origin: Option<&str>,
    registry: &SourceRegistry,
) -> OverrideReport {
    let warnings: Vec<String> = registry
        .iter()
        .filter(|source| source.contains_key(key))
        .filter(|source| Some(source.origin()) != current_origin)
        .map(|source| format!("Warning: {} is overriding {}", key, source.origin()))
        .collect();

    OverrideReport {
        flagged: !warnings.is_empty(),
        warnings,
    }
}

/// Wrap messages in the lightweight HTML used for the warning line.
pub fn build_error_message<S: AsRef<str>>(messages: &[S]) -> String {
    let messages: Vec<&str> = messages.iter().map(|m| m.as_ref()).collect();
    format!("<HTML>{}</HTML>", messages.join("<BR>"))
}

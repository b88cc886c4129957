//! Loaded configuration sources.
//!
//! A source is the key/value content of one properties file together with the
//! origin it was loaded from. The registry keeps sources in load order.

use std::collections::HashMap;

/// One loaded configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSource {
    entries: HashMap<String, String>,
    origin: String,
}

impl ConfigurationSource {
    pub fn new(origin: impl Into<String>, entries: HashMap<String, String>) -> Self {
        Self {
            entries,
            origin: origin.into(),
        }
    }

    /// Build a source from the text of a properties file.
    pub fn parse(origin: impl Into<String>, text: &str) -> Self {
        Self::new(origin, parse_properties(text))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration sources in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<ConfigurationSource>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: ConfigurationSource) {
        self.sources.push(source);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every source defining `key`, with the value it assigns, in load order.
    pub fn definitions<'a>(
        &'a self,
        key: &'a str,
    ) -> impl Iterator<Item = (&'a ConfigurationSource, &'a str)> + 'a {
        self.sources
            .iter()
            .filter_map(move |source| source.get(key).map(|value| (source, value)))
    }
}

impl From<Vec<ConfigurationSource>> for SourceRegistry {
    fn from(sources: Vec<ConfigurationSource>) -> Self {
        Self { sources }
    }
}

impl FromIterator<ConfigurationSource> for SourceRegistry {
    fn from_iter<I: IntoIterator<Item = ConfigurationSource>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

/// Parse properties text into key/value pairs.
///
/// Follows the usual `.properties` rules: `#` and `!` comment lines, `=` or
/// `:` (or whitespace) between key and value, a trailing backslash continues
/// the logical line, and backslash escapes are decoded. A `+` left at the end
/// of a key by `key+=value` is dropped so appends register under the key they
/// extend. Later definitions of a key replace earlier ones.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut lines = text.lines();

    while let Some(first) = lines.next() {
        let first = first.trim_start();
        if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
            continue;
        }

        let mut logical = String::from(first);
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_key_value(&logical);
        let mut key = unescape(key);
        if key.ends_with('+') {
            key.pop();
        }
        entries.insert(key, unescape(value));
    }

    entries
}

/// An odd number of trailing backslashes escapes the line break.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    let rest = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key, rest.trim_start_matches([' ', '\t', '\x0c']))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_pairs() {
        let entries = parse_properties("a=1\nb : 2\nc 3\n");
        assert_eq!(entries.get("a").map(String::as_str), Some("1"));
        assert_eq!(entries.get("b").map(String::as_str), Some("2"));
        assert_eq!(entries.get("c").map(String::as_str), Some("3"));
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let entries = parse_properties("# comment\n! bang\n\n   \nkey=value\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("key").map(String::as_str), Some("value"));
    }

    #[test]
    fn parse_trims_key_and_leading_value_whitespace() {
        let entries = parse_properties("   target  =  Racer ");
        assert_eq!(entries.get("target").map(String::as_str), Some("Racer "));
    }

    #[test]
    fn parse_joins_continuation_lines() {
        let entries = parse_properties("classpath=build/main,\\\n    build/peers\nnext=1");
        assert_eq!(
            entries.get("classpath").map(String::as_str),
            Some("build/main,build/peers")
        );
        assert_eq!(entries.get("next").map(String::as_str), Some("1"));
    }

    #[test]
    fn parse_escaped_backslash_is_not_continuation() {
        let entries = parse_properties("dir=C:\\\\\nnext=1");
        assert_eq!(entries.get("dir").map(String::as_str), Some("C:\\"));
        assert_eq!(entries.get("next").map(String::as_str), Some("1"));
    }

    #[test]
    fn parse_escaped_separator_in_key() {
        let entries = parse_properties("a\\=b=c");
        assert_eq!(entries.get("a=b").map(String::as_str), Some("c"));
    }

    #[test]
    fn parse_unicode_escape() {
        let entries = parse_properties("greeting=caf\\u00e9");
        assert_eq!(entries.get("greeting").map(String::as_str), Some("café"));
    }

    #[test]
    fn parse_append_registers_base_key() {
        let entries = parse_properties("listener+=gov.nasa.jpf.Listener");
        assert_eq!(
            entries.get("listener").map(String::as_str),
            Some("gov.nasa.jpf.Listener")
        );
    }

    #[test]
    fn parse_later_definition_wins() {
        let entries = parse_properties("a=1\na=2");
        assert_eq!(entries.get("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn registry_definitions_follow_load_order() {
        let registry: SourceRegistry = vec![
            ConfigurationSource::parse("first", "k=1"),
            ConfigurationSource::parse("second", "other=2"),
            ConfigurationSource::parse("third", "k=3"),
        ]
        .into();

        let defs: Vec<_> = registry
            .definitions("k")
            .map(|(source, value)| (source.origin(), value))
            .collect();
        assert_eq!(defs, vec![("first", "1"), ("third", "3")]);
        assert_eq!(registry.len(), 3);
    }
}

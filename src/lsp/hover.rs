//! Hover information for properties files.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position};

use crate::analysis::{classify, expand, looks_like_path, split_value_spans};
use crate::document::PropertyDocument;

/// Describe where a key is defined across the loaded sources.
fn format_key_docs(doc: &PropertyDocument, key: &str) -> String {
    let mut text = format!("**{}**", key.trim());
    let mut definitions = doc.registry().definitions(key).peekable();

    if definitions.peek().is_none() {
        text.push_str("\n\nNot defined in any loaded configuration source.");
        return text;
    }

    text.push_str("\n\nDefined in:");
    for (source, value) in definitions {
        text.push_str(&format!("\n- `{}` = `{}`", source.origin(), value));
        if Some(source.origin()) == doc.current_origin() {
            text.push_str(" (this file)");
        }
    }
    text
}

/// Describe the value under the cursor, if expanding it changes anything.
fn format_value_docs(doc: &PropertyDocument, value: &str) -> Option<String> {
    let expanded = expand(value, doc.variables());
    if expanded == value {
        return None;
    }
    let kind = if looks_like_path(value) {
        "Path"
    } else {
        "Value"
    };
    Some(format!("{}: `{}`", kind, expanded.trim()))
}

/// Produce hover text for the key or value under `position`.
pub fn hover_at_position(doc: &PropertyDocument, position: Position) -> Option<Hover> {
    let line_index = doc.line_index();
    let offset = line_index.position_to_offset(position)?;
    let line = line_index.line_of_offset(offset);
    let line_start = line_index.line_start(line);
    let text = line_index.line_text(line);
    let column = offset - line_start;

    let class = classify(text);
    let assignment = class.assignment.as_ref()?;

    let (value, span) = if column <= assignment.key.end && !assignment.key.is_empty() {
        let docs = format_key_docs(doc, assignment.key_text(text));
        (docs, assignment.key.clone())
    } else if column >= assignment.value.start {
        let relative = column - assignment.value.start;
        let (start, part) = split_value_spans(assignment.value_text(text))
            .into_iter()
            .find(|(start, part)| relative >= *start && relative <= start + part.len())?;
        let docs = format_value_docs(doc, part)?;
        let start = assignment.value.start + start;
        (docs, start..start + part.len())
    } else {
        return None;
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(line_index.span_to_range(&(line_start + span.start..line_start + span.end))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ConfigurationSource, FileSystem, SourceRegistry};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn document(text: &str) -> PropertyDocument {
        let registry: SourceRegistry = vec![
            ConfigurationSource::parse("app.jpf", "target=Racer"),
            ConfigurationSource::parse("site.properties", "target=Other"),
        ]
        .into();
        let vars: HashMap<String, String> = [("jpf-core".to_string(), "/opt/jpf".to_string())]
            .into_iter()
            .collect();
        PropertyDocument::attach(
            text.to_string(),
            registry,
            Some("app.jpf".to_string()),
            Arc::new(vars),
            Arc::new(FileSystem::new()),
        )
    }

    fn hover_text(hover: Hover) -> String {
        match hover.contents {
            HoverContents::Markup(markup) => markup.value,
            other => panic!("unexpected hover contents: {:?}", other),
        }
    }

    #[test]
    fn hover_on_key_lists_definitions() {
        let doc = document("target=Racer");
        let hover = hover_at_position(&doc, Position::new(0, 2)).unwrap();
        let text = hover_text(hover);
        assert!(text.starts_with("**target**"));
        assert!(text.contains("- `app.jpf` = `Racer` (this file)"));
        assert!(text.contains("- `site.properties` = `Other`"));
    }

    #[test]
    fn hover_on_unknown_key() {
        let doc = document("classpath=build");
        let text = hover_text(hover_at_position(&doc, Position::new(0, 0)).unwrap());
        assert!(text.contains("Not defined"));
    }

    #[test]
    fn hover_on_value_shows_expansion() {
        let doc = document("cp=a,${jpf-core}/build");
        let hover = hover_at_position(&doc, Position::new(0, 8)).unwrap();
        let range = hover.range.unwrap();
        assert_eq!(range.start.character, 5);
        assert_eq!(range.end.character, 22);
        assert_eq!(hover_text(hover), "Path: `/opt/jpf/build`");
    }

    #[test]
    fn no_hover_on_plain_value_or_malformed_line() {
        let doc = document("cp=a,b\nbroken");
        assert!(hover_at_position(&doc, Position::new(0, 5)).is_none());
        assert!(hover_at_position(&doc, Position::new(1, 2)).is_none());
    }
}

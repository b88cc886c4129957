//! Diagnostics conversion from line findings to LSP diagnostics.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::document::{Finding, PropertyDocument, RegionKind};

/// Blank and comment-only lines are malformed by classification, but not worth an error.
fn is_reportable(doc: &PropertyDocument, finding: &Finding) -> bool {
    match finding.kind {
        RegionKind::Malformed => {
            let text = doc.text()[finding.span.clone()].trim_start();
            !text.is_empty() && !text.starts_with('#')
        }
        _ => true,
    }
}

/// Convert all findings of a document to LSP diagnostics.
pub fn to_diagnostics(doc: &PropertyDocument) -> Vec<Diagnostic> {
    doc.findings()
        .into_iter()
        .filter(|finding| is_reportable(doc, finding))
        .map(|finding| {
            let (severity, code) = match finding.kind {
                RegionKind::RedefinedKey => (DiagnosticSeverity::WARNING, "redefined-key"),
                RegionKind::InvalidPath => (DiagnosticSeverity::WARNING, "invalid-path"),
                _ => (DiagnosticSeverity::ERROR, "malformed"),
            };

            Diagnostic {
                range: doc.line_index().span_to_range(&finding.span),
                severity: Some(severity),
                code: Some(NumberOrString::String(code.to_string())),
                code_description: None,
                source: Some("jpfsp".to_string()),
                message: finding.message,
                related_information: None,
                tags: None,
                data: None,
            }
        })
        .collect()
}

//! Semantic tokens for properties syntax highlighting.
//!
//! Regions may overlap, so each line is painted region by region (later
//! regions on top) and the painted runs become tokens.

use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend,
};

use crate::document::{LineIndex, PropertyDocument, RegionKind};

/// Token type indices (must match LEGEND order).
pub mod token_types {
    pub const PROPERTY: u32 = 0;
    pub const OPERATOR: u32 = 1;
    pub const STRING: u32 = 2;
    pub const COMMENT: u32 = 3;
    pub const MALFORMED: u32 = 4;
}

/// Token modifier bit flags.
pub mod token_modifiers {
    pub const REDEFINED: u32 = 1 << 0;
    pub const INVALID_PATH: u32 = 1 << 1;
}

/// Get the semantic tokens legend for capability declaration.
pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: vec![
            SemanticTokenType::PROPERTY,
            SemanticTokenType::OPERATOR,
            SemanticTokenType::STRING,
            SemanticTokenType::COMMENT,
            SemanticTokenType::new("malformed"),
        ],
        token_modifiers: vec![
            SemanticTokenModifier::new("redefined"),
            SemanticTokenModifier::new("invalidPath"),
        ],
    }
}

/// A raw token before delta encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawToken {
    start: usize,
    end: usize,
    token_type: u32,
    token_modifiers: u32,
}

/// How a region kind changes the style of the text under it.
enum Paint {
    /// Replace the style.
    Type(u32),
    /// Keep the style, add a modifier.
    Modifier(u32),
}

fn paint_for(kind: RegionKind) -> Paint {
    match kind {
        RegionKind::Key => Paint::Type(token_types::PROPERTY),
        RegionKind::Value => Paint::Type(token_types::STRING),
        RegionKind::Assignment => Paint::Type(token_types::OPERATOR),
        RegionKind::Comment => Paint::Type(token_types::COMMENT),
        RegionKind::Malformed => Paint::Type(token_types::MALFORMED),
        RegionKind::RedefinedKey => Paint::Modifier(token_modifiers::REDEFINED),
        RegionKind::InvalidPath => Paint::Modifier(token_modifiers::INVALID_PATH),
    }
}

/// Paint one line and collect its runs as raw tokens in document coordinates.
fn line_tokens(doc: &PropertyDocument, line: usize) -> Vec<RawToken> {
    let Some(analysis) = doc.line_analysis(line) else {
        return Vec::new();
    };
    let len = doc.line_index().line_text(line).len();
    let mut cells: Vec<Option<(u32, u32)>> = vec![None; len];

    for region in analysis.regions() {
        let end = region.end().min(len);
        let start = region.start.min(end);
        for cell in &mut cells[start..end] {
            *cell = match (paint_for(region.kind), *cell) {
                (Paint::Type(token_type), _) => Some((token_type, 0)),
                (Paint::Modifier(bit), Some((token_type, mods))) => Some((token_type, mods | bit)),
                (Paint::Modifier(_), None) => None,
            };
        }
    }

    let line_start = doc.line_index().line_start(line);
    let mut tokens: Vec<RawToken> = Vec::new();
    for (i, cell) in cells.into_iter().enumerate() {
        let Some((token_type, token_modifiers)) = cell else {
            continue;
        };
        match tokens.last_mut() {
            Some(last)
                if last.end == line_start + i
                    && last.token_type == token_type
                    && last.token_modifiers == token_modifiers =>
            {
                last.end += 1;
            }
            _ => tokens.push(RawToken {
                start: line_start + i,
                end: line_start + i + 1,
                token_type,
                token_modifiers,
            }),
        }
    }
    tokens
}

/// Generate semantic tokens for a whole document.
pub fn tokens_for_document(doc: &PropertyDocument) -> Vec<SemanticToken> {
    let tokens: Vec<RawToken> = (0..doc.line_count())
        .flat_map(|line| line_tokens(doc, line))
        .collect();
    encode_tokens(&tokens, doc.line_index())
}

/// Convert raw tokens to delta-encoded semantic tokens.
fn encode_tokens(tokens: &[RawToken], line_index: &LineIndex) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;

    for token in tokens {
        let pos = line_index.offset_to_position(token.start);
        let end = line_index.offset_to_position(token.end);
        let delta_line = pos.line - prev_line;
        let delta_start = if delta_line == 0 {
            pos.character - prev_start
        } else {
            pos.character
        };

        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: end.character - pos.character,
            token_type: token.token_type,
            token_modifiers_bitset: token.token_modifiers,
        });

        prev_line = pos.line;
        prev_start = pos.character;
    }

    result
}

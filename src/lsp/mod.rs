//! LSP protocol feature implementations.
//!
//! This module provides implementations for LSP features:
//! - Diagnostics conversion from line findings
//! - Hover information for keys and values
//! - Semantic tokens for syntax highlighting

mod diagnostics;
mod hover;
mod semantic_tokens;

pub use diagnostics::to_diagnostics;
pub use hover::hover_at_position;
pub use semantic_tokens::{legend, token_modifiers, token_types, tokens_for_document};

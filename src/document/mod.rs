//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` for line lookup and byte offset <-> LSP position conversion
//! - `Region`, `Finding` and `LineAnalysis` for per-line highlighting results
//! - `PropertyDocument` and `DocumentStore` for incremental document analysis

mod region;
mod state;
mod text;

pub use region::{Finding, LineAnalysis, Region, RegionKind};
pub use state::{DocumentStore, PropertyDocument};
pub use text::LineIndex;

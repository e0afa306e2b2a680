//! What a layout reads from the tokens after a biomarker name.

use super::confidence::candidate_confidence;
use super::lines::LineToken;
use super::numeric::{DecimalStyle, ValueToken};
use crate::catalog::Catalog;
use crate::models::{SourcePosition, ValueCandidate};

/// Shared state for reading rows of one document.
#[derive(Clone, Copy)]
pub struct RowContext<'c> {
    pub catalog: &'c Catalog,
    pub style: DecimalStyle,
}

/// A token in a biomarker's search window.
#[derive(Debug, Clone, Copy)]
pub struct WindowToken<'a> {
    pub token: LineToken<'a>,
    pub position: SourcePosition,
}

impl WindowToken<'_> {
    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn confidence(&self) -> f32 {
        self.token.token.confidence
    }
}

/// Value, unit and printed range read for one biomarker.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReading {
    pub value: ValueCandidate,
    pub unit: Option<String>,
    pub range_text: Option<String>,
    /// Every value candidate, best first; `value` is the head.
    pub candidates: Vec<ValueCandidate>,
    /// Lowest OCR confidence among the tokens the reading used.
    pub min_token_confidence: f32,
}

impl RowReading {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }
}

pub(crate) fn candidate(token: &WindowToken<'_>, parsed: &ValueToken, rank: usize) -> ValueCandidate {
    ValueCandidate {
        raw_text: parsed.number_text.clone(),
        value: parsed.number.value,
        confidence: candidate_confidence(parsed.number.confidence, rank),
        position: token.position,
    }
}

/// Lowest OCR confidence over a slice of window tokens.
pub(crate) fn min_confidence(tokens: &[WindowToken<'_>]) -> f32 {
    tokens.iter().map(WindowToken::confidence).fold(1.0, f32::min)
}

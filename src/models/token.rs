use serde::{Deserialize, Serialize};

/// Bounding box of a token on its page, in extractor units (pixels or points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// A single unit of extracted text with its location.
///
/// Extractors must hand these out in reading order: pages ascending, then
/// top-to-bottom and left-to-right within a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    pub text: String,
    pub page: usize,
    pub bbox: BoundingBox,
    /// Recognition confidence reported by the extractor, in [0, 1].
    pub confidence: f32,
}

impl PositionedToken {
    pub fn new(text: impl Into<String>, page: usize, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            page,
            bbox,
            confidence,
        }
    }

    pub fn has_letters(&self) -> bool {
        self.text.chars().any(char::is_alphabetic)
    }
}

/// Where a measurement was found in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub page: usize,
    /// Reconstructed line number within the document (0-based, document-wide).
    pub line: usize,
    /// Index of the anchoring token in the extracted token stream.
    pub token_index: usize,
    pub bbox: BoundingBox,
}

impl SourcePosition {
    /// Document order key: page first, then reading-order token index.
    pub fn order_key(&self) -> (usize, usize) {
        (self.page, self.token_index)
    }
}

pub mod sanitize;
pub mod text;

pub use sanitize::*;
pub use text::*;

use thiserror::Error;

use crate::models::PositionedToken;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Text encoding error: {0}")]
    Encoding(String),

    #[error("Tokens out of reading order: page {page} after page {previous}")]
    ReadingOrder { previous: usize, page: usize },

    #[error("Document could not be read: {0}")]
    Unreadable(String),
}

/// Turns raw document bytes into positioned tokens.
///
/// Implementations wrap an OCR engine, a PDF text layer or plain text. The
/// returned stream must be in reading order: pages ascending, tokens within
/// a page top-to-bottom then left-to-right.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<PositionedToken>, ExtractionError>;
}

/// Reject a token stream whose page index ever decreases.
pub fn check_reading_order(tokens: &[PositionedToken]) -> Result<(), ExtractionError> {
    for pair in tokens.windows(2) {
        if pair[1].page < pair[0].page {
            return Err(ExtractionError::ReadingOrder {
                previous: pair[0].page,
                page: pair[1].page,
            });
        }
    }
    Ok(())
}

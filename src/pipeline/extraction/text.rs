//! Plain-text extraction.
//!
//! UTF-8 text with one line per printed row. Pages are separated by form
//! feeds. Tokens get synthetic grid coordinates: one line is
//! [`LINE_HEIGHT`] high and each character [`CHAR_WIDTH`] wide, so column
//! gaps survive as horizontal distance.

use super::sanitize::sanitize_extracted_text;
use super::{DocumentExtractor, ExtractionError};
use crate::models::{BoundingBox, PositionedToken};

pub const LINE_HEIGHT: f32 = 12.0;
pub const CHAR_WIDTH: f32 = 6.0;

/// Confidence of tokens read from a text layer.
pub const PLAIN_TEXT_CONFIDENCE: f32 = 0.99;

const PAGE_BREAK: char = '\u{000C}';

pub struct PlainTextExtractor;

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Vec<PositionedToken>, ExtractionError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ExtractionError::Encoding(e.to_string()))?;

        let mut tokens = Vec::new();
        for (page, raw_page) in text.split(PAGE_BREAK).enumerate() {
            let clean = sanitize_extracted_text(raw_page);
            for (line_idx, line) in clean.lines().enumerate() {
                tokenize_line(line, page, line_idx, &mut tokens);
            }
        }

        tracing::debug!(
            bytes = bytes.len(),
            tokens = tokens.len(),
            "PlainTextExtractor: extraction complete"
        );
        Ok(tokens)
    }
}

fn tokenize_line(line: &str, page: usize, line_idx: usize, out: &mut Vec<PositionedToken>) {
    let y = line_idx as f32 * LINE_HEIGHT;
    let mut column = 0usize;
    let mut start: Option<(usize, String)> = None;

    for ch in line.chars() {
        if ch.is_whitespace() {
            if let Some((col, word)) = start.take() {
                out.push(make_token(word, page, col, y));
            }
        } else {
            match start.as_mut() {
                Some((_, word)) => word.push(ch),
                None => start = Some((column, ch.to_string())),
            }
        }
        column += 1;
    }
    if let Some((col, word)) = start {
        out.push(make_token(word, page, col, y));
    }
}

fn make_token(text: String, page: usize, column: usize, y: f32) -> PositionedToken {
    let width = text.chars().count() as f32 * CHAR_WIDTH;
    PositionedToken::new(
        text,
        page,
        BoundingBox::new(column as f32 * CHAR_WIDTH, y, width, LINE_HEIGHT * 0.8),
        PLAIN_TEXT_CONFIDENCE,
    )
}

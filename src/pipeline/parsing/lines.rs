//! Line reconstruction from positioned tokens.
//!
//! Tokens arrive in reading order. Consecutive tokens on the same page whose
//! vertical centres lie within half a line height of the running line
//! centre belong to one printed row.

use crate::models::{PositionedToken, SourcePosition};

/// Floor for the vertical tolerance, for extractors that report no height.
const MIN_TOLERANCE: f32 = 1.0;

/// A token together with its index in the extracted stream.
#[derive(Debug, Clone, Copy)]
pub struct LineToken<'a> {
    pub index: usize,
    pub token: &'a PositionedToken,
}

impl LineToken<'_> {
    pub fn text(&self) -> &str {
        &self.token.text
    }
}

/// One reconstructed printed row, tokens left to right.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    pub page: usize,
    /// Document-wide line number.
    pub number: usize,
    pub tokens: Vec<LineToken<'a>>,
    center_y: f32,
    height: f32,
}

impl<'a> Line<'a> {
    fn start(number: usize, index: usize, token: &'a PositionedToken) -> Self {
        Self {
            page: token.page,
            number,
            tokens: vec![LineToken { index, token }],
            center_y: token.bbox.center_y(),
            height: token.bbox.height,
        }
    }

    fn accepts(&self, token: &PositionedToken) -> bool {
        let tolerance = (self.height.max(token.bbox.height) / 2.0).max(MIN_TOLERANCE);
        token.page == self.page && (token.bbox.center_y() - self.center_y).abs() <= tolerance
    }

    fn push(&mut self, index: usize, token: &'a PositionedToken) {
        let n = self.tokens.len() as f32;
        self.center_y = (self.center_y * n + token.bbox.center_y()) / (n + 1.0);
        self.height = self.height.max(token.bbox.height);
        self.tokens.push(LineToken { index, token });
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(LineToken::text).collect::<Vec<_>>().join(" ")
    }

    /// Source position of the token at `slot` within this line.
    pub fn position(&self, slot: usize) -> Option<SourcePosition> {
        self.tokens.get(slot).map(|t| SourcePosition {
            page: self.page,
            line: self.number,
            token_index: t.index,
            bbox: t.token.bbox,
        })
    }
}

/// Group a reading-order token stream into lines.
pub fn group_lines(tokens: &[PositionedToken]) -> Vec<Line<'_>> {
    let mut lines: Vec<Line<'_>> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.text.trim().is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(line) if line.accepts(token) => line.push(index, token),
            _ => {
                let number = lines.len();
                lines.push(Line::start(number, index, token));
            }
        }
    }

    for line in &mut lines {
        line.tokens
            .sort_by(|a, b| a.token.bbox.x.total_cmp(&b.token.bbox.x));
    }
    lines
}

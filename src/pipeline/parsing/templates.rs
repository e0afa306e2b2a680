//! Lab layout templates.
//!
//! A template recognises a lab's report by words in its header and knows the
//! order in which that lab prints the columns after a biomarker name. Rows a
//! template cannot read are left to the proximity reader.

use super::numeric::{is_flag_token, match_range, split_value_and_unit};
use super::row::{candidate, min_confidence, RowContext, RowReading, WindowToken};

/// One layout a lab prints its results in.
pub trait LayoutStrategy: Send + Sync {
    /// Stable identifier, also used as the lab id for range rules.
    fn id(&self) -> &str;

    /// Does the lowercased header text belong to this layout?
    fn matches_header(&self, header: &str) -> bool;

    /// Read the tokens following a name on the same line.
    fn read_row(&self, window: &[WindowToken<'_>], ctx: &RowContext<'_>) -> Option<RowReading>;
}

/// Column kinds, in print order after the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Value,
    Unit,
    Range,
}

/// A layout defined by header signatures and a fixed column order.
#[derive(Debug, Clone)]
pub struct ColumnTemplate {
    id: String,
    signatures: Vec<String>,
    columns: Vec<Column>,
}

impl ColumnTemplate {
    pub fn new(id: &str, signatures: &[&str], columns: &[Column]) -> Self {
        Self {
            id: id.to_string(),
            signatures: signatures.iter().map(|s| s.to_lowercase()).collect(),
            columns: columns.to_vec(),
        }
    }
}

impl LayoutStrategy for ColumnTemplate {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches_header(&self, header: &str) -> bool {
        self.signatures.iter().any(|sig| header.contains(sig.as_str()))
    }

    fn read_row(&self, window: &[WindowToken<'_>], ctx: &RowContext<'_>) -> Option<RowReading> {
        let mut cursor = 0;
        let mut value = None;
        let mut unit: Option<String> = None;
        let mut range_text = None;
        let mut used: Vec<WindowToken<'_>> = Vec::new();

        for column in &self.columns {
            while window.get(cursor).is_some_and(|t| is_flag_token(t.text())) {
                cursor += 1;
            }
            let Some(token) = window.get(cursor) else {
                break;
            };

            match column {
                Column::Value => {
                    let parsed = split_value_and_unit(token.text(), ctx.style)?;
                    if parsed.unit.is_some() {
                        unit = parsed.unit.clone();
                    }
                    value = Some(candidate(token, &parsed, 0));
                    used.push(*token);
                    cursor += 1;
                }
                Column::Unit => {
                    if unit.is_none() && ctx.catalog.is_unit_like(token.text()) {
                        unit = Some(token.text().to_string());
                        used.push(*token);
                        cursor += 1;
                    }
                }
                Column::Range => {
                    let texts = window[cursor..].iter().map(WindowToken::text);
                    if let Some((span, text)) = match_range(texts, ctx.style) {
                        range_text = Some(text);
                        used.extend_from_slice(&window[cursor..cursor + span]);
                        cursor += span;
                    }
                }
            }
        }

        let value = value?;
        Some(RowReading {
            candidates: vec![value.clone()],
            value,
            unit,
            range_text,
            min_token_confidence: min_confidence(&used),
        })
    }
}

/// Ordered set of layouts. Read-only once built; shared between pipelines.
pub struct TemplateRegistry {
    templates: Vec<Box<dyn LayoutStrategy>>,
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self { templates: Vec::new() }
    }

    /// Layouts of the large Russian commercial labs.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ColumnTemplate::new(
            "invitro",
            &["invitro", "инвитро"],
            &[Column::Value, Column::Unit, Column::Range],
        )));
        registry.register(Box::new(ColumnTemplate::new(
            "helix",
            &["helix", "хеликс"],
            &[Column::Value, Column::Range, Column::Unit],
        )));
        registry.register(Box::new(ColumnTemplate::new(
            "gemotest",
            &["gemotest", "гемотест"],
            &[Column::Value, Column::Unit, Column::Range],
        )));
        registry
    }

    pub fn register(&mut self, template: Box<dyn LayoutStrategy>) {
        self.templates.push(template);
    }

    /// First layout whose signature appears in the header.
    pub fn select(&self, header: &str) -> Option<&dyn LayoutStrategy> {
        let header = header.to_lowercase();
        self.templates
            .iter()
            .find(|t| t.matches_header(&header))
            .map(|t| t.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.id())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

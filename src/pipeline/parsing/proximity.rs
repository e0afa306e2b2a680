//! Proximity reading: the fallback when no template reads a row.
//!
//! The first value-like token after the name is the value, the first
//! unit-like token after it the unit and the first range-shaped span the
//! printed range. Further numbers are kept as lower-ranked candidates.

use super::numeric::{is_flag_token, match_range, split_value_and_unit};
use super::row::{candidate, min_confidence, RowContext, RowReading, WindowToken};

pub fn read_window(window: &[WindowToken<'_>], ctx: &RowContext<'_>) -> Option<RowReading> {
    let mut candidates = Vec::new();
    let mut unit: Option<String> = None;
    let mut range_text = None;
    let mut used: Vec<WindowToken<'_>> = Vec::new();

    let mut i = 0;
    while i < window.len() {
        let token = &window[i];
        let text = token.text();
        if is_flag_token(text) {
            i += 1;
            continue;
        }

        if candidates.is_empty() {
            if let Some(parsed) = split_value_and_unit(text, ctx.style) {
                unit = parsed.unit.clone();
                candidates.push(candidate(token, &parsed, 0));
                used.push(*token);
                i += 1;
                continue;
            }
        } else if unit.is_none() && ctx.catalog.is_unit_like(text) {
            unit = Some(text.to_string());
            used.push(*token);
            i += 1;
            continue;
        }

        if range_text.is_none() {
            let texts = window[i..].iter().map(WindowToken::text);
            if let Some((span, joined)) = match_range(texts, ctx.style) {
                range_text = Some(joined);
                used.extend_from_slice(&window[i..i + span]);
                i += span;
                continue;
            }
        }

        if !candidates.is_empty() {
            if let Some(parsed) = split_value_and_unit(text, ctx.style) {
                let rank = candidates.len();
                candidates.push(candidate(token, &parsed, rank));
            }
        }
        i += 1;
    }

    let value = candidates.first()?.clone();
    Some(RowReading {
        value,
        unit,
        range_text,
        candidates,
        min_token_confidence: min_confidence(&used),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{BoundingBox, PositionedToken, SourcePosition};
    use crate::pipeline::parsing::lines::LineToken;
    use crate::pipeline::parsing::numeric::DecimalStyle;

    fn tokens(texts: &[&str]) -> Vec<PositionedToken> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| PositionedToken::new(*t, 0, BoundingBox::new(i as f32 * 40.0, 0.0, 30.0, 10.0), 0.9))
            .collect()
    }

    fn window(tokens: &[PositionedToken]) -> Vec<WindowToken<'_>> {
        tokens
            .iter()
            .enumerate()
            .map(|(index, token)| WindowToken {
                token: LineToken { index, token },
                position: SourcePosition {
                    page: 0,
                    line: 0,
                    token_index: index,
                    bbox: token.bbox,
                },
            })
            .collect()
    }

    fn read(texts: &[&str], style: DecimalStyle) -> Option<RowReading> {
        let catalog = Catalog::builtin().unwrap();
        let ctx = RowContext { catalog: &catalog, style };
        let toks = tokens(texts);
        read_window(&window(&toks), &ctx)
    }

    #[test]
    fn reads_value_unit_and_range() {
        let reading = read(&["6.8", "ммоль/л", "3.3-5.5"], DecimalStyle::Comma).unwrap();
        assert_eq!(reading.value.value, 6.8);
        assert_eq!(reading.unit.as_deref(), Some("ммоль/л"));
        assert_eq!(reading.range_text.as_deref(), Some("3.3-5.5"));
        assert!(!reading.is_ambiguous());
    }

    #[test]
    fn range_before_unit_still_read() {
        let reading = read(&["28", "0", "-", "40", "Ед/л"], DecimalStyle::Comma).unwrap();
        assert_eq!(reading.value.value, 28.0);
        assert_eq!(reading.range_text.as_deref(), Some("0 - 40"));
        assert_eq!(reading.unit.as_deref(), Some("Ед/л"));
        assert!(!reading.is_ambiguous());
    }

    #[test]
    fn extra_numbers_become_ranked_alternatives() {
        let reading = read(&["5.2", "ммоль/л", "6.1", "3.3-5.5"], DecimalStyle::Point).unwrap();
        assert_eq!(reading.value.value, 5.2);
        assert!(reading.is_ambiguous());
        assert_eq!(reading.candidates.len(), 2);
        assert_eq!(reading.candidates[1].value, 6.1);
        assert!(reading.candidates[1].confidence < reading.candidates[0].confidence);
    }

    #[test]
    fn flags_are_skipped() {
        let reading = read(&["6.2", "*", "ммоль/л"], DecimalStyle::Point).unwrap();
        assert_eq!(reading.value.value, 6.2);
        assert_eq!(reading.unit.as_deref(), Some("ммоль/л"));
    }

    #[test]
    fn no_value_no_reading() {
        assert!(read(&["ммоль/л", "норма"], DecimalStyle::Point).is_none());
        assert!(read(&[], DecimalStyle::Point).is_none());
    }

    #[test]
    fn open_range_read_from_two_tokens() {
        let reading = read(&["3", "мг/л", "до", "5"], DecimalStyle::Comma).unwrap();
        assert_eq!(reading.range_text.as_deref(), Some("до 5"));
        assert!(!reading.is_ambiguous());
    }
}

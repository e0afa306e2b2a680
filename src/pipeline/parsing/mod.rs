//! Measurement parser.
//!
//! Turns a reading-order token stream into `RawMeasurement`s: lines are
//! rebuilt from token geometry, biomarker names are spotted through the
//! catalog's alias index, and the tokens after each name are read either by
//! the lab's layout template or, failing that, by proximity.

pub mod confidence;
pub mod language_detect;
pub mod lines;
pub mod numeric;
pub mod proximity;
pub mod row;
pub mod templates;

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::models::{Locale, PositionedToken, Provenance, RawMeasurement};
use confidence::{
    ConfidenceFactors, AMBIGUITY_PENALTY, FALLBACK_PROVENANCE, TEMPLATE_PROVENANCE, UNIT_GENERIC,
    UNIT_KNOWN, UNIT_MISSING, UNKNOWN_NAME,
};
use language_detect::detect_locale;
use lines::{group_lines, Line};
use numeric::{is_flag_token, match_range, split_value_and_unit, DecimalStyle};
use row::{RowContext, RowReading, WindowToken};
use templates::{LayoutStrategy, TemplateRegistry};

/// Parser tunables, taken from [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserSettings {
    pub name_match_threshold: f32,
    pub max_name_tokens: usize,
    pub follow_tokens: usize,
    pub header_lines: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for ParserSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            name_match_threshold: config.name_match_threshold,
            max_name_tokens: config.max_name_tokens,
            follow_tokens: config.follow_tokens,
            header_lines: config.header_lines,
        }
    }
}

/// Everything the parser learned about one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub locale: Locale,
    pub template_id: Option<String>,
    /// In document order.
    pub measurements: Vec<RawMeasurement>,
}

/// A span of tokens on one line that names a biomarker.
#[derive(Debug, Clone)]
struct NameHit {
    start: usize,
    end: usize,
    confidence: f32,
}

pub struct MeasurementParser {
    catalog: Arc<Catalog>,
    templates: Arc<TemplateRegistry>,
    settings: ParserSettings,
}

impl MeasurementParser {
    pub fn new(catalog: Arc<Catalog>, templates: Arc<TemplateRegistry>, settings: ParserSettings) -> Self {
        Self {
            catalog,
            templates,
            settings,
        }
    }

    pub fn parse(&self, tokens: &[PositionedToken]) -> ParseOutcome {
        let lines = group_lines(tokens);
        let all_text = lines.iter().map(Line::text).collect::<Vec<_>>().join("\n");
        let locale = detect_locale(&all_text);

        let header = lines
            .iter()
            .take(self.settings.header_lines)
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n");
        let template = self.templates.select(&header);

        let ctx = RowContext {
            catalog: &self.catalog,
            style: DecimalStyle::from(locale),
        };

        tracing::debug!(
            lines = lines.len(),
            locale = locale.as_str(),
            template = template.map(|t| t.id()),
            "Parsing token stream"
        );

        let hits: Vec<Vec<NameHit>> = lines.iter().map(|l| self.find_names(l, locale)).collect();
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut measurements = Vec::new();

        for (line_idx, line) in lines.iter().enumerate() {
            let line_hits = &hits[line_idx];

            if line_hits.is_empty() {
                if let Some(m) = self.read_unknown_label(line, &ctx, template, &consumed) {
                    consumed.extend(m.alternatives.iter().map(|c| c.position.token_index));
                    measurements.push(m);
                }
                continue;
            }

            for (k, hit) in line_hits.iter().enumerate() {
                let row_end = line_hits.get(k + 1).map_or(line.tokens.len(), |next| next.start);
                let same_line = window_of(line, hit.end..row_end, &consumed);

                let templated = template.and_then(|t| t.read_row(&same_line, &ctx));
                let (reading, provenance) = match templated {
                    Some(reading) => (reading, Provenance::Template),
                    None => {
                        let mut window = same_line.clone();
                        if !has_value(&same_line, ctx.style) {
                            window.extend(self.following_tokens(&lines, &hits, line_idx, &consumed));
                        }
                        match proximity::read_window(&window, &ctx) {
                            Some(reading) => (reading, Provenance::Fallback),
                            None => {
                                tracing::debug!(
                                    line = line.number,
                                    name = %name_text(line, hit),
                                    "Name without value, skipped"
                                );
                                continue;
                            }
                        }
                    }
                };

                for candidate in &reading.candidates {
                    consumed.insert(candidate.position.token_index);
                }
                let m = self.build(line, hit, reading, provenance, template);
                tracing::debug!(
                    line = line.number,
                    name = %m.raw_name,
                    value = m.value,
                    confidence = m.extraction_confidence,
                    provenance = m.provenance.as_str(),
                    "Measurement read"
                );
                measurements.push(m);
            }
        }

        measurements.sort_by_key(|m| m.source_position.order_key());

        ParseOutcome {
            locale,
            template_id: template.map(|t| t.id().to_string()),
            measurements,
        }
    }

    /// Longest-first n-gram scan of letter-bearing tokens.
    fn find_names(&self, line: &Line<'_>, locale: Locale) -> Vec<NameHit> {
        let mut hits = Vec::new();
        let mut i = 0;
        while i < line.tokens.len() {
            if !self.is_name_token(line.tokens[i].text()) {
                i += 1;
                continue;
            }
            let longest = (line.tokens.len() - i).min(self.settings.max_name_tokens);
            let found = (1..=longest).rev().find_map(|n| {
                let span = &line.tokens[i..i + n];
                if !span.iter().all(|t| self.is_name_token(t.text())) {
                    return None;
                }
                let text = span.iter().map(|t| t.text()).collect::<Vec<_>>().join(" ");
                let confidence = self.catalog.lookup_by_alias(&text, Some(locale)).confidence();
                (confidence >= self.settings.name_match_threshold).then_some(NameHit {
                    start: i,
                    end: i + n,
                    confidence,
                })
            });
            match found {
                Some(hit) => {
                    i = hit.end;
                    hits.push(hit);
                }
                None => i += 1,
            }
        }
        hits
    }

    fn is_name_token(&self, text: &str) -> bool {
        text.chars().any(char::is_alphabetic)
            && !self.catalog.is_unit_like(text)
            && split_value_and_unit(text, DecimalStyle::Point).is_none()
    }

    /// The first `follow_tokens` tokens after `line_idx` that are not part
    /// of a name and were not read already.
    fn following_tokens<'a>(
        &self,
        lines: &[Line<'a>],
        hits: &[Vec<NameHit>],
        line_idx: usize,
        consumed: &HashSet<usize>,
    ) -> Vec<WindowToken<'a>> {
        let mut out = Vec::new();
        'lines: for (offset, line) in lines[line_idx + 1..].iter().enumerate() {
            let line_hits = &hits[line_idx + 1 + offset];
            for slot in 0..line.tokens.len() {
                if out.len() >= self.settings.follow_tokens {
                    break 'lines;
                }
                if line_hits.iter().any(|h| (h.start..h.end).contains(&slot)) {
                    break 'lines;
                }
                if consumed.contains(&line.tokens[slot].index) {
                    continue;
                }
                if let Some(position) = line.position(slot) {
                    out.push(WindowToken {
                        token: line.tokens[slot],
                        position,
                    });
                }
            }
        }
        out
    }

    /// A `label value unit` row whose label is not in the catalog.
    fn read_unknown_label(
        &self,
        line: &Line<'_>,
        ctx: &RowContext<'_>,
        template: Option<&dyn LayoutStrategy>,
        consumed: &HashSet<usize>,
    ) -> Option<RawMeasurement> {
        let value_slot = line
            .tokens
            .iter()
            .position(|t| split_value_and_unit(t.text(), ctx.style).is_some())?;
        if value_slot == 0 || value_slot > self.settings.max_name_tokens {
            return None;
        }
        if !line.tokens[..value_slot].iter().all(|t| self.is_name_token(t.text())) {
            return None;
        }
        if consumed.contains(&line.tokens[value_slot].index) {
            return None;
        }

        let window = window_of(line, value_slot..line.tokens.len(), consumed);
        let reading = proximity::read_window(&window, ctx)?;
        reading.unit.as_ref()?;

        let hit = NameHit {
            start: 0,
            end: value_slot,
            confidence: UNKNOWN_NAME,
        };
        tracing::debug!(line = line.number, name = %name_text(line, &hit), "Unknown label row");
        Some(self.build(line, &hit, reading, Provenance::Fallback, template))
    }

    fn build(
        &self,
        line: &Line<'_>,
        hit: &NameHit,
        reading: RowReading,
        provenance: Provenance,
        template: Option<&dyn LayoutStrategy>,
    ) -> RawMeasurement {
        let name_tokens = &line.tokens[hit.start..hit.end];
        let name_min = name_tokens.iter().map(|t| t.token.confidence).fold(1.0, f32::min);

        let unit_factor = match reading.unit.as_deref() {
            None => UNIT_MISSING,
            Some(unit) if self.catalog.is_known_unit(unit) => UNIT_KNOWN,
            Some(_) => UNIT_GENERIC,
        };
        let factors = ConfidenceFactors {
            name: hit.confidence,
            numeric: reading.value.confidence,
            provenance: match provenance {
                Provenance::Template => TEMPLATE_PROVENANCE,
                Provenance::Fallback => FALLBACK_PROVENANCE,
            },
            unit: unit_factor,
            ambiguity: if reading.is_ambiguous() { AMBIGUITY_PENALTY } else { 1.0 },
            min_token: name_min.min(reading.min_token_confidence),
        };

        let source_position = line
            .position(hit.start)
            .unwrap_or(reading.value.position);

        RawMeasurement {
            raw_name: name_text(line, hit),
            raw_value: reading.value.raw_text.clone(),
            value: reading.value.value,
            raw_unit: reading.unit,
            raw_range_text: reading.range_text,
            source_position,
            extraction_confidence: factors.combine(),
            provenance,
            template_id: template.map(|t| t.id().to_string()),
            alternatives: reading.candidates,
        }
    }
}

fn name_text(line: &Line<'_>, hit: &NameHit) -> String {
    line.tokens[hit.start..hit.end]
        .iter()
        .map(|t| t.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn window_of<'a>(
    line: &Line<'a>,
    slots: std::ops::Range<usize>,
    consumed: &HashSet<usize>,
) -> Vec<WindowToken<'a>> {
    slots
        .filter(|slot| !consumed.contains(&line.tokens[*slot].index))
        .filter_map(|slot| {
            line.position(slot).map(|position| WindowToken {
                token: line.tokens[slot],
                position,
            })
        })
        .collect()
}

fn has_value(window: &[WindowToken<'_>], style: DecimalStyle) -> bool {
    window.iter().enumerate().any(|(i, t)| {
        !is_flag_token(t.text())
            && split_value_and_unit(t.text(), style).is_some()
            && match_range(window[i..].iter().map(WindowToken::text), style).is_none()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn parser() -> MeasurementParser {
        MeasurementParser::new(
            Arc::new(Catalog::builtin().unwrap()),
            Arc::new(TemplateRegistry::builtin()),
            ParserSettings::default(),
        )
    }

    /// One token per word, one row per line, on a 12pt grid.
    fn layout(rows: &[&str]) -> Vec<PositionedToken> {
        let mut tokens = Vec::new();
        for (line, row) in rows.iter().enumerate() {
            for (col, word) in row.split_whitespace().enumerate() {
                tokens.push(PositionedToken::new(
                    word,
                    0,
                    BoundingBox::new(col as f32 * 60.0, line as f32 * 12.0, 50.0, 10.0),
                    0.98,
                ));
            }
        }
        tokens
    }

    #[test]
    fn reads_single_row() {
        let outcome = parser().parse(&layout(&["Глюкоза 6.8 ммоль/л 3.3-5.5"]));
        assert_eq!(outcome.locale, Locale::Ru);
        assert_eq!(outcome.measurements.len(), 1);
        let m = &outcome.measurements[0];
        assert_eq!(m.raw_name, "Глюкоза");
        assert_eq!(m.value, 6.8);
        assert_eq!(m.raw_unit.as_deref(), Some("ммоль/л"));
        assert_eq!(m.raw_range_text.as_deref(), Some("3.3-5.5"));
        assert_eq!(m.provenance, Provenance::Fallback);
        assert!(m.extraction_confidence > 0.7, "confidence {}", m.extraction_confidence);
    }

    #[test]
    fn multi_token_names_preferred() {
        let outcome = parser().parse(&layout(&["Холестерин ЛПВП 1.4 ммоль/л", "Холестерин 6.2 ммоль/л"]));
        let names: Vec<&str> = outcome.measurements.iter().map(|m| m.raw_name.as_str()).collect();
        assert_eq!(names, vec!["Холестерин ЛПВП", "Холестерин"]);
    }

    #[test]
    fn template_selected_from_header() {
        let outcome = parser().parse(&layout(&[
            "ИНВИТРО Результаты исследований",
            "Гемоглобин 145 г/л 130-160",
            "Эритроциты 4,8 ×10¹²/л 4,0-5,5",
        ]));
        assert_eq!(outcome.template_id.as_deref(), Some("invitro"));
        assert_eq!(outcome.measurements.len(), 2);
        for m in &outcome.measurements {
            assert_eq!(m.provenance, Provenance::Template);
            assert_eq!(m.template_id.as_deref(), Some("invitro"));
        }
        assert_eq!(outcome.measurements[1].value, 4.8);
        assert_eq!(outcome.measurements[1].raw_unit.as_deref(), Some("×10¹²/л"));
    }

    #[test]
    fn value_on_next_line_is_followed() {
        let outcome = parser().parse(&layout(&["Ферритин", "85 мкг/л", "АЛТ 28 Ед/л"]));
        assert_eq!(outcome.measurements.len(), 2);
        assert_eq!(outcome.measurements[0].raw_name, "Ферритин");
        assert_eq!(outcome.measurements[0].value, 85.0);
        assert_eq!(outcome.measurements[0].raw_unit.as_deref(), Some("мкг/л"));
        assert_eq!(outcome.measurements[1].value, 28.0);
    }

    #[test]
    fn follow_window_stops_at_next_name() {
        let outcome = parser().parse(&layout(&["Ферритин", "АЛТ 28 Ед/л"]));
        assert_eq!(outcome.measurements.len(), 1);
        assert_eq!(outcome.measurements[0].raw_name, "АЛТ");
    }

    #[test]
    fn unknown_label_row_emitted_with_low_confidence() {
        let outcome = parser().parse(&layout(&["Тест-Х 5 ед"]));
        assert_eq!(outcome.measurements.len(), 1);
        let m = &outcome.measurements[0];
        assert_eq!(m.raw_name, "Тест-Х");
        assert!(m.extraction_confidence <= UNKNOWN_NAME);
    }

    #[test]
    fn header_noise_is_not_a_measurement() {
        let outcome = parser().parse(&layout(&[
            "Пациент Иванов Возраст 45 лет",
            "Дата 12.03.2024",
            "Стр 1 из 2",
        ]));
        assert!(outcome.measurements.is_empty(), "{:?}", outcome.measurements);
    }

    #[test]
    fn english_header_noise_is_not_a_measurement() {
        let outcome = parser().parse(&layout(&[
            "Patient: John Smith",
            "Collected 12/03/2024",
            "Page 1 of 2",
            "Last visit 12/03/2024",
            "Last meal 10 h",
            "Glucose 5.2 mmol/L 3.9-5.5",
        ]));
        let names: Vec<&str> = outcome.measurements.iter().map(|m| m.raw_name.as_str()).collect();
        assert_eq!(names, vec!["Glucose"]);
        assert_eq!(outcome.measurements[0].value, 5.2);
    }

    #[test]
    fn ambiguous_row_kept_with_penalty() {
        let clean = parser().parse(&layout(&["Glucose 5.2 mmol/L"]));
        let noisy = parser().parse(&layout(&["Glucose 5.2 mmol/L 6.1"]));
        let clean = &clean.measurements[0];
        let noisy = &noisy.measurements[0];
        assert!(noisy.is_ambiguous());
        assert_eq!(noisy.value, 5.2);
        assert!(noisy.extraction_confidence < clean.extraction_confidence);
    }

    #[test]
    fn two_names_on_one_line_split_windows() {
        let outcome = parser().parse(&layout(&["АЛТ 28 Ед/л АСТ 32 Ед/л"]));
        let values: Vec<f64> = outcome.measurements.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![28.0, 32.0]);
    }

    #[test]
    fn output_is_in_document_order() {
        let outcome = parser().parse(&layout(&[
            "Гемоглобин 145 г/л",
            "Глюкоза 6.8 ммоль/л",
            "АЛТ 28 Ед/л",
        ]));
        let keys: Vec<_> = outcome
            .measurements
            .iter()
            .map(|m| m.source_position.order_key())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let outcome = parser().parse(&[]);
        assert!(outcome.measurements.is_empty());
        assert!(outcome.template_id.is_none());
    }
}

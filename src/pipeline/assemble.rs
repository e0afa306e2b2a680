//! Report assembly.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::classify::flag;
use super::normalize::{Normalized, ResolvedMeasurement};
use crate::models::{CanonicalMeasurement, Disposition, Locale, Report, UnresolvedItem};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Document produced no tokens")]
    EmptyDocument,

    #[error("No biomarker measurements found in document")]
    NoMeasurementsFound,
}

/// Everything the assembler needs for one document.
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    pub source_id: Uuid,
    pub extracted_at: DateTime<Utc>,
    pub locale: Locale,
    pub template_id: Option<String>,
    pub token_count: usize,
    pub items: Vec<Normalized>,
}

/// Classify resolved items, order everything by document position and
/// compute the overall confidence.
///
/// Measurements at or above `review_threshold` are accepted, the rest go to
/// review. Unresolved items count as zero confidence in the overall mean.
pub fn assemble(input: AssemblyInput, review_threshold: f32) -> Result<Report, AssemblyError> {
    if input.token_count == 0 {
        return Err(AssemblyError::EmptyDocument);
    }
    if input.items.is_empty() {
        return Err(AssemblyError::NoMeasurementsFound);
    }

    let mut measurements: Vec<CanonicalMeasurement> = Vec::new();
    let mut unresolved: Vec<UnresolvedItem> = Vec::new();
    for item in input.items {
        match item {
            Normalized::Resolved(resolved) => measurements.push(canonical(resolved, review_threshold)),
            Normalized::Unresolved(item) => unresolved.push(item),
        }
    }

    measurements.sort_by_key(|m| m.source_position.order_key());
    unresolved.sort_by_key(|u| u.raw.source_position.order_key());

    let total = measurements.len() + unresolved.len();
    let confidence_sum: f32 = measurements.iter().map(|m| m.confidence).sum();
    let overall_confidence = (confidence_sum / total as f32).clamp(0.0, 1.0);

    Ok(Report::new(
        input.source_id,
        input.extracted_at,
        input.locale,
        input.template_id,
        measurements,
        unresolved,
        overall_confidence,
    ))
}

fn canonical(resolved: ResolvedMeasurement, review_threshold: f32) -> CanonicalMeasurement {
    let flag = flag(resolved.value, &resolved.range);
    let confidence = resolved.raw.extraction_confidence;
    let disposition = if confidence >= review_threshold {
        Disposition::Accepted
    } else {
        Disposition::NeedsReview
    };

    CanonicalMeasurement {
        biomarker_id: resolved.biomarker_id,
        raw_name: resolved.raw.raw_name,
        value: resolved.value,
        unit: resolved.unit,
        resolved_range: resolved.range,
        printed_range: resolved.printed_range,
        flag,
        status: flag.status(),
        confidence,
        disposition,
        source_position: resolved.raw.source_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BoundingBox, Provenance, RawMeasurement, ReferenceRange, SourcePosition, Status,
        UnresolvedReason,
    };

    fn make_raw(name: &str, token_index: usize, confidence: f32) -> RawMeasurement {
        RawMeasurement {
            raw_name: name.into(),
            raw_value: "1".into(),
            value: 1.0,
            raw_unit: Some("g/L".into()),
            raw_range_text: None,
            source_position: SourcePosition {
                page: 0,
                line: token_index,
                token_index,
                bbox: BoundingBox::default(),
            },
            extraction_confidence: confidence,
            provenance: Provenance::Fallback,
            template_id: None,
            alternatives: vec![],
        }
    }

    fn make_resolved(id: &str, value: f64, token_index: usize, confidence: f32) -> Normalized {
        Normalized::Resolved(ResolvedMeasurement {
            raw: make_raw(id, token_index, confidence),
            biomarker_id: id.into(),
            value,
            unit: "mmol/L".into(),
            range: ReferenceRange::default_for(id, 3.3, 5.5).with_critical(Some(2.2), Some(25.0)),
            printed_range: None,
        })
    }

    fn make_unresolved(token_index: usize, reason: UnresolvedReason) -> Normalized {
        Normalized::Unresolved(UnresolvedItem {
            raw: make_raw("Тест-Х", token_index, 0.3),
            reason,
            candidates: vec![],
            detail: None,
        })
    }

    fn input(token_count: usize, items: Vec<Normalized>) -> AssemblyInput {
        AssemblyInput {
            source_id: Uuid::nil(),
            extracted_at: Utc::now(),
            locale: Locale::Ru,
            template_id: None,
            token_count,
            items,
        }
    }

    #[test]
    fn empty_document_rejected() {
        assert_eq!(assemble(input(0, vec![]), 0.7), Err(AssemblyError::EmptyDocument));
    }

    #[test]
    fn tokens_without_measurements_rejected() {
        assert_eq!(assemble(input(12, vec![]), 0.7), Err(AssemblyError::NoMeasurementsFound));
    }

    #[test]
    fn orders_by_document_position() {
        let report = assemble(
            input(
                10,
                vec![
                    make_resolved("B", 4.0, 7, 0.9),
                    make_unresolved(5, UnresolvedReason::NoMatch),
                    make_resolved("A", 4.0, 2, 0.9),
                    make_unresolved(1, UnresolvedReason::AmbiguousMatch),
                ],
            ),
            0.7,
        )
        .unwrap();
        let ids: Vec<&str> = report.measurements().iter().map(|m| m.biomarker_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        let positions: Vec<usize> = report
            .unresolved()
            .iter()
            .map(|u| u.raw.source_position.token_index)
            .collect();
        assert_eq!(positions, vec![1, 5]);
    }

    #[test]
    fn overall_confidence_counts_unresolved_as_zero() {
        let report = assemble(
            input(
                10,
                vec![
                    make_resolved("A", 4.0, 0, 0.9),
                    make_resolved("B", 4.0, 1, 0.7),
                    make_unresolved(2, UnresolvedReason::NoMatch),
                    make_unresolved(3, UnresolvedReason::NoMatch),
                ],
            ),
            0.7,
        )
        .unwrap();
        assert!((report.overall_confidence() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn only_unresolved_gives_zero_confidence() {
        let report = assemble(input(3, vec![make_unresolved(0, UnresolvedReason::NoMatch)]), 0.7).unwrap();
        assert!(report.measurements().is_empty());
        assert_eq!(report.overall_confidence(), 0.0);
        assert_eq!(report.rejected().count(), 1);
    }

    #[test]
    fn dispositions_follow_review_threshold() {
        let report = assemble(
            input(
                10,
                vec![make_resolved("A", 4.0, 0, 0.9), make_resolved("B", 4.0, 1, 0.5)],
            ),
            0.7,
        )
        .unwrap();
        assert_eq!(report.measurements()[0].disposition, Disposition::Accepted);
        assert_eq!(report.measurements()[1].disposition, Disposition::NeedsReview);
    }

    #[test]
    fn classifies_resolved_values() {
        let report = assemble(
            input(
                10,
                vec![
                    make_resolved("A", 4.0, 0, 0.9),
                    make_resolved("B", 6.8, 1, 0.9),
                    make_resolved("C", 30.0, 2, 0.9),
                ],
            ),
            0.7,
        )
        .unwrap();
        let statuses: Vec<Status> = report.measurements().iter().map(|m| m.status).collect();
        assert_eq!(statuses, vec![Status::Normal, Status::Warning, Status::Critical]);
        assert_eq!(report.summary().warning, 1);
    }
}

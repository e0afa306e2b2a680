use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Disposition, Locale, Status};
use super::measurement::{CanonicalMeasurement, UnresolvedItem};

/// Per-status counts across all resolved measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

impl StatusSummary {
    pub fn from_measurements(measurements: &[CanonicalMeasurement]) -> Self {
        let mut summary = Self {
            total: measurements.len(),
            ..Self::default()
        };
        for m in measurements {
            match m.status {
                Status::Normal => summary.normal += 1,
                Status::Warning => summary.warning += 1,
                Status::Critical => summary.critical += 1,
            }
        }
        summary
    }
}

/// The terminal result of processing one document.
///
/// Built once by the assembler and read-only afterwards: fields are private
/// and only exposed through accessors. Deserializing rebuilds the summary
/// from the measurements; a stored `summary` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredReport")]
pub struct Report {
    source_id: Uuid,
    extracted_at: DateTime<Utc>,
    locale: Locale,
    template_id: Option<String>,
    measurements: Vec<CanonicalMeasurement>,
    unresolved: Vec<UnresolvedItem>,
    overall_confidence: f32,
    summary: StatusSummary,
}

/// Wire form of a [`Report`] without its derived fields.
#[derive(Deserialize)]
struct StoredReport {
    source_id: Uuid,
    extracted_at: DateTime<Utc>,
    locale: Locale,
    template_id: Option<String>,
    measurements: Vec<CanonicalMeasurement>,
    unresolved: Vec<UnresolvedItem>,
    overall_confidence: f32,
}

impl From<StoredReport> for Report {
    fn from(stored: StoredReport) -> Self {
        Self::new(
            stored.source_id,
            stored.extracted_at,
            stored.locale,
            stored.template_id,
            stored.measurements,
            stored.unresolved,
            stored.overall_confidence,
        )
    }
}

impl Report {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        source_id: Uuid,
        extracted_at: DateTime<Utc>,
        locale: Locale,
        template_id: Option<String>,
        measurements: Vec<CanonicalMeasurement>,
        unresolved: Vec<UnresolvedItem>,
        overall_confidence: f32,
    ) -> Self {
        let summary = StatusSummary::from_measurements(&measurements);
        Self {
            source_id,
            extracted_at,
            locale,
            template_id,
            measurements,
            unresolved,
            overall_confidence,
            summary,
        }
    }

    pub fn source_id(&self) -> Uuid {
        self.source_id
    }

    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Lab template that drove parsing, if any header signature matched.
    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    /// Resolved measurements in document order.
    pub fn measurements(&self) -> &[CanonicalMeasurement] {
        &self.measurements
    }

    /// Unresolved items in document order.
    pub fn unresolved(&self) -> &[UnresolvedItem] {
        &self.unresolved
    }

    pub fn overall_confidence(&self) -> f32 {
        self.overall_confidence
    }

    pub fn summary(&self) -> StatusSummary {
        self.summary
    }

    pub fn accepted(&self) -> impl Iterator<Item = &CanonicalMeasurement> {
        self.measurements
            .iter()
            .filter(|m| m.disposition == Disposition::Accepted)
    }

    /// Low-confidence measurements plus ambiguous or unconvertible items.
    pub fn needs_review(&self) -> (Vec<&CanonicalMeasurement>, Vec<&UnresolvedItem>) {
        let measurements = self
            .measurements
            .iter()
            .filter(|m| m.disposition == Disposition::NeedsReview)
            .collect();
        let unresolved = self
            .unresolved
            .iter()
            .filter(|u| u.disposition() == Disposition::NeedsReview)
            .collect();
        (measurements, unresolved)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &UnresolvedItem> {
        self.unresolved
            .iter()
            .filter(|u| u.disposition() == Disposition::Rejected)
    }

    pub fn find(&self, biomarker_id: &str) -> Option<&CanonicalMeasurement> {
        self.measurements
            .iter()
            .find(|m| m.biomarker_id == biomarker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AbnormalFlag, Provenance, UnresolvedReason};
    use crate::models::measurement::RawMeasurement;
    use crate::models::range::ReferenceRange;
    use crate::models::token::{BoundingBox, SourcePosition};

    fn position(token_index: usize) -> SourcePosition {
        SourcePosition {
            page: 0,
            line: token_index,
            token_index,
            bbox: BoundingBox::default(),
        }
    }

    fn measurement(id: &str, status: Status, disposition: Disposition) -> CanonicalMeasurement {
        CanonicalMeasurement {
            biomarker_id: id.into(),
            raw_name: id.into(),
            value: 1.0,
            unit: "g/L".into(),
            resolved_range: ReferenceRange::default_for(id, 0.0, 2.0),
            printed_range: None,
            flag: AbnormalFlag::Normal,
            status,
            confidence: 0.9,
            disposition,
            source_position: position(0),
        }
    }

    fn unresolved(reason: UnresolvedReason) -> UnresolvedItem {
        UnresolvedItem {
            raw: RawMeasurement {
                raw_name: "Тест-Х".into(),
                raw_value: "5".into(),
                value: 5.0,
                raw_unit: Some("ед".into()),
                raw_range_text: None,
                source_position: position(3),
                extraction_confidence: 0.4,
                provenance: Provenance::Fallback,
                template_id: None,
                alternatives: vec![],
            },
            reason,
            candidates: vec![],
            detail: None,
        }
    }

    fn report() -> Report {
        Report::new(
            Uuid::nil(),
            Utc::now(),
            Locale::Ru,
            None,
            vec![
                measurement("HEMOGLOBIN", Status::Normal, Disposition::Accepted),
                measurement("GLUCOSE", Status::Warning, Disposition::NeedsReview),
                measurement("CHOLESTEROL_TOTAL", Status::Critical, Disposition::Accepted),
            ],
            vec![
                unresolved(UnresolvedReason::NoMatch),
                unresolved(UnresolvedReason::AmbiguousMatch),
            ],
            0.5,
        )
    }

    #[test]
    fn summary_counts_statuses() {
        let summary = report().summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.normal, 1);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.critical, 1);
    }

    #[test]
    fn partitions_by_disposition() {
        let report = report();
        assert_eq!(report.accepted().count(), 2);
        let (measurements, unresolved) = report.needs_review();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].biomarker_id, "GLUCOSE");
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].reason, UnresolvedReason::AmbiguousMatch);
        assert_eq!(report.rejected().count(), 1);
    }

    #[test]
    fn find_by_biomarker() {
        let report = report();
        assert!(report.find("GLUCOSE").is_some());
        assert!(report.find("TSH").is_none());
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["locale"], "ru");
        assert_eq!(json["measurements"].as_array().unwrap().len(), 3);
        assert_eq!(json["unresolved"][0]["reason"], "no_match");
    }

    #[test]
    fn deserializing_recomputes_summary() {
        let mut json = serde_json::to_value(report()).unwrap();
        json["summary"] = serde_json::json!({"total": 99, "normal": 99, "warning": 0, "critical": 0});
        let restored: Report = serde_json::from_value(json).unwrap();
        assert_eq!(restored.summary(), report().summary());
        assert_eq!(restored.summary().total, 3);
    }
}

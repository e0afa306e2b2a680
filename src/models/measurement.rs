use serde::{Deserialize, Serialize};

use super::enums::{AbnormalFlag, Disposition, Provenance, Status, UnresolvedReason};
use super::range::{PrintedRange, ReferenceRange};
use super::token::SourcePosition;

/// One numeric reading found near a biomarker name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCandidate {
    pub raw_text: String,
    pub value: f64,
    pub confidence: f32,
    pub position: SourcePosition,
}

/// Parser output: what the document says, before any catalog resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    pub raw_name: String,
    pub raw_value: String,
    pub value: f64,
    pub raw_unit: Option<String>,
    pub raw_range_text: Option<String>,
    pub source_position: SourcePosition,
    pub extraction_confidence: f32,
    pub provenance: Provenance,
    pub template_id: Option<String>,
    /// All value candidates seen in the search window, best first.
    /// More than one entry means the line was ambiguous.
    pub alternatives: Vec<ValueCandidate>,
}

impl RawMeasurement {
    pub fn is_ambiguous(&self) -> bool {
        self.alternatives.len() > 1
    }
}

/// A measurement resolved to the catalog and classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMeasurement {
    pub biomarker_id: String,
    pub raw_name: String,
    /// Value in the biomarker's canonical unit.
    pub value: f64,
    pub unit: String,
    pub resolved_range: ReferenceRange,
    pub printed_range: Option<PrintedRange>,
    pub flag: AbnormalFlag,
    pub status: Status,
    pub confidence: f32,
    pub disposition: Disposition,
    pub source_position: SourcePosition,
}

impl CanonicalMeasurement {
    /// Where the value sits inside its reference interval, in percent.
    /// 0 is the low bound, 100 the high bound; values outside fall beyond.
    pub fn range_position(&self) -> Option<f64> {
        let span = self.resolved_range.high - self.resolved_range.low;
        if span <= 0.0 {
            return None;
        }
        Some((self.value - self.resolved_range.low) / span * 100.0)
    }
}

/// A raw measurement the Normalizer could not resolve, kept for manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedItem {
    pub raw: RawMeasurement,
    pub reason: UnresolvedReason,
    /// Competing biomarker ids for `AmbiguousMatch`, the matched id otherwise.
    pub candidates: Vec<String>,
    pub detail: Option<String>,
}

impl UnresolvedItem {
    pub fn disposition(&self) -> Disposition {
        self.reason.disposition()
    }
}

//! Normalizer: resolves raw measurements against the catalog.
//!
//! Three steps, each of which can send a measurement to the unresolved
//! list instead of failing the document: alias lookup, unit conversion into
//! the canonical unit and reference-range resolution.

use std::sync::Arc;

use crate::catalog::{AliasMatch, Catalog, CatalogError};
use crate::models::{
    Locale, PatientContext, PrintedRange, RawMeasurement, ReferenceRange, UnresolvedItem,
    UnresolvedReason,
};
use crate::pipeline::parsing::numeric::{parse_range, DecimalStyle};

/// A measurement whose biomarker, canonical value and range are known.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeasurement {
    pub raw: RawMeasurement,
    pub biomarker_id: String,
    /// Value in `unit`, the biomarker's canonical unit.
    pub value: f64,
    pub unit: String,
    pub range: ReferenceRange,
    pub printed_range: Option<PrintedRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Resolved(ResolvedMeasurement),
    Unresolved(UnresolvedItem),
}

pub struct Normalizer {
    catalog: Arc<Catalog>,
}

impl Normalizer {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve one raw measurement.
    ///
    /// Only a catalog without a default range for a known id errors; every
    /// per-measurement problem becomes `Normalized::Unresolved`.
    pub fn normalize(
        &self,
        raw: RawMeasurement,
        locale: Locale,
        patient: &PatientContext,
    ) -> Result<Normalized, CatalogError> {
        let id = match self.catalog.lookup_by_alias(&raw.raw_name, Some(locale)) {
            AliasMatch::Found { id, .. } => id,
            AliasMatch::Ambiguous(ids) => {
                return Ok(unresolved(raw, UnresolvedReason::AmbiguousMatch, ids, None));
            }
            AliasMatch::NotFound => {
                return Ok(unresolved(raw, UnresolvedReason::NoMatch, Vec::new(), None));
            }
        };

        let Some(biomarker) = self.catalog.biomarker(&id) else {
            return Err(CatalogError::UnknownBiomarker(id));
        };
        let canonical_unit = biomarker.canonical_unit.clone();

        let value = match raw.raw_unit.as_deref() {
            Some(unit) => match self.catalog.convert(&id, unit, raw.value) {
                Ok(value) => value,
                Err(e) => {
                    return Ok(unresolved(
                        raw,
                        UnresolvedReason::UnitConversionFailed,
                        vec![id],
                        Some(e.to_string()),
                    ));
                }
            },
            None if canonical_unit.is_empty() => raw.value,
            None => {
                let detail = format!("no unit printed, expected {canonical_unit}");
                return Ok(unresolved(
                    raw,
                    UnresolvedReason::UnitConversionFailed,
                    vec![id],
                    Some(detail),
                ));
            }
        };

        let range = self
            .catalog
            .resolve_range(&id, patient, raw.template_id.as_deref())?;
        let printed_range = self.printed_range(&id, &raw, locale);

        Ok(Normalized::Resolved(ResolvedMeasurement {
            biomarker_id: id,
            value,
            unit: canonical_unit,
            range,
            printed_range,
            raw,
        }))
    }

    /// The report's own range in canonical units, when it can be read and converted.
    fn printed_range(&self, id: &str, raw: &RawMeasurement, locale: Locale) -> Option<PrintedRange> {
        let printed = parse_range(raw.raw_range_text.as_deref()?, DecimalStyle::from(locale))?;
        let convert = |bound: Option<f64>| -> Result<Option<f64>, CatalogError> {
            match (bound, raw.raw_unit.as_deref()) {
                (None, _) => Ok(None),
                (Some(v), Some(unit)) => self.catalog.convert(id, unit, v).map(Some),
                (Some(v), None) => Ok(Some(v)),
            }
        };
        Some(PrintedRange {
            low: convert(printed.low).ok()?,
            high: convert(printed.high).ok()?,
        })
    }
}

fn unresolved(
    raw: RawMeasurement,
    reason: UnresolvedReason,
    candidates: Vec<String>,
    detail: Option<String>,
) -> Normalized {
    tracing::warn!(
        name = %raw.raw_name,
        reason = reason.as_str(),
        candidates = ?candidates,
        "Measurement unresolved"
    );
    Normalized::Unresolved(UnresolvedItem {
        raw,
        reason,
        candidates,
        detail,
    })
}

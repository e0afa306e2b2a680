//! Unit & reference catalog.
//!
//! Static knowledge base mapping canonical biomarker ids to their aliases,
//! unit conversion factors and reference-range rules. Built once, then only
//! read: a `Catalog` is `Send + Sync` and is shared between pipelines through
//! an `Arc` without locking.

pub mod alias;
pub mod data;
pub mod units;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Locale, PatientContext, ReferenceRange};
use alias::{is_fuzzy_match, normalize_name, MIN_FUZZY_LEN};
use units::{is_generic_unit, normalize_unit};

/// Confidence of an exact alias hit.
pub const EXACT_MATCH_CONFIDENCE: f32 = 1.0;

/// Fixed confidence penalty applied to fuzzy (edit distance 1) alias hits.
pub const FUZZY_PENALTY: f32 = 0.2;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate biomarker id: {0}")]
    DuplicateBiomarker(String),

    #[error("Unknown biomarker id: {0}")]
    UnknownBiomarker(String),

    #[error("Invalid conversion factor {factor} for {id} unit '{unit}'")]
    InvalidConversionFactor { id: String, unit: String, factor: f64 },

    #[error("Invalid reference range for {id}: {reason}")]
    InvalidRange { id: String, reason: String },

    #[error("Reference range for {0} follows its catch-all default and can never match")]
    ShadowedRange(String),

    #[error("No catch-all default reference range for {0}")]
    MissingDefaultRange(String),

    #[error("Unit '{unit}' is not convertible for {id}")]
    ConversionUnsupported { id: String, unit: String },
}

/// A biomarker as the rest of the engine knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBiomarker {
    pub id: String,
    pub display_names: BTreeMap<Locale, String>,
    pub canonical_unit: String,
    /// Unit spelling → factor such that `canonical = raw * factor`.
    #[serde(default)]
    pub alias_units: BTreeMap<String, f64>,
    #[serde(default)]
    pub alias_names: BTreeSet<String>,
}

impl CanonicalBiomarker {
    pub fn display_name(&self, locale: Locale) -> &str {
        self.display_names
            .get(&locale)
            .or_else(|| self.display_names.get(&Locale::En))
            .map(String::as_str)
            .unwrap_or(&self.id)
    }
}

/// Serialized catalog source: biomarkers plus their range rules in
/// evaluation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub biomarkers: Vec<CanonicalBiomarker>,
    pub ranges: Vec<ReferenceRange>,
}

/// Outcome of an alias lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasMatch {
    Found {
        id: String,
        confidence: f32,
        fuzzy: bool,
    },
    /// Several biomarkers matched equally well. Ids are sorted.
    Ambiguous(Vec<String>),
    NotFound,
}

impl AliasMatch {
    /// Confidence that the name refers to some catalog biomarker.
    pub fn confidence(&self) -> f32 {
        match self {
            Self::Found { confidence, .. } => *confidence,
            Self::Ambiguous(_) => EXACT_MATCH_CONFIDENCE - FUZZY_PENALTY,
            Self::NotFound => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct AliasEntry {
    id: String,
    locale: Option<Locale>,
}

#[derive(Debug)]
pub struct Catalog {
    biomarkers: Vec<CanonicalBiomarker>,
    by_id: HashMap<String, usize>,
    aliases: HashMap<String, Vec<AliasEntry>>,
    unit_factors: HashMap<String, HashMap<String, f64>>,
    unit_vocabulary: HashSet<String>,
    ranges: HashMap<String, Vec<ReferenceRange>>,
}

impl Catalog {
    /// The built-in blood-panel catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definition(data::builtin_definition())
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definition: CatalogDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build and validate a catalog.
    ///
    /// Fails on duplicate ids, non-positive conversion factors, invalid or
    /// unreachable range rules, and biomarkers without a catch-all range.
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::new();
        let mut aliases: HashMap<String, Vec<AliasEntry>> = HashMap::new();
        let mut unit_factors = HashMap::new();
        let mut unit_vocabulary = HashSet::new();

        for (idx, biomarker) in definition.biomarkers.iter().enumerate() {
            if by_id.insert(biomarker.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateBiomarker(biomarker.id.clone()));
            }

            let factors = build_unit_factors(biomarker)?;
            unit_vocabulary.extend(factors.keys().filter(|k| !k.is_empty()).cloned());
            unit_factors.insert(biomarker.id.clone(), factors);

            let mut register = |name: &str, locale: Option<Locale>| {
                let key = normalize_name(name);
                if key.is_empty() {
                    return;
                }
                let entries = aliases.entry(key).or_default();
                if !entries.iter().any(|e| e.id == biomarker.id && e.locale == locale) {
                    entries.push(AliasEntry {
                        id: biomarker.id.clone(),
                        locale,
                    });
                }
            };
            register(&biomarker.id, None);
            for (locale, name) in &biomarker.display_names {
                register(name, Some(*locale));
            }
            for name in &biomarker.alias_names {
                register(name, None);
            }
        }

        let mut ranges: HashMap<String, Vec<ReferenceRange>> = HashMap::new();
        for range in definition.ranges {
            if !by_id.contains_key(&range.biomarker_id) {
                return Err(CatalogError::UnknownBiomarker(range.biomarker_id));
            }
            range.validate().map_err(|reason| CatalogError::InvalidRange {
                id: range.biomarker_id.clone(),
                reason,
            })?;
            let rules = ranges.entry(range.biomarker_id.clone()).or_default();
            if rules.iter().any(ReferenceRange::is_default) {
                return Err(CatalogError::ShadowedRange(range.biomarker_id));
            }
            rules.push(range);
        }

        for biomarker in &definition.biomarkers {
            let has_default = ranges
                .get(&biomarker.id)
                .is_some_and(|rules| rules.iter().any(ReferenceRange::is_default));
            if !has_default {
                return Err(CatalogError::MissingDefaultRange(biomarker.id.clone()));
            }
        }

        tracing::debug!(
            biomarkers = definition.biomarkers.len(),
            alias_keys = aliases.len(),
            "Catalog built"
        );

        Ok(Self {
            biomarkers: definition.biomarkers,
            by_id,
            aliases,
            unit_factors,
            unit_vocabulary,
            ranges,
        })
    }

    pub fn len(&self) -> usize {
        self.biomarkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomarkers.is_empty()
    }

    pub fn biomarkers(&self) -> impl Iterator<Item = &CanonicalBiomarker> {
        self.biomarkers.iter()
    }

    pub fn biomarker(&self, id: &str) -> Option<&CanonicalBiomarker> {
        self.by_id.get(id).map(|&idx| &self.biomarkers[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Resolve a printed name to a biomarker id.
    ///
    /// Exact (normalized) matches win over fuzzy ones. When several ids
    /// match on the same tier, the caller's locale narrows them down;
    /// anything still tied is reported as ambiguous.
    pub fn lookup_by_alias(&self, name: &str, locale: Option<Locale>) -> AliasMatch {
        let key = normalize_name(name);
        if key.is_empty() {
            return AliasMatch::NotFound;
        }

        if let Some(entries) = self.aliases.get(&key) {
            let entries: Vec<&AliasEntry> = entries.iter().collect();
            return narrow(&entries, locale, EXACT_MATCH_CONFIDENCE, false);
        }

        if key.chars().count() < MIN_FUZZY_LEN {
            return AliasMatch::NotFound;
        }

        let fuzzy: Vec<&AliasEntry> = self
            .aliases
            .iter()
            .filter(|(alias, _)| is_fuzzy_match(&key, alias))
            .flat_map(|(_, entries)| entries.iter())
            .collect();

        if fuzzy.is_empty() {
            return AliasMatch::NotFound;
        }
        narrow(&fuzzy, locale, EXACT_MATCH_CONFIDENCE - FUZZY_PENALTY, true)
    }

    /// Convert `value` expressed in `from_unit` into the biomarker's canonical unit.
    pub fn convert(&self, id: &str, from_unit: &str, value: f64) -> Result<f64, CatalogError> {
        Ok(value * self.factor(id, from_unit)?)
    }

    /// Convert between any two units known for the biomarker.
    pub fn convert_between(
        &self,
        id: &str,
        from_unit: &str,
        to_unit: &str,
        value: f64,
    ) -> Result<f64, CatalogError> {
        let from = self.factor(id, from_unit)?;
        let to = self.factor(id, to_unit)?;
        Ok(value * from / to)
    }

    fn factor(&self, id: &str, unit: &str) -> Result<f64, CatalogError> {
        let factors = self
            .unit_factors
            .get(id)
            .ok_or_else(|| CatalogError::UnknownBiomarker(id.to_string()))?;
        factors
            .get(&normalize_unit(unit))
            .copied()
            .ok_or_else(|| CatalogError::ConversionUnsupported {
                id: id.to_string(),
                unit: unit.to_string(),
            })
    }

    /// Resolve the applicable reference range: first matching rule in
    /// declaration order, else the catch-all default. Only unknown ids fail.
    pub fn resolve_range(
        &self,
        id: &str,
        context: &PatientContext,
        lab: Option<&str>,
    ) -> Result<ReferenceRange, CatalogError> {
        let rules = self
            .ranges
            .get(id)
            .ok_or_else(|| CatalogError::UnknownBiomarker(id.to_string()))?;

        rules
            .iter()
            .find(|rule| rule.matches(context, lab))
            .or_else(|| rules.iter().find(|rule| rule.is_default()))
            .cloned()
            .ok_or_else(|| CatalogError::MissingDefaultRange(id.to_string()))
    }

    /// Does the token read like a unit, either one the catalog converts or
    /// a generic lab unit?
    pub fn is_unit_like(&self, text: &str) -> bool {
        let key = normalize_unit(text);
        if key.is_empty() || key.parse::<f64>().is_ok() {
            return false;
        }
        self.unit_vocabulary.contains(&key) || is_generic_unit(&key)
    }

    /// Is the unit one some catalog biomarker can convert from?
    pub fn is_known_unit(&self, text: &str) -> bool {
        self.unit_vocabulary.contains(&normalize_unit(text))
    }
}

fn build_unit_factors(biomarker: &CanonicalBiomarker) -> Result<HashMap<String, f64>, CatalogError> {
    let mut factors = HashMap::new();
    factors.insert(normalize_unit(&biomarker.canonical_unit), 1.0);

    for (unit, &factor) in &biomarker.alias_units {
        let invalid = || CatalogError::InvalidConversionFactor {
            id: biomarker.id.clone(),
            unit: unit.clone(),
            factor,
        };
        if !factor.is_finite() || factor <= 0.0 {
            return Err(invalid());
        }
        match factors.get(&normalize_unit(unit)) {
            Some(existing) if (existing - factor).abs() > f64::EPSILON => return Err(invalid()),
            Some(_) => {}
            None => {
                factors.insert(normalize_unit(unit), factor);
            }
        }
    }
    Ok(factors)
}

fn narrow(entries: &[&AliasEntry], locale: Option<Locale>, confidence: f32, fuzzy: bool) -> AliasMatch {
    let ids: BTreeSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    if ids.len() == 1 {
        if let Some(id) = ids.into_iter().next() {
            return AliasMatch::Found {
                id: id.to_string(),
                confidence,
                fuzzy,
            };
        }
        return AliasMatch::NotFound;
    }

    if let Some(locale) = locale {
        let localized: BTreeSet<&str> = entries
            .iter()
            .filter(|e| e.locale == Some(locale))
            .map(|e| e.id.as_str())
            .collect();
        if localized.len() == 1 {
            if let Some(id) = localized.into_iter().next() {
                return AliasMatch::Found {
                    id: id.to_string(),
                    confidence,
                    fuzzy,
                };
            }
        }
    }

    AliasMatch::Ambiguous(ids.into_iter().map(str::to_string).collect())
}

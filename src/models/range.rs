use serde::{Deserialize, Serialize};

use super::enums::Sex;

/// Upper age bound of the catch-all range every biomarker carries.
pub const DEFAULT_AGE_MAX: u8 = 120;

/// Patient attributes that select among reference ranges. Both are optional;
/// an empty context only ever matches sex-neutral, all-ages rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    pub sex: Option<Sex>,
    pub age: Option<u8>,
}

impl PatientContext {
    pub fn new(sex: Option<Sex>, age: Option<u8>) -> Self {
        Self { sex, age }
    }
}

/// Reference interval for one biomarker in canonical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub biomarker_id: String,
    #[serde(default = "any_sex")]
    pub sex: Sex,
    #[serde(default)]
    pub age_min: u8,
    #[serde(default = "default_age_max")]
    pub age_max: u8,
    pub low: f64,
    pub high: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,
    /// Lab template id this rule is specific to. `None` applies to every lab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<String>,
}

fn any_sex() -> Sex {
    Sex::Any
}

fn default_age_max() -> u8 {
    DEFAULT_AGE_MAX
}

impl ReferenceRange {
    /// Sex-neutral, all-ages, lab-independent range.
    pub fn default_for(biomarker_id: &str, low: f64, high: f64) -> Self {
        Self {
            biomarker_id: biomarker_id.to_string(),
            sex: Sex::Any,
            age_min: 0,
            age_max: DEFAULT_AGE_MAX,
            low,
            high,
            critical_low: None,
            critical_high: None,
            lab: None,
        }
    }

    pub fn with_critical(mut self, critical_low: Option<f64>, critical_high: Option<f64>) -> Self {
        self.critical_low = critical_low;
        self.critical_high = critical_high;
        self
    }

    pub fn for_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn for_ages(mut self, age_min: u8, age_max: u8) -> Self {
        self.age_min = age_min;
        self.age_max = age_max;
        self
    }

    pub fn for_lab(mut self, lab: &str) -> Self {
        self.lab = Some(lab.to_string());
        self
    }

    fn covers_all_ages(&self) -> bool {
        self.age_min == 0 && self.age_max >= DEFAULT_AGE_MAX
    }

    /// The mandatory catch-all rule shape.
    pub fn is_default(&self) -> bool {
        self.sex == Sex::Any && self.covers_all_ages() && self.lab.is_none()
    }

    /// Does this rule apply to the patient and lab? Age bounds are inclusive.
    /// Rules narrowed by sex or age never match a context missing that attribute.
    pub fn matches(&self, context: &PatientContext, lab: Option<&str>) -> bool {
        if let Some(rule_lab) = self.lab.as_deref() {
            if lab != Some(rule_lab) {
                return false;
            }
        }

        let sex_ok = match self.sex {
            Sex::Any => true,
            rule_sex => context.sex == Some(rule_sex),
        };
        if !sex_ok {
            return false;
        }

        if self.covers_all_ages() {
            return true;
        }
        context
            .age
            .is_some_and(|age| age >= self.age_min && age <= self.age_max)
    }

    /// Check the ordering constraints between bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err("bounds must be finite".into());
        }
        if self.low > self.high {
            return Err(format!("low {} exceeds high {}", self.low, self.high));
        }
        if let Some(critical_low) = self.critical_low {
            if critical_low > self.low {
                return Err(format!(
                    "critical_low {critical_low} exceeds low {}",
                    self.low
                ));
            }
        }
        if let Some(critical_high) = self.critical_high {
            if critical_high < self.high {
                return Err(format!(
                    "critical_high {critical_high} below high {}",
                    self.high
                ));
            }
        }
        if self.age_min > self.age_max {
            return Err(format!(
                "age_min {} exceeds age_max {}",
                self.age_min, self.age_max
            ));
        }
        Ok(())
    }
}

/// Range as printed on the report, converted to canonical units.
/// Either bound may be open (`< 5.2` has no low bound).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintedRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_matches_everyone() {
        let range = ReferenceRange::default_for("GLUCOSE", 3.3, 5.5);
        assert!(range.is_default());
        assert!(range.matches(&PatientContext::default(), None));
        assert!(range.matches(&PatientContext::new(Some(Sex::Male), Some(40)), Some("invitro")));
    }

    #[test]
    fn sex_specific_rule_needs_sex() {
        let range = ReferenceRange::default_for("HEMOGLOBIN", 130.0, 160.0).for_sex(Sex::Male);
        assert!(range.matches(&PatientContext::new(Some(Sex::Male), None), None));
        assert!(!range.matches(&PatientContext::new(Some(Sex::Female), None), None));
        assert!(!range.matches(&PatientContext::default(), None));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let range = ReferenceRange::default_for("GLUCOSE", 3.3, 5.5).for_ages(14, 60);
        assert!(range.matches(&PatientContext::new(None, Some(14)), None));
        assert!(range.matches(&PatientContext::new(None, Some(60)), None));
        assert!(!range.matches(&PatientContext::new(None, Some(61)), None));
        assert!(!range.matches(&PatientContext::new(None, None), None));
    }

    #[test]
    fn lab_specific_rule_needs_lab() {
        let range = ReferenceRange::default_for("ALT", 0.0, 41.0).for_lab("invitro");
        assert!(range.matches(&PatientContext::default(), Some("invitro")));
        assert!(!range.matches(&PatientContext::default(), Some("helix")));
        assert!(!range.matches(&PatientContext::default(), None));
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let range = ReferenceRange::default_for("X", 5.0, 1.0);
        assert!(range.validate().is_err());
    }

    #[test]
    fn validate_rejects_critical_inside_range() {
        let low = ReferenceRange::default_for("X", 1.0, 5.0).with_critical(Some(2.0), None);
        assert!(low.validate().is_err());
        let high = ReferenceRange::default_for("X", 1.0, 5.0).with_critical(None, Some(4.0));
        assert!(high.validate().is_err());
        let ok = ReferenceRange::default_for("X", 1.0, 5.0).with_critical(Some(1.0), Some(5.0));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let range: ReferenceRange =
            serde_json::from_str(r#"{"biomarker_id":"GLUCOSE","low":3.3,"high":5.5}"#).unwrap();
        assert!(range.is_default());
        assert_eq!(range.age_max, DEFAULT_AGE_MAX);
    }
}

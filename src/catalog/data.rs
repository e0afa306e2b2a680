//! Built-in biomarker catalog: common blood-panel analytes with Russian,
//! English and French naming, SI canonical units and adult reference ranges.
//!
//! Range rules are listed most specific first; the catch-all default always
//! comes last because resolution is first-match-wins.

use std::collections::{BTreeMap, BTreeSet};

use super::{CanonicalBiomarker, CatalogDefinition};
use crate::models::{Locale, ReferenceRange, Sex};

fn biomarker(
    id: &str,
    canonical_unit: &str,
    names: [&str; 3],
    aliases: &[&str],
    units: &[(&str, f64)],
) -> CanonicalBiomarker {
    let [ru, en, fr] = names;
    let display_names: BTreeMap<Locale, String> = [(Locale::Ru, ru), (Locale::En, en), (Locale::Fr, fr)]
        .into_iter()
        .map(|(locale, name)| (locale, name.to_string()))
        .collect();
    CanonicalBiomarker {
        id: id.to_string(),
        display_names,
        canonical_unit: canonical_unit.to_string(),
        alias_units: units.iter().map(|(u, f)| (u.to_string(), *f)).collect(),
        alias_names: aliases.iter().map(|a| a.to_string()).collect::<BTreeSet<_>>(),
    }
}

fn range(id: &str, low: f64, high: f64) -> ReferenceRange {
    ReferenceRange::default_for(id, low, high)
}

pub fn builtin_definition() -> CatalogDefinition {
    CatalogDefinition {
        biomarkers: builtin_biomarkers(),
        ranges: builtin_ranges(),
    }
}

fn builtin_biomarkers() -> Vec<CanonicalBiomarker> {
    vec![
        // ── Complete blood count ────────────────────────────────
        biomarker(
            "HEMOGLOBIN",
            "g/L",
            ["Гемоглобин", "Hemoglobin", "Hémoglobine"],
            &["HGB", "Hb", "Haemoglobin"],
            &[("г/л", 1.0), ("g/dL", 10.0), ("г/дл", 10.0), ("mmol/L", 16.11)],
        ),
        biomarker(
            "RBC",
            "10^12/L",
            ["Эритроциты", "Red blood cells", "Érythrocytes"],
            &["RBC", "Erythrocytes", "Hématies", "Red blood cell count"],
            &[("×10¹²/л", 1.0), ("10^6/uL", 1.0), ("млн/мкл", 1.0), ("T/L", 1.0)],
        ),
        biomarker(
            "WBC",
            "10^9/L",
            ["Лейкоциты", "White blood cells", "Leucocytes"],
            &["WBC", "Leukocytes", "Globules blancs", "White blood cell count"],
            &[("×10⁹/л", 1.0), ("10^3/uL", 1.0), ("тыс/мкл", 1.0), ("G/L", 1.0)],
        ),
        biomarker(
            "PLATELETS",
            "10^9/L",
            ["Тромбоциты", "Platelets", "Plaquettes"],
            &["PLT", "Thrombocytes", "Platelet count"],
            &[("×10⁹/л", 1.0), ("10^3/uL", 1.0), ("тыс/мкл", 1.0), ("G/L", 1.0)],
        ),
        biomarker(
            "HEMATOCRIT",
            "%",
            ["Гематокрит", "Hematocrit", "Hématocrite"],
            &["HCT", "Ht", "Haematocrit"],
            &[("L/L", 100.0), ("л/л", 100.0)],
        ),
        biomarker(
            "ESR",
            "mm/h",
            ["СОЭ", "ESR", "Vitesse de sédimentation"],
            &[
                "Скорость оседания эритроцитов",
                "Erythrocyte sedimentation rate",
                "VS",
            ],
            &[("мм/ч", 1.0), ("mm/hr", 1.0)],
        ),
        // ── Metabolic ───────────────────────────────────────────
        biomarker(
            "GLUCOSE",
            "mmol/L",
            ["Глюкоза", "Glucose", "Glycémie"],
            &[
                "GLU",
                "Глюкоза натощак",
                "Сахар крови",
                "Fasting glucose",
                "Blood glucose",
                "Glycémie à jeun",
            ],
            &[("ммоль/л", 1.0), ("mg/dL", 0.0555), ("мг/дл", 0.0555), ("g/L", 5.55)],
        ),
        biomarker(
            "HBA1C",
            "%",
            ["Гликированный гемоглобин", "HbA1c", "Hémoglobine glyquée"],
            &["A1c", "Гликогемоглобин", "Glycated hemoglobin", "HbA1c (NGSP)"],
            &[],
        ),
        biomarker(
            "CREATININE",
            "umol/L",
            ["Креатинин", "Creatinine", "Créatinine"],
            &["CREA", "CREAT", "Serum creatinine"],
            &[("мкмоль/л", 1.0), ("mg/dL", 88.42), ("mg/L", 8.842)],
        ),
        biomarker(
            "UREA",
            "mmol/L",
            ["Мочевина", "Urea", "Urée"],
            &["Urée sanguine", "Serum urea"],
            &[("ммоль/л", 1.0), ("mg/dL", 0.1665), ("g/L", 16.65)],
        ),
        // ── Lipids ──────────────────────────────────────────────
        biomarker(
            "CHOLESTEROL_TOTAL",
            "mmol/L",
            ["Холестерин", "Total cholesterol", "Cholestérol total"],
            &["Общий холестерин", "Холестерин общий", "Cholesterol", "Cholestérol", "CHOL"],
            &[("ммоль/л", 1.0), ("mg/dL", 0.02586), ("g/L", 2.586)],
        ),
        biomarker(
            "HDL",
            "mmol/L",
            ["Холестерин ЛПВП", "HDL cholesterol", "Cholestérol HDL"],
            &["HDL", "ЛПВП", "HDL-C"],
            &[("ммоль/л", 1.0), ("mg/dL", 0.02586), ("g/L", 2.586)],
        ),
        biomarker(
            "LDL",
            "mmol/L",
            ["Холестерин ЛПНП", "LDL cholesterol", "Cholestérol LDL"],
            &["LDL", "ЛПНП", "LDL-C"],
            &[("ммоль/л", 1.0), ("mg/dL", 0.02586), ("g/L", 2.586)],
        ),
        biomarker(
            "TRIGLYCERIDES",
            "mmol/L",
            ["Триглицериды", "Triglycerides", "Triglycérides"],
            &["TG", "TRIG"],
            &[("ммоль/л", 1.0), ("mg/dL", 0.01129), ("g/L", 1.129)],
        ),
        // ── Liver ───────────────────────────────────────────────
        biomarker(
            "ALT",
            "U/L",
            ["АЛТ", "ALT", "ALAT"],
            &["Аланинаминотрансфераза", "АлАТ", "Alanine aminotransferase", "SGPT", "GPT", "TGP"],
            &[("Ед/л", 1.0), ("IU/L", 1.0), ("ukat/L", 60.0)],
        ),
        biomarker(
            "AST",
            "U/L",
            ["АСТ", "AST", "ASAT"],
            &["Аспартатаминотрансфераза", "АсАТ", "Aspartate aminotransferase", "SGOT", "GOT", "TGO"],
            &[("Ед/л", 1.0), ("IU/L", 1.0), ("ukat/L", 60.0)],
        ),
        // ── Thyroid, iron, inflammation ─────────────────────────
        biomarker(
            "TSH",
            "mIU/L",
            ["ТТГ", "TSH", "TSH us"],
            &["Тиреотропный гормон", "Thyroid stimulating hormone", "Thyrotropin", "Thyréostimuline"],
            &[("мМЕ/л", 1.0), ("uIU/mL", 1.0), ("mU/L", 1.0)],
        ),
        biomarker(
            "FERRITIN",
            "ug/L",
            ["Ферритин", "Ferritin", "Ferritine"],
            &["FERR", "Serum ferritin"],
            &[("мкг/л", 1.0), ("ng/mL", 1.0), ("нг/мл", 1.0)],
        ),
        biomarker(
            "CRP",
            "mg/L",
            ["С-реактивный белок", "C-reactive protein", "Protéine C réactive"],
            &["CRP", "СРБ", "hs-CRP"],
            &[("мг/л", 1.0), ("mg/dL", 10.0)],
        ),
        // ── Electrolytes & vitamins ─────────────────────────────
        biomarker(
            "POTASSIUM",
            "mmol/L",
            ["Калий", "Potassium", "Kaliémie"],
            &["K", "K+"],
            &[("ммоль/л", 1.0), ("mEq/L", 1.0)],
        ),
        biomarker(
            "SODIUM",
            "mmol/L",
            ["Натрий", "Sodium", "Natrémie"],
            &["Na", "Na+"],
            &[("ммоль/л", 1.0), ("mEq/L", 1.0)],
        ),
        biomarker(
            "VITAMIN_D",
            "nmol/L",
            ["Витамин D", "Vitamin D", "Vitamine D"],
            &["25-OH vitamin D", "25(OH)D", "Витамин D (25-OH)", "25-гидроксикальциферол"],
            &[("нмоль/л", 1.0), ("ng/mL", 2.496), ("нг/мл", 2.496)],
        ),
    ]
}

fn builtin_ranges() -> Vec<ReferenceRange> {
    vec![
        range("HEMOGLOBIN", 130.0, 160.0).for_sex(Sex::Male).with_critical(Some(70.0), Some(200.0)),
        range("HEMOGLOBIN", 120.0, 140.0).for_sex(Sex::Female).with_critical(Some(70.0), Some(200.0)),
        range("HEMOGLOBIN", 120.0, 160.0).with_critical(Some(70.0), Some(200.0)),
        range("RBC", 4.2, 5.6).for_sex(Sex::Male).with_critical(Some(2.0), Some(8.0)),
        range("RBC", 3.8, 5.1).for_sex(Sex::Female).with_critical(Some(2.0), Some(8.0)),
        range("RBC", 4.0, 5.5).with_critical(Some(2.0), Some(8.0)),
        range("WBC", 4.0, 9.0).with_critical(Some(2.0), Some(30.0)),
        range("PLATELETS", 180.0, 320.0).with_critical(Some(50.0), Some(1000.0)),
        range("HEMATOCRIT", 40.0, 48.0).for_sex(Sex::Male).with_critical(Some(20.0), Some(60.0)),
        range("HEMATOCRIT", 36.0, 42.0).for_sex(Sex::Female).with_critical(Some(20.0), Some(60.0)),
        range("HEMATOCRIT", 36.0, 48.0).with_critical(Some(20.0), Some(60.0)),
        range("ESR", 2.0, 15.0).for_sex(Sex::Male),
        range("ESR", 2.0, 20.0).for_sex(Sex::Female),
        range("ESR", 2.0, 20.0),
        range("GLUCOSE", 4.6, 6.4).for_ages(60, 120).with_critical(Some(2.2), Some(25.0)),
        range("GLUCOSE", 3.3, 5.5).with_critical(Some(2.2), Some(25.0)),
        range("HBA1C", 4.0, 6.0).with_critical(None, Some(10.0)),
        range("CREATININE", 62.0, 115.0).for_sex(Sex::Male).with_critical(None, Some(800.0)),
        range("CREATININE", 53.0, 97.0).for_sex(Sex::Female).with_critical(None, Some(800.0)),
        range("CREATININE", 53.0, 115.0).with_critical(None, Some(800.0)),
        range("UREA", 2.5, 8.3).with_critical(None, Some(35.7)),
        range("CHOLESTEROL_TOTAL", 3.0, 5.2).with_critical(None, Some(7.8)),
        range("HDL", 1.0, 3.0).for_sex(Sex::Male),
        range("HDL", 1.2, 3.5).for_sex(Sex::Female),
        range("HDL", 1.0, 3.5),
        range("LDL", 0.0, 3.0).with_critical(None, Some(4.9)),
        range("TRIGLYCERIDES", 0.0, 1.7).with_critical(None, Some(11.3)),
        range("ALT", 0.0, 41.0).for_sex(Sex::Male).with_critical(None, Some(1000.0)),
        range("ALT", 0.0, 33.0).for_sex(Sex::Female).with_critical(None, Some(1000.0)),
        range("ALT", 0.0, 40.0).with_critical(None, Some(1000.0)),
        range("AST", 0.0, 40.0).with_critical(None, Some(1000.0)),
        range("TSH", 0.4, 4.0).with_critical(Some(0.01), Some(50.0)),
        range("FERRITIN", 20.0, 250.0).for_sex(Sex::Male),
        range("FERRITIN", 10.0, 120.0).for_sex(Sex::Female),
        range("FERRITIN", 10.0, 250.0),
        range("CRP", 0.0, 5.0).with_critical(None, Some(200.0)),
        range("POTASSIUM", 3.5, 5.1).with_critical(Some(2.5), Some(6.5)),
        range("SODIUM", 136.0, 145.0).with_critical(Some(120.0), Some(160.0)),
        range("VITAMIN_D", 75.0, 250.0).with_critical(Some(25.0), Some(375.0)),
    ]
}

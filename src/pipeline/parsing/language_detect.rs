//! Lightweight document locale detection.
//!
//! Russian is recognised by its script. French and English are told apart
//! by indicator-word frequency plus a diacritic bonus, the way lab headers
//! and footers differ between the two.

use crate::models::Locale;

/// Share of Cyrillic among all letters above which a document is Russian.
const CYRILLIC_SHARE: f32 = 0.30;

const FRENCH_INDICATORS: &[&str] = &[
    "le ", "la ", "les ", "un ", "une ", "des ", "du ", "de ", "et ", "est ", "en ", "au ", "aux ",
    "pour ", "par ", "sur ", "dans ", "avec ",
    // Lab French
    "résultat", "analyse", "valeurs de référence", "unités", "prélèvement", "médecin",
    "patient", "examen", "bilan", "sanguin", "numération", "à jeun", "biochimie",
    "d'", "l'",
];

const ENGLISH_INDICATORS: &[&str] = &[
    "the ", "and ", "was ", "for ", "are ", "from ", "with ", "this ", "that ",
    // Lab English
    "result", "reference", "range", "units", "specimen", "collected", "test ",
    "blood", "fasting", "count", "panel", "physician",
];

/// Detect the document locale from its concatenated token text.
///
/// French wins ties once any French evidence exists; text with no signal
/// at all is treated as English.
pub fn detect_locale(text: &str) -> Locale {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters == 0 {
        return Locale::En;
    }
    let cyrillic = text.chars().filter(|c| is_cyrillic(*c)).count();
    if cyrillic as f32 / letters as f32 >= CYRILLIC_SHARE {
        return Locale::Ru;
    }

    let lower = text.to_lowercase();
    let french = count_indicators(&lower, FRENCH_INDICATORS) + count_french_diacritics(&lower);
    let english = count_indicators(&lower, ENGLISH_INDICATORS);

    if french > 0 && french >= english {
        Locale::Fr
    } else {
        Locale::En
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

fn count_indicators(lower_text: &str, indicators: &[&str]) -> u32 {
    indicators
        .iter()
        .map(|indicator| lower_text.matches(indicator).count() as u32)
        .sum()
}

/// Each two French diacritics count as one indicator.
fn count_french_diacritics(lower_text: &str) -> u32 {
    let count = lower_text
        .chars()
        .filter(|ch| {
            matches!(
                ch,
                'é' | 'è' | 'ê' | 'ë' | 'ç' | 'ù' | 'û' | 'ü' | 'î' | 'ï' | 'ô' | 'à' | 'â' | 'œ' | 'æ'
            )
        })
        .count() as u32;
    count / 2
}

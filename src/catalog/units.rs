//! Unit spelling normalization.
//!
//! Lab reports spell the same unit many ways: "ммоль/л", "mmol/L",
//! "mmol / l". Everything is folded into a lowercase Latin key before the
//! catalog looks up a conversion factor.

use std::sync::LazyLock;

use regex::Regex;

/// Unit keys recognised as "unit-like" even when no catalog biomarker uses them.
const GENERIC_UNITS: &[&str] = &[
    "%", "u", "iu", "miu", "uiu", "g", "mg", "ug", "ng", "pg", "mol", "mmol", "umol", "nmol",
    "pmol", "l", "ml", "dl", "ul", "fl", "s", "min", "mm/h", "mm/ch", "kat", "ukat", "meq",
];

static MULTIPLIER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[×xх*·]\s*10").expect("valid multiplier regex"));

static STAR_EXPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\*(\d+)").expect("valid exponent regex"));

/// Fold a unit spelling into its lookup key.
///
/// - superscript exponents become `^N` (`10⁹` → `10^9`)
/// - a leading multiplication sign before `10` is dropped (`×10⁹/л` → `10^9/l`)
/// - micro signs and the Russian `мк` prefix become `u`
/// - Cyrillic is transliterated (`ммоль/л` → `mmol/l`, `ед/л` → `u/l`)
pub fn normalize_unit(raw: &str) -> String {
    let mut expanded = String::with_capacity(raw.len() + 2);
    let mut in_superscript = false;
    for ch in raw.trim().chars() {
        match superscript_digit(ch) {
            Some(d) => {
                if !in_superscript {
                    expanded.push('^');
                    in_superscript = true;
                }
                expanded.push(d);
            }
            None => {
                in_superscript = false;
                expanded.push(ch);
            }
        }
    }

    let compact: String = expanded
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| match c {
            'µ' | 'μ' => 'u',
            _ => c,
        })
        .collect();

    let compact = MULTIPLIER_PREFIX.replace(&compact, "10").into_owned();
    let compact = STAR_EXPONENT.replace(&compact, "10^$1").into_owned();

    let latin = transliterate(&compact);
    latin
        .split('/')
        .map(normalize_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Is `key` (already normalized) a unit spelling we recognise regardless of biomarker?
pub fn is_generic_unit(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    if GENERIC_UNITS.contains(&key) || key.starts_with("10^") {
        return true;
    }
    // Compound units: every segment must carry a letter or exponent ("mg/dl", "10^9/l")
    key.contains('/')
        && key
            .split('/')
            .all(|seg| !seg.is_empty() && seg.chars().any(|c| c.is_alphabetic() || c == '^' || c == '%'))
}

fn normalize_segment(segment: &str) -> String {
    let segment = match segment.strip_prefix("mk") {
        Some(rest) if !rest.is_empty() => format!("u{rest}"),
        _ => segment.to_string(),
    };
    match segment.as_str() {
        "ed" => "u".into(),
        "me" => "iu".into(),
        "mme" => "miu".into(),
        "ume" => "uiu".into(),
        "sek" => "s".into(),
        _ => segment,
    }
}

fn superscript_digit(ch: char) -> Option<char> {
    match ch {
        '⁰' => Some('0'),
        '¹' => Some('1'),
        '²' => Some('2'),
        '³' => Some('3'),
        '⁴' => Some('4'),
        '⁵' => Some('5'),
        '⁶' => Some('6'),
        '⁷' => Some('7'),
        '⁸' => Some('8'),
        '⁹' => Some('9'),
        _ => None,
    }
}

fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let latin = match ch {
            'а' => "a",
            'б' => "b",
            'в' => "v",
            'г' => "g",
            'д' => "d",
            'е' | 'ё' | 'э' => "e",
            'ж' => "zh",
            'з' => "z",
            'и' | 'й' => "i",
            'к' => "k",
            'л' => "l",
            'м' => "m",
            'н' => "n",
            'о' => "o",
            'п' => "p",
            'р' => "r",
            'с' => "s",
            'т' => "t",
            'у' => "u",
            'ф' => "f",
            'х' => "h",
            'ц' => "c",
            'ч' => "ch",
            'ш' => "sh",
            'щ' => "sch",
            'ъ' | 'ь' => "",
            'ы' => "y",
            'ю' => "yu",
            'я' => "ya",
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(latin);
    }
    out
}

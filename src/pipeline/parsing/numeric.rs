//! Numeric value, unit and reference-range recognition.

use std::sync::LazyLock;

use regex::Regex;

use super::confidence::{
    NUMBER_CLEAN, NUMBER_COMPARATOR, NUMBER_FOREIGN_SEPARATOR, NUMBER_THOUSANDS_GUESS,
};
use crate::models::{Locale, PrintedRange};

/// Abnormal-value markers printed after a result.
const FLAG_MARKS: &[char] = &['*', '↑', '↓', '!'];

/// Longest token span a printed range may cover ("3.3", "-", "5.5").
pub const MAX_RANGE_TOKENS: usize = 3;

static VALUE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<cmp>[<>≤≥]?)(?P<num>\d+(?:[.,]\d+)*)(?P<rest>.*)$").expect("valid value regex")
});

static BOUNDED_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(\[]?\s*(?P<low>\d+(?:[.,]\d+)?)\s*[-–—−]\s*(?P<high>\d+(?:[.,]\d+)?)\s*[)\]]?$")
        .expect("valid bounded range regex")
});

static UPPER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[(\[]?\s*(?:<=|<|≤|до)\s*(?P<high>\d+(?:[.,]\d+)?)\s*[)\]]?$")
        .expect("valid upper range regex")
});

static LOWER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[(\[]?\s*(?:>=|>|≥|от)\s*(?P<low>\d+(?:[.,]\d+)?)\s*[)\]]?$")
        .expect("valid lower range regex")
});

/// Decimal separator a locale prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalStyle {
    Point,
    Comma,
}

impl From<Locale> for DecimalStyle {
    fn from(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::Point,
            Locale::Ru | Locale::Fr => Self::Comma,
        }
    }
}

/// A number read from text with the confidence of the reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNumber {
    pub value: f64,
    pub confidence: f32,
}

/// A token split into its numeric part and an optional glued unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueToken {
    pub number_text: String,
    pub number: ParsedNumber,
    pub unit: Option<String>,
}

/// Parse a bare number. Both separators are accepted; the locale decides
/// `1,234`-style ambiguity and separators foreign to the locale cost a
/// little confidence.
pub fn parse_number(text: &str, style: DecimalStyle) -> Option<ParsedNumber> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let separators: Vec<char> = text.chars().filter(|c| !c.is_ascii_digit()).collect();
    let groups: Vec<&str> = text.split(['.', ',']).collect();
    if groups.iter().any(|g| g.is_empty()) {
        return None;
    }

    let (normalized, confidence) = match separators.as_slice() {
        [] => (text.to_string(), NUMBER_CLEAN),
        [sep] => {
            let fraction = groups[1];
            let native = match style {
                DecimalStyle::Point => '.',
                DecimalStyle::Comma => ',',
            };
            if *sep == native {
                (format!("{}.{}", groups[0], fraction), NUMBER_CLEAN)
            } else if *sep == ',' && fraction.len() == 3 && groups[0].len() <= 3 && !groups[0].starts_with('0') {
                // "1,234" in an English report
                (format!("{}{}", groups[0], fraction), NUMBER_THOUSANDS_GUESS)
            } else {
                (format!("{}.{}", groups[0], fraction), NUMBER_FOREIGN_SEPARATOR)
            }
        }
        seps => {
            // Only thousands grouping may repeat a separator
            let first = seps[0];
            let grouped = seps.iter().all(|s| *s == first)
                && groups[1..].iter().all(|g| g.len() == 3)
                && groups[0].len() <= 3;
            if !grouped {
                return None;
            }
            (groups.concat(), NUMBER_THOUSANDS_GUESS)
        }
    };

    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(ParsedNumber { value, confidence })
}

/// Remove trailing abnormal-value markers (`6.8*`, `145↑`).
pub fn strip_flags(text: &str) -> &str {
    text.trim_end_matches(FLAG_MARKS).trim_end()
}

/// Is the token nothing but abnormal-value markers?
pub fn is_flag_token(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| FLAG_MARKS.contains(&c))
}

/// Read a value token, splitting off a glued unit (`4.8×10¹²/л` → `4.8` + `×10¹²/л`).
///
/// Returns `None` when the token is not a value, including dates and
/// ranges such as `3.3-5.5`.
pub fn split_value_and_unit(token: &str, style: DecimalStyle) -> Option<ValueToken> {
    let token = strip_flags(token.trim());
    let caps = VALUE_TOKEN.captures(token)?;
    let number_text = caps.name("num")?.as_str();
    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
    if number_text == "10" && rest.starts_with(['^', '*']) {
        // A bare exponent unit such as "10^9/L"
        return None;
    }

    let unit = if rest.is_empty() {
        None
    } else if starts_like_unit(rest) {
        Some(rest.to_string())
    } else {
        return None;
    };

    let mut number = parse_number(number_text, style)?;
    if caps.name("cmp").is_some_and(|m| !m.as_str().is_empty()) {
        number.confidence *= NUMBER_COMPARATOR;
    }

    Some(ValueToken {
        number_text: number_text.to_string(),
        number,
        unit,
    })
}

/// A glued remainder is a unit when it opens like one and carries a letter,
/// a percent sign or a multiplier. `/03/2024` of a slash date does not.
fn starts_like_unit(rest: &str) -> bool {
    let Some(first) = rest.chars().next() else {
        return false;
    };
    let opens = first.is_alphabetic() || matches!(first, '×' | '*' | '%' | 'µ' | '·' | '/');
    let carries_unit = matches!(first, '×' | '*' | '·') || rest.chars().any(|c| c.is_alphabetic() || c == '%');
    opens && carries_unit && !rest.chars().any(|c| matches!(c, '-' | '–' | '—'))
}

/// Parse a printed reference range from the text of 1 to
/// [`MAX_RANGE_TOKENS`] joined tokens.
pub fn parse_range(text: &str, style: DecimalStyle) -> Option<PrintedRange> {
    let text = text.trim();
    let number = |s: &str| parse_number(s, style).map(|n| n.value);

    if let Some(caps) = BOUNDED_RANGE.captures(text) {
        let low = number(caps.name("low")?.as_str())?;
        let high = number(caps.name("high")?.as_str())?;
        if low > high {
            return None;
        }
        return Some(PrintedRange {
            low: Some(low),
            high: Some(high),
        });
    }
    if let Some(caps) = UPPER_RANGE.captures(text) {
        return Some(PrintedRange {
            low: None,
            high: Some(number(caps.name("high")?.as_str())?),
        });
    }
    if let Some(caps) = LOWER_RANGE.captures(text) {
        return Some(PrintedRange {
            low: Some(number(caps.name("low")?.as_str())?),
            high: None,
        });
    }
    None
}

/// Longest range starting at `tokens[0]`, as `(token count, joined text)`.
pub fn match_range<'a, I>(tokens: I, style: DecimalStyle) -> Option<(usize, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens: Vec<&str> = tokens.into_iter().take(MAX_RANGE_TOKENS).collect();
    (1..=tokens.len()).rev().find_map(|span| {
        let text = tokens[..span].join(" ");
        parse_range(&text, style).map(|_| (span, text))
    })
}

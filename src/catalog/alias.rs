//! Name normalization and fuzzy matching for biomarker aliases.
//!
//! Keys are case-folded and stripped of diacritics so that "Hémoglobine",
//! "HEMOGLOBINE" and "hemoglobine" share one index entry. Fuzzy matching
//! tolerates a single OCR slip (edit distance 1).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Shortest key or alias eligible for fuzzy matching. Three-letter
/// enzyme codes (ALT, AST, GOT) sit one edit away from everyday words.
pub const MIN_FUZZY_LEN: usize = 4;

/// Maximum edit distance accepted by fuzzy matching.
pub const MAX_FUZZY_DISTANCE: u32 = 1;

/// Combining breve of `й`, a letter of its own in Cyrillic.
const BREVE: char = '\u{0306}';

/// Normalize a biomarker name into its lookup key.
///
/// NFD-decomposes and drops combining marks (é → e, ё → е) except the
/// breve of `й`, lowercases, unifies dash variants, strips wrapping
/// punctuation such as `(HGB)` or a trailing `:` and collapses inner
/// whitespace.
pub fn normalize_name(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut prev = None;
    for c in raw.nfd() {
        if is_combining_mark(c) {
            if c == BREVE && matches!(prev, Some('и' | 'И')) {
                stripped.push(c);
            }
            continue;
        }
        stripped.push(match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            _ => c,
        });
        prev = Some(c);
    }
    let folded = stripped.nfc().collect::<String>().to_lowercase();

    let trimmed = folded.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | ':' | ';' | ',' | '.' | '*' | '"' | '\'')
    });

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compute Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n as u32;
    }
    if n == 0 {
        return m as u32;
    }

    let mut prev: Vec<u32> = (0..=n as u32).collect();
    let mut curr = vec![0u32; n + 1];

    for (i, &a_ch) in a_chars.iter().enumerate() {
        curr[0] = (i + 1) as u32;
        for (j, &b_ch) in b_chars.iter().enumerate() {
            let cost = if a_ch == b_ch { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Whether `candidate` is a fuzzy (distance ≤ 1) match for `key`.
/// Both arguments must already be normalized.
pub fn is_fuzzy_match(key: &str, candidate: &str) -> bool {
    let key_len = key.chars().count();
    let candidate_len = candidate.chars().count();
    if key_len < MIN_FUZZY_LEN || candidate_len < MIN_FUZZY_LEN {
        return false;
    }
    if key_len.abs_diff(candidate_len) > MAX_FUZZY_DISTANCE as usize {
        return false;
    }
    edit_distance(key, candidate) <= MAX_FUZZY_DISTANCE
}

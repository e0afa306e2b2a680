/// Characters beyond letters, digits and whitespace that lab reports need:
/// range dashes, comparison signs, exponents and abnormal-value markers.
fn is_lab_symbol(c: char) -> bool {
    matches!(
        c,
        '.' | ','
            | ';'
            | ':'
            | '-'
            | '/'
            | '('
            | ')'
            | '['
            | ']'
            | '+'
            | '='
            | '%'
            | '#'
            | '\''
            | '"'
            | '!'
            | '?'
            | '<'
            | '>'
            | '*'
            | '^'
            | '_'
            | '°'
            | 'µ'
            | '×'
            | '·'
            | '«'
            | '»'
            | '\u{2013}' // en dash
            | '\u{2014}' // em dash
            | '\u{2212}' // minus sign
            | '\u{2264}' // ≤
            | '\u{2265}' // ≥
            | '\u{2191}' // ↑
            | '\u{2193}' // ↓
            | '\u{2019}'
            | '\u{2018}'
            | '\u{201C}'
            | '\u{201D}'
    ) || superscript(c)
}

fn superscript(c: char) -> bool {
    matches!(c, '⁰' | '¹' | '²' | '³' | '⁴' | '⁵' | '⁶' | '⁷' | '⁸' | '⁹' | '⁻')
}

/// Sanitize extracted text before tokenization.
/// Strips control characters, trims lines and drops blank ones.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || is_lab_symbol(*c))
        .map(|c| if c.is_whitespace() && c != '\n' { ' ' } else { c })
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_characters() {
        let raw = "Глюкоза\x00 6.8\x01\x02 ммоль/л";
        let clean = sanitize_extracted_text(raw);
        assert!(!clean.contains('\x00'));
        assert!(!clean.contains('\x01'));
        assert_eq!(clean, "Глюкоза 6.8 ммоль/л");
    }

    #[test]
    fn tabs_become_plain_whitespace() {
        let clean = sanitize_extracted_text("ALT\t28\tU/L");
        assert_eq!(clean.split_whitespace().count(), 3);
    }

    #[test]
    fn preserves_lab_notation() {
        let raw = "Эритроциты 4.8 ×10¹²/л 4.0–5.5 ↑";
        assert_eq!(sanitize_extracted_text(raw), raw);
        let raw = "TSH: 2,1 µUI/mL (≤ 4.0)";
        assert_eq!(sanitize_extracted_text(raw), raw);
    }

    #[test]
    fn collapses_blank_lines() {
        let raw = "Line one\n\n\n\nLine two\n\n\nLine three";
        assert_eq!(sanitize_extracted_text(raw), "Line one\nLine two\nLine three");
    }

    #[test]
    fn only_control_chars_returns_empty() {
        assert_eq!(sanitize_extracted_text("\x00\x01\x02"), "");
        assert_eq!(sanitize_extracted_text(""), "");
    }

    #[test]
    fn preserves_french_characters() {
        let raw = "Hémoglobine: 14,2 g/dL «contrôle»";
        assert_eq!(sanitize_extracted_text(raw), raw);
    }
}

//! Escaping for Telegram's legacy Markdown parse mode.
//!
//! Outside an entity, `_`, `*`, `` ` `` and `[` are escaped with a
//! backslash. Inside an entity nothing can be escaped, so a literal marker
//! character closes the entity, is emitted escaped, and the entity reopens.

const SPECIAL: [char; 4] = ['_', '*', '`', '['];

/// Escape text that sits outside any entity.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `text` in bold.
pub fn bold(text: &str) -> String {
    wrap(text, '*')
}

/// `text` as inline code.
pub fn code(text: &str) -> String {
    wrap(text, '`')
}

fn wrap(text: &str, marker: char) -> String {
    if text.is_empty() {
        return format!("{marker}{marker}");
    }

    let mut out = String::with_capacity(text.len() + 2);
    for (i, segment) in text.split(marker).enumerate() {
        if i > 0 {
            out.push('\\');
            out.push(marker);
        }
        if !segment.is_empty() {
            out.push(marker);
            out.push_str(segment);
            out.push(marker);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_metacharacters_outside_entities() {
        assert_eq!(escape("q1_report"), "q1\\_report");
        assert_eq!(escape("2*3 [x] `y`"), "2\\*3 \\[x] \\`y\\`");
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn entity_content_keeps_other_markers() {
        assert_eq!(bold("q1_report"), "*q1_report*");
        assert_eq!(code("a_b*c"), "`a_b*c`");
    }

    #[test]
    fn own_marker_splits_the_entity() {
        assert_eq!(bold("a*b"), "*a*\\**b*");
        assert_eq!(code("`x"), "\\``x`");
        assert_eq!(code("x`"), "`x`\\`");
    }

    #[test]
    fn empty_text_keeps_the_markers() {
        assert_eq!(code(""), "``");
    }
}

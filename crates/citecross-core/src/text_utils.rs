/// Expand typographic ligatures (ﬁ → fi, ﬂ → fl, etc.) left in by PDF
/// text extraction, so that names typeset with them still match plain text.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Collapse every whitespace run (newlines included) into a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters. When cut, the kept text ends
/// in `...`, counted within `max_chars`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().nth(max_chars).is_none() {
        return text.to_string();
    }
    if max_chars < 3 {
        return text.chars().take(max_chars).collect();
    }
    let idx = text
        .char_indices()
        .nth(max_chars - 3)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{}...", text[..idx].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ligatures() {
        assert_eq!(expand_ligatures("A\u{FB01}fe"), "Afife");
        assert_eq!(expand_ligatures("e\u{FB00}ect"), "effect");
    }

    #[test]
    fn collapse() {
        assert_eq!(collapse_whitespace("  SILVA,\n J.\t\tA. "), "SILVA, J. A.");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("ação", 10), "ação");
        assert_eq!(truncate_chars("ação", 4), "ação");
        assert_eq!(truncate_chars("citações bibliográficas", 11), "citações...");
        assert_eq!(truncate_chars("ab cd e", 5), "ab...");
        assert_eq!(truncate_chars("abcdef", 2), "ab");
    }

    #[test]
    fn truncated_text_fits_the_limit() {
        let long = "é".repeat(50);
        for max in [3, 4, 10, 49] {
            let cut = truncate_chars(&long, max);
            assert_eq!(cut.chars().count(), max);
            assert!(cut.ends_with("..."));
        }
    }
}

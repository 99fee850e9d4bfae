//! Shared utility functions used across the codebase.

/// Return the longest prefix of `s` holding at most `max_chars` characters,
/// plus whether anything was cut off.
///
/// The prefix always ends on a UTF-8 character boundary.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

/// Remove Markdown code-fence markup from a model response.
///
/// Models asked for strict JSON still occasionally wrap the payload in
/// triple-backtick fences (often tagged `json`); strip them anywhere in
/// the text before parsing.
pub fn strip_code_fences(s: &str) -> String {
    s.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_short_input_untouched() {
        let (prefix, truncated) = truncate_chars("hello", 10);
        assert_eq!(prefix, "hello");
        assert!(!truncated);
    }

    #[test]
    fn truncate_chars_exact_length_untouched() {
        let (prefix, truncated) = truncate_chars("hello", 5);
        assert_eq!(prefix, "hello");
        assert!(!truncated);
    }

    #[test]
    fn truncate_chars_cuts_prefix() {
        let (prefix, truncated) = truncate_chars("hello world", 5);
        assert_eq!(prefix, "hello");
        assert!(truncated);
    }

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        let (prefix, truncated) = truncate_chars("日本語テキスト", 3);
        assert_eq!(prefix, "日本語");
        assert!(truncated);
    }

    #[test]
    fn strip_code_fences_removes_json_fence() {
        let raw = "```json\n{\"title\": \"x\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"title\": \"x\"}");
    }

    #[test]
    fn strip_code_fences_removes_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strip_code_fences_leaves_plain_json_alone() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }
}

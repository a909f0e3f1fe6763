//! Consolidation of raw log messages into error families.
//!
//! A message first has its high-cardinality parts (GUIDs, long IDs, long
//! numbers) replaced with placeholders, then the ordered [`FAMILY_RULES`] are
//! tried. The first rule with a trigger present names the family; otherwise
//! the placeholder-substituted text itself (capped at [`MAX_FAMILY_CHARS`])
//! is the family.

use std::sync::LazyLock;

use regex::Regex;

/// Longest fallback family label before it is cut and suffixed with `…`.
pub const MAX_FAMILY_CHARS: usize = 140;

/// Suffix appended to truncated fallback labels.
pub const ELLIPSIS: char = '…';

/// A named family and the substrings that identify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyRule {
    /// Any one of these substrings selects the rule.
    pub triggers: &'static [&'static str],
    /// Fixed family label returned on a match.
    pub label: &'static str,
}

impl FamilyRule {
    pub fn matches(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| text.contains(t))
    }
}

/// Known FileNet CPE signatures. Evaluated in order, first match wins.
pub static FAMILY_RULES: &[FamilyRule] = &[
    FamilyRule {
        triggers: &["[WSIAuthenticatorImpl] login exception", "WSIAuthenticatorImpl"],
        label: "WSIAuthenticatorImpl login exception (authentication failures)",
    },
    FamilyRule {
        triggers: &["MethodName: checkNameCollision", "E_NOT_UNIQUE", "FNRCE0043E"],
        label: "checkNameCollision / FNRCE0043E (E_NOT_UNIQUE) – Name already exists",
    },
    FamilyRule {
        triggers: &["MethodName: getContent"],
        label: "getContent failures (content retrieval)",
    },
    FamilyRule {
        triggers: &["FNRCE0066E", "E_UNEXPECTED_EXCEPTION"],
        label: "FNRCE0066E (E_UNEXPECTED_EXCEPTION) – unexpected error",
    },
    FamilyRule {
        triggers: &["TTLStreamReaper"],
        label: "TTLStreamReaper scheduling issue",
    },
];

/// Placeholder substitutions, applied in order.
static PLACEHOLDERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(
                r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
            )
            .expect("regex is valid"),
            "{GUID}",
        ),
        (Regex::new(r"\b[A-Z0-9]{8,}\b").expect("regex is valid"), "{ID}"),
        (Regex::new(r"\b\d{6,}\b").expect("regex is valid"), "{NUM}"),
    ]
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("regex is valid"));

/// Replace identifiers with placeholders and collapse whitespace.
///
/// ```
/// use cpelog_core::normalizer::substitute_placeholders;
///
/// assert_eq!(
///     substitute_placeholders("doc  ABCDEF1234 size 1234567"),
///     "doc {ID} size {NUM}"
/// );
/// ```
pub fn substitute_placeholders(message: &str) -> String {
    let mut text = message.to_string();
    for (re, placeholder) in PLACEHOLDERS.iter() {
        text = re.replace_all(&text, *placeholder).into_owned();
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// First rule in [`FAMILY_RULES`] that matches already-substituted text.
pub fn match_rule(text: &str) -> Option<&'static FamilyRule> {
    FAMILY_RULES.iter().find(|rule| rule.matches(text))
}

/// Map a raw message to its family label.
///
/// ```
/// use cpelog_core::normalizer::normalize;
///
/// assert_eq!(
///     normalize("FNRCE0066E: E_UNEXPECTED_EXCEPTION while saving"),
///     "FNRCE0066E (E_UNEXPECTED_EXCEPTION) – unexpected error"
/// );
/// assert_eq!(normalize("  disk   full  "), "disk full");
/// ```
pub fn normalize(message: &str) -> String {
    let text = substitute_placeholders(message);
    if let Some(rule) = match_rule(&text) {
        return rule.label.to_string();
    }
    truncate_label(text)
}

fn truncate_label(text: String) -> String {
    if text.chars().count() <= MAX_FAMILY_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_FAMILY_CHARS).collect();
    cut.push(ELLIPSIS);
    cut
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── placeholders ──────────────────────────────────────────────────────────

    #[test]
    fn test_guid_placeholder() {
        assert_eq!(
            substitute_placeholders("object 0a1b2c3d-1111-2222-3333-444455556666 missing"),
            "object {GUID} missing"
        );
    }

    #[test]
    fn test_guid_is_case_insensitive() {
        assert_eq!(
            substitute_placeholders("{ABCDEF12-ABCD-ABCD-ABCD-ABCDEF123456}"),
            "{{GUID}}"
        );
    }

    #[test]
    fn test_uppercase_id_placeholder() {
        assert_eq!(substitute_placeholders("token XK82JQ9ZP1 rejected"), "token {ID} rejected");
        // Seven characters is too short, lowercase is not an ID.
        assert_eq!(substitute_placeholders("ABCDEFG abcdefgh"), "ABCDEFG abcdefgh");
    }

    #[test]
    fn test_long_digit_runs() {
        // Six or seven digits become {NUM}; eight or more already match {ID}.
        assert_eq!(substitute_placeholders("took 123456 ms"), "took {NUM} ms");
        assert_eq!(substitute_placeholders("row 12345678"), "row {ID}");
        assert_eq!(substitute_placeholders("port 12345"), "port 12345");
    }

    #[test]
    fn test_digits_inside_words_are_kept() {
        assert_eq!(substitute_placeholders("abc1234567"), "abc1234567");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(substitute_placeholders("\ta \n b   c  "), "a b c");
    }

    // ── rules ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_wsi_authenticator_rule() {
        assert_eq!(
            normalize("User abc12345-1111-2222-3333-444455556666 login exception WSIAuthenticatorImpl"),
            "WSIAuthenticatorImpl login exception (authentication failures)"
        );
    }

    #[test]
    fn test_name_collision_rule_triggers() {
        let label = "checkNameCollision / FNRCE0043E (E_NOT_UNIQUE) – Name already exists";
        assert_eq!(normalize("MethodName: checkNameCollision failed"), label);
        assert_eq!(normalize("code E_NOT_UNIQUE"), label);
        assert_eq!(normalize("error_FNRCE0043E: duplicate"), label);
    }

    #[test]
    fn test_standalone_error_code_becomes_id_before_rules() {
        // A bare code is an uppercase token of ten characters, so the {ID}
        // placeholder consumes it before any rule sees it.
        assert_eq!(normalize("FNRCE0043E: duplicate"), "{ID}: duplicate");
    }

    #[test]
    fn test_get_content_rule() {
        assert_eq!(
            normalize("ClassName: Foo MethodName: getContent id=42"),
            "getContent failures (content retrieval)"
        );
    }

    #[test]
    fn test_ttl_stream_reaper_rule() {
        assert_eq!(
            normalize("TTLStreamReaper task delayed by 5 seconds"),
            "TTLStreamReaper scheduling issue"
        );
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // Both the authenticator and the unexpected-error triggers are present.
        assert_eq!(
            normalize("WSIAuthenticatorImpl E_UNEXPECTED_EXCEPTION"),
            "WSIAuthenticatorImpl login exception (authentication failures)"
        );
        // Name collision precedes unexpected error.
        assert_eq!(
            normalize("E_UNEXPECTED_EXCEPTION caused by E_NOT_UNIQUE"),
            "checkNameCollision / FNRCE0043E (E_NOT_UNIQUE) – Name already exists"
        );
    }

    #[test]
    fn test_rule_list_order_is_stable() {
        let labels: Vec<&str> = FAMILY_RULES.iter().map(|r| r.label).collect();
        assert_eq!(labels.len(), 5);
        assert!(labels[0].starts_with("WSIAuthenticatorImpl"));
        assert!(labels[1].starts_with("checkNameCollision"));
        assert!(labels[2].starts_with("getContent"));
        assert!(labels[3].starts_with("FNRCE0066E"));
        assert!(labels[4].starts_with("TTLStreamReaper"));
    }

    #[test]
    fn test_match_rule_none_for_unknown_text() {
        assert!(match_rule("completely unrelated").is_none());
    }

    // ── fallback ──────────────────────────────────────────────────────────────

    #[test]
    fn test_unmatched_messages_share_family_after_substitution() {
        let a = normalize("Lock timeout for 0a1b2c3d-1111-2222-3333-444455556666 after 1234567 ms");
        let b = normalize("Lock timeout for ffffffff-aaaa-bbbb-cccc-dddddddddddd after 7654321 ms");
        assert_eq!(a, b);
        assert_eq!(a, "Lock timeout for {GUID} after {NUM} ms");
    }

    #[test]
    fn test_long_message_is_truncated() {
        let message = "Some long unmatched message ".repeat(10);
        let family = normalize(&message);
        assert_eq!(family.chars().count(), MAX_FAMILY_CHARS + 1);
        assert!(family.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let message = "Some long unmatched message ".repeat(10);
        let once = normalize(&message);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_exactly_max_chars_is_not_truncated() {
        let message = "x".repeat(MAX_FAMILY_CHARS);
        assert_eq!(normalize(&message), message);
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let message = "ä".repeat(MAX_FAMILY_CHARS + 5);
        let family = normalize(&message);
        assert_eq!(family.chars().count(), MAX_FAMILY_CHARS + 1);
    }
}

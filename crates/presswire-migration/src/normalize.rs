//! Content validation and markup cleaning.
//!
//! Validation is policy-driven: strict mode migrates published records with
//! substantial content, permissive mode also admits draft-like records and
//! short bodies. Cleaning is a bounded regex sanitizer, not an HTML parser;
//! malformed or nested markup can leave stray characters behind, and that is
//! accepted behavior.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::SourceArticle;

// ── Policy ────────────────────────────────────────────────────────────────────

/// Eligibility policy for migrating a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Published records only, with substantial content.
    #[default]
    Strict,
    /// Also admits draft-like records, records without a status code, and
    /// much shorter bodies.
    Permissive,
}

impl ValidationPolicy {
    pub fn min_content_len(&self) -> usize {
        match self {
            ValidationPolicy::Strict => 50,
            ValidationPolicy::Permissive => 5,
        }
    }

    pub fn max_title_len(&self) -> usize {
        match self {
            ValidationPolicy::Strict => 200,
            ValidationPolicy::Permissive => 500,
        }
    }

    pub fn accepts_status(&self, status: Option<i32>) -> bool {
        match self {
            ValidationPolicy::Strict => status == Some(1),
            ValidationPolicy::Permissive => matches!(status, Some(0) | Some(1) | None),
        }
    }

    /// Status codes for source-side query filters.
    pub fn accepted_status_codes(&self) -> &'static [i32] {
        match self {
            ValidationPolicy::Strict => &[1],
            ValidationPolicy::Permissive => &[0, 1],
        }
    }

    /// Whether a missing status code passes the policy (drives the
    /// source-side filter alongside `accepted_status_codes`).
    pub fn accepts_missing_status(&self) -> bool {
        matches!(self, ValidationPolicy::Permissive)
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// Outcome of validating a source record.
#[derive(Debug, Clone)]
pub struct Validation {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Cleaned content derived from one source record. Never persisted on its
/// own — the transformer folds it into the target representations.
#[derive(Debug, Clone)]
pub struct NormalizedContent {
    pub content: String,
    pub summary: String,
    pub validation: Validation,
}

type BodyExtractor = fn(&SourceArticle) -> Option<&str>;

/// Ordered body candidates: the rich-text field first, then the plain
/// alternates, then summary and SEO description. First non-empty wins.
pub(crate) const BODY_CANDIDATES: &[(&str, BodyExtractor)] = &[
    ("content", |a| a.content.as_deref()),
    ("body", |a| a.body.as_deref()),
    ("text", |a| a.text.as_deref()),
    ("summary", |a| a.summary.as_deref()),
    ("seo_description", |a| a.seo_description.as_deref()),
];

/// Resolve the raw body from the first non-empty candidate field.
pub fn resolve_body(article: &SourceArticle) -> Option<&str> {
    BODY_CANDIDATES
        .iter()
        .find_map(|(_, extract)| extract(article).map(str::trim).filter(|s| !s.is_empty()))
}

pub fn validate(article: &SourceArticle, policy: ValidationPolicy) -> Validation {
    let mut issues = Vec::new();

    let title = article.title.trim();
    if title.is_empty() {
        issues.push("Missing or empty title".to_string());
    } else if title.chars().count() > policy.max_title_len() {
        issues.push(format!(
            "Title longer than {} characters",
            policy.max_title_len()
        ));
    }

    match resolve_body(article) {
        None => issues.push("Missing or empty body text".to_string()),
        Some(raw) => {
            let cleaned = clean_markup(raw);
            if cleaned.chars().count() < policy.min_content_len() {
                issues.push(format!(
                    "Content shorter than {} characters",
                    policy.min_content_len()
                ));
            }
        }
    }

    if !policy.accepts_status(article.status) {
        let status = article
            .status
            .map_or_else(|| "absent".to_string(), |s| s.to_string());
        issues.push(format!("Status {status} not eligible for migration"));
    }

    Validation {
        is_valid: issues.is_empty(),
        issues,
    }
}

/// Validate and clean in one pass.
pub fn normalize(article: &SourceArticle, policy: ValidationPolicy) -> NormalizedContent {
    let validation = validate(article, policy);
    let content = resolve_body(article).map(clean_markup).unwrap_or_default();
    let summary = derive_summary(article, &content);
    NormalizedContent {
        content,
        summary,
        validation,
    }
}

// ── Cleaning ──────────────────────────────────────────────────────────────────

lazy_static! {
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    static ref STYLE_RE: Regex = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Strip markup from free text: drop script/style blocks, strip remaining
/// tags, collapse whitespace runs, trim. Idempotent.
pub fn clean_markup(text: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(text, " ");
    let without_styles = STYLE_RE.replace_all(&without_scripts, " ");
    let without_tags = TAG_RE.replace_all(&without_styles, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

// ── Summary derivation ────────────────────────────────────────────────────────

pub const SUMMARY_MAX_CHARS: usize = 200;
pub const SUMMARY_ELLIPSIS: &str = "...";

/// Pass the explicit summary (or SEO description) through, cleaned; derive
/// one from the cleaned body otherwise. Either way the result is capped at
/// [`SUMMARY_MAX_CHARS`] with a truncation marker.
pub fn derive_summary(article: &SourceArticle, cleaned_body: &str) -> String {
    let explicit = article
        .summary
        .as_deref()
        .or(article.seo_description.as_deref())
        .map(clean_markup)
        .filter(|s| !s.is_empty());

    let base = explicit.unwrap_or_else(|| cleaned_body.to_string());
    truncate_with_marker(&base, SUMMARY_MAX_CHARS)
}

fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}{SUMMARY_ELLIPSIS}")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn article_with_content(content: &str) -> SourceArticle {
        SourceArticle {
            id: "64b2f0c8a1d2e3f4a5b6c7d8".to_string(),
            title: "A perfectly reasonable headline".to_string(),
            content: Some(content.to_string()),
            status: Some(1),
            ..Default::default()
        }
    }

    #[test]
    fn clean_strips_tags_and_collapses_whitespace() {
        let html = "<p>Hello   <b>world</b></p>\n\n<div>again</div>";
        assert_eq!(clean_markup(html), "Hello world again");
    }

    #[test]
    fn clean_drops_script_and_style_blocks() {
        let html = "before<script type=\"text/javascript\">var x = 1;\nalert(x);</script>\
                    <style>.a { color: red; }</style>after";
        assert_eq!(clean_markup(html), "before after");
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = [
            "<p>Hello <b>world</b></p>",
            "a <1 <b> 2> c",
            "plain text with  spaces",
            "stray < bracket and > bracket",
        ];
        for input in inputs {
            let once = clean_markup(input);
            assert_eq!(clean_markup(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn empty_title_is_invalid_regardless_of_other_fields() {
        let mut article = article_with_content(&"solid body text ".repeat(10));
        article.title = "   ".to_string();
        let validation = validate(&article, ValidationPolicy::Strict);
        assert!(!validation.is_valid);
        assert!(validation
            .issues
            .iter()
            .any(|issue| issue == "Missing or empty title"));
    }

    #[test]
    fn body_resolution_walks_candidates_in_order() {
        let article = SourceArticle {
            title: "t".to_string(),
            content: Some("  ".to_string()), // empty after trim
            body: None,
            text: Some("from the text field".to_string()),
            summary: Some("from the summary".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_body(&article), Some("from the text field"));
    }

    #[test]
    fn short_content_fails_strict_but_passes_permissive() {
        let mut article = article_with_content("tiny body");
        let strict = validate(&article, ValidationPolicy::Strict);
        assert!(!strict.is_valid);

        article.status = Some(0); // draft-like is fine in permissive mode
        let permissive = validate(&article, ValidationPolicy::Permissive);
        assert!(permissive.is_valid, "issues: {:?}", permissive.issues);
    }

    #[test]
    fn status_eligibility_follows_policy() {
        assert!(ValidationPolicy::Strict.accepts_status(Some(1)));
        assert!(!ValidationPolicy::Strict.accepts_status(Some(0)));
        assert!(!ValidationPolicy::Strict.accepts_status(None));
        assert!(ValidationPolicy::Permissive.accepts_status(Some(0)));
        assert!(ValidationPolicy::Permissive.accepts_status(None));
    }

    #[test]
    fn summary_derived_from_long_body_is_truncated_with_marker() {
        let body: String = "x".repeat(250);
        let article = SourceArticle {
            title: "t".to_string(),
            content: Some(body.clone()),
            ..Default::default()
        };
        let summary = derive_summary(&article, &body);
        assert_eq!(summary.chars().count(), 200 + SUMMARY_ELLIPSIS.len());
        assert_eq!(&summary[..200], &body[..200]);
        assert!(summary.ends_with(SUMMARY_ELLIPSIS));
    }

    #[test]
    fn summary_within_cap_gets_no_marker() {
        let body = "short cleaned body".to_string();
        let article = SourceArticle {
            title: "t".to_string(),
            content: Some(body.clone()),
            ..Default::default()
        };
        assert_eq!(derive_summary(&article, &body), body);
    }

    #[test]
    fn explicit_summary_passes_through_cleaned() {
        let article = SourceArticle {
            title: "t".to_string(),
            content: Some("ignored long body text".repeat(20)),
            summary: Some("<p>An <b>explicit</b> summary</p>".to_string()),
            ..Default::default()
        };
        assert_eq!(
            derive_summary(&article, "whatever"),
            "An explicit summary"
        );
    }
}

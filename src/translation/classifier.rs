/*!
 * Text classification.
 *
 * Decides whether a text fragment is sent for translation or passes through
 * verbatim, and splits translatable fragments around embedded template
 * expressions and URLs. Classification is pure: the same input always yields
 * the same verdict.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// A `{{...}}` expression, a `{{{...}}}` triple-stash, or a block open/close tag
pub(crate) static EXPRESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\}").expect("valid expression regex"));

/// A fragment that is exactly one expression, ignoring surrounding whitespace
static WHOLE_EXPRESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\})$").expect("valid whole expression regex")
});

/// Absolute http(s) URL; stops at whitespace, quotes, angle and curly brackets
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"'{}]+"#).expect("valid url regex"));

/// Everything that must survive translation verbatim inside a text fragment
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\}|https?://[^\s<>"'{}]+"#)
        .expect("valid placeholder regex")
});

/// No-break-space spellings that carry no translatable content
const NO_BREAK_SPACES: &[&str] = &["&nbsp;", "&#160;", "&#xa0;", "&#xA0;", "\u{a0}"];

/// Why a fragment passes through untranslated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only
    Blank,
    /// Only no-break-space entities and whitespace
    NoBreakSpace,
    /// Exactly one template expression or block tag
    WholeExpression,
    /// Several expressions with nothing but whitespace between them,
    /// e.g. an inline block directly followed by its closing tag
    ExpressionsOnly,
    /// Exactly one URL
    Url,
    /// Punctuation and symbols only
    NoAlphanumeric,
}

/// One piece of a translatable fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubToken {
    /// Plain text, a translation candidate
    Literal(String),
    /// Expression or URL, copied verbatim
    Placeholder(String),
}

impl SubToken {
    /// Original text of the token
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Placeholder(text) => text,
        }
    }

    /// True for literals that are not themselves skippable
    pub fn needs_translation(&self) -> bool {
        match self {
            Self::Literal(text) => skip_reason(text).is_none(),
            Self::Placeholder(_) => false,
        }
    }
}

/// Verdict for a text fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Pass through unchanged
    Skippable(SkipReason),
    /// Translate the literal sub-tokens
    Translatable(Vec<SubToken>),
}

impl Classification {
    /// Whether the fragment passes through unchanged
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Skippable(_))
    }
}

/// Classify a text fragment
pub fn classify(text: &str) -> Classification {
    match skip_reason(text) {
        Some(reason) => Classification::Skippable(reason),
        None => Classification::Translatable(split_sub_tokens(text)),
    }
}

/// Return the reason `text` must not be translated, if any
pub fn skip_reason(text: &str) -> Option<SkipReason> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(SkipReason::Blank);
    }

    let without_nbsp = strip_no_break_spaces(trimmed);
    if without_nbsp.trim().is_empty() {
        return Some(SkipReason::NoBreakSpace);
    }

    if WHOLE_EXPRESSION_RE.is_match(trimmed) {
        return Some(SkipReason::WholeExpression);
    }

    let without_expressions = EXPRESSION_RE.replace_all(&without_nbsp, "");
    if without_expressions.trim().is_empty() {
        return Some(SkipReason::ExpressionsOnly);
    }

    if let Some(m) = URL_RE.find(trimmed) {
        if m.start() == 0 && m.end() == trimmed.len() {
            return Some(SkipReason::Url);
        }
    }

    let remainder = URL_RE.replace_all(&without_expressions, "");
    if !remainder.chars().any(char::is_alphanumeric) {
        return Some(SkipReason::NoAlphanumeric);
    }

    None
}

/// True when `text` holds only template expressions and whitespace, with at least one expression
pub fn is_expression_only(text: &str) -> bool {
    EXPRESSION_RE.is_match(text) && EXPRESSION_RE.replace_all(text, "").trim().is_empty()
}

/// Split `text` into alternating literals and placeholders, preserving every byte
pub fn split_sub_tokens(text: &str) -> Vec<SubToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for m in PLACEHOLDER_RE.find_iter(text) {
        if m.start() > cursor {
            tokens.push(SubToken::Literal(text[cursor..m.start()].to_string()));
        }
        tokens.push(SubToken::Placeholder(m.as_str().to_string()));
        cursor = m.end();
    }
    if cursor < text.len() {
        tokens.push(SubToken::Literal(text[cursor..].to_string()));
    }

    tokens
}

/// Concatenate sub-tokens in order
pub fn join_sub_tokens(tokens: &[SubToken]) -> String {
    tokens.iter().map(SubToken::as_str).collect()
}

fn strip_no_break_spaces(text: &str) -> String {
    NO_BREAK_SPACES
        .iter()
        .fold(text.to_string(), |acc, entity| acc.replace(entity, " "))
}

/*!
 * Document segmentation.
 *
 * Splits a template into an ordered sequence of segments: markup tags,
 * raw `<style>`/`<script>` blocks, comments, and the text between them.
 * Raw blocks and comments are carved out before tags are matched, so their
 * contents are never split or translated. Template expressions stay inside
 * the text they appear in; the classifier deals with them later.
 *
 * The segments always alternate text, non-text, text, ..., text, starting
 * and ending with a (possibly empty) text segment, and concatenating their
 * raw contents yields the input exactly.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::PipelineError;
use crate::translation::classifier::{EXPRESSION_RE, is_expression_only};

/// Regions that cut the document, tried left to right in this order at each position
static REGION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)(?P<raw><style\b[^>]*>.*?</style\s*>|<script\b[^>]*>.*?</script\s*>)|(?P<comment><!--.*?-->|\{\{!--.*?--\}\})|(?P<expr>\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\})|(?P<tag><[a-z/!?](?:\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\}|[^>{]|\{)*>)"#,
    )
    .expect("valid region regex")
});

/// Opening of a raw block, used to detect unterminated ones
static RAW_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<(style|script)\b").expect("valid raw block regex"));

/// What a segment holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// A tag or an HTML/Handlebars comment
    Markup,
    /// A complete `<style>` or `<script>` element
    StyleBlock,
    /// Text made only of template expressions and whitespace
    TemplateExpression,
    /// Text that may contain translatable content
    Text,
}

/// One piece of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// What the segment holds
    pub kind: SegmentKind,
    /// Original content
    pub raw: String,
    /// Zero-based index in document order
    pub position: usize,
    /// Output content, filled in by the pipeline; non-text segments start out with their raw content
    pub translated: Option<String>,
}

impl Segment {
    /// Create a segment; only text segments start untranslated
    pub fn new(kind: SegmentKind, raw: impl Into<String>, position: usize) -> Self {
        let raw = raw.into();
        let translated = match kind {
            SegmentKind::Text => None,
            _ => Some(raw.clone()),
        };
        Self { kind, raw, position, translated }
    }

    /// Whether the segment is text that may need translation
    pub fn is_text(&self) -> bool {
        self.kind == SegmentKind::Text
    }
}

/// Split `document` into segments
///
/// # Errors
/// `MalformedInput` for an unterminated `<style>`/`<script>` block or a
/// `{{` without a closing `}}` in text.
pub fn segment(document: &str) -> Result<Vec<Segment>, PipelineError> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in REGION_RE.captures_iter(document) {
        if captures.name("expr").is_some() {
            continue;
        }

        let (kind, region) = if let Some(m) = captures.name("raw") {
            (SegmentKind::StyleBlock, m)
        } else if let Some(m) = captures.name("comment") {
            (SegmentKind::Markup, m)
        } else if let Some(m) = captures.name("tag") {
            if RAW_OPEN_RE.is_match(m.as_str()) {
                return Err(PipelineError::MalformedInput(format!(
                    "unterminated {} block at byte {}",
                    m.as_str().trim_end_matches('>'),
                    m.start()
                )));
            }
            (SegmentKind::Markup, m)
        } else {
            continue;
        };

        push_gap(&mut segments, document, cursor, region.start())?;
        segments.push(Segment::new(kind, region.as_str(), segments.len()));
        cursor = region.end();
    }
    push_gap(&mut segments, document, cursor, document.len())?;

    Ok(segments)
}

/// Push the text between two cutting regions, even when empty
fn push_gap(segments: &mut Vec<Segment>, document: &str, start: usize, end: usize) -> Result<(), PipelineError> {
    let gap = &document[start..end];

    // NUL keeps a removed expression from gluing neighbouring braces together
    if EXPRESSION_RE.replace_all(gap, "\u{0}").contains("{{") {
        return Err(PipelineError::MalformedInput(format!(
            "unterminated template expression in text starting at byte {}",
            start
        )));
    }

    let kind = if is_expression_only(gap) {
        SegmentKind::TemplateExpression
    } else {
        SegmentKind::Text
    };
    segments.push(Segment::new(kind, gap, segments.len()));
    Ok(())
}

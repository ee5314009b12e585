/*!
 * Tests for segmentation and classification of whole templates
 */

use hbs_translate::translation::classifier::{SkipReason, SubToken, join_sub_tokens, split_sub_tokens};
use hbs_translate::translation::{Classification, SegmentKind, classify, segment};

use crate::common;

/// Test that segmenting a realistic template loses nothing
#[test]
fn test_segment_withEmailTemplate_shouldReproduceInputExactly() {
    let segments = segment(common::EMAIL_TEMPLATE).unwrap();

    let rebuilt: String = segments.iter().map(|s| s.raw.as_str()).collect();
    assert_eq!(rebuilt, common::EMAIL_TEMPLATE);

    for (index, seg) in segments.iter().enumerate() {
        assert_eq!(seg.position, index);
    }
}

/// Test that text and non-text segments alternate
#[test]
fn test_segment_withEmailTemplate_shouldAlternateTextAndMarkup() {
    let segments = segment(common::EMAIL_TEMPLATE).unwrap();

    assert!(segments.len() % 2 == 1);
    for (index, seg) in segments.iter().enumerate() {
        let is_textual = matches!(seg.kind, SegmentKind::Text | SegmentKind::TemplateExpression);
        assert_eq!(is_textual, index % 2 == 0, "segment {} is {:?}", index, seg.kind);
    }
}

/// Test that style blocks and comments are single opaque segments
#[test]
fn test_segment_withStyleAndComment_shouldKeepThemWhole() {
    let segments = segment(common::EMAIL_TEMPLATE).unwrap();

    let style = segments
        .iter()
        .find(|s| s.kind == SegmentKind::StyleBlock)
        .unwrap();
    assert!(style.raw.starts_with("<style>"));
    assert!(style.raw.ends_with("</style>"));
    assert!(style.raw.contains("font-family: Arial;"));

    assert!(
        segments
            .iter()
            .any(|s| s.kind == SegmentKind::Markup && s.raw == "<!-- greeting -->")
    );
}

/// Test that attribute values stay inside their tag
#[test]
fn test_segment_withAttributes_shouldNotExposeAttributeText() {
    let segments = segment(common::EMAIL_TEMPLATE).unwrap();

    let img = segments.iter().find(|s| s.raw.starts_with("<img")).unwrap();
    assert_eq!(img.kind, SegmentKind::Markup);
    assert!(img.raw.contains("alt=\"Company logo\""));
    assert!(
        !segments
            .iter()
            .any(|s| s.kind == SegmentKind::Text && s.raw.contains("Company logo"))
    );
}

/// Test that block helpers are expression segments when they hold no text
#[test]
fn test_segment_withBlockHelpers_shouldMarkExpressionOnlyGaps() {
    let segments = segment("<div>{{#each items}}<p>{{this}}</p>{{/each}}</div>").unwrap();

    let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::Text,
            SegmentKind::Markup,
            SegmentKind::TemplateExpression,
            SegmentKind::Markup,
            SegmentKind::TemplateExpression,
            SegmentKind::Markup,
            SegmentKind::TemplateExpression,
            SegmentKind::Markup,
            SegmentKind::Text,
        ]
    );
}

/// Test the malformed inputs that are rejected
#[test]
fn test_segment_withMalformedInput_shouldFail() {
    let unterminated_expression = segment("<p>Hello {{name</p>").unwrap_err();
    assert_eq!(unterminated_expression.category(), "malformed_input");

    let unterminated_style = segment("<style>p { color: red; }").unwrap_err();
    assert_eq!(unterminated_style.category(), "malformed_input");
}

/// Test classification of the text kinds a template contains
#[test]
fn test_classify_withTemplateText_shouldSkipNonLinguisticContent() {
    let cases = [
        ("  \n ", SkipReason::Blank),
        ("&nbsp;", SkipReason::NoBreakSpace),
        ("{{user.name}}", SkipReason::WholeExpression),
        ("{{a}} {{{b}}}", SkipReason::ExpressionsOnly),
        ("https://example.com/track?id=1", SkipReason::Url),
        ("--- | ---", SkipReason::NoAlphanumeric),
    ];

    for (text, reason) in cases {
        assert_eq!(classify(text), Classification::Skippable(reason), "{:?}", text);
    }
}

#[test]
fn test_classify_withBlockHelperAndProse_shouldSeparateThem() {
    assert!(classify("{{#if x}}").is_skippable());
    assert!(classify("---").is_skippable());
    assert!(!classify("Hello world").is_skippable());
}

/// Test that expressions inside text become placeholders
#[test]
fn test_classify_withEmbeddedExpression_shouldProtectIt() {
    let Classification::Translatable(tokens) = classify("Hello {{user.firstName}}!") else {
        panic!("expected translatable text");
    };

    assert_eq!(
        tokens,
        vec![
            SubToken::Literal("Hello ".to_string()),
            SubToken::Placeholder("{{user.firstName}}".to_string()),
            SubToken::Literal("!".to_string()),
        ]
    );
    assert!(tokens[0].needs_translation());
    assert!(!tokens[1].needs_translation());
    assert!(!tokens[2].needs_translation());
}

#[test]
fn test_splitSubTokens_withUrlInText_shouldKeepEveryByte() {
    let text = "Track it at https://example.com/t/1 today.";
    let tokens = split_sub_tokens(text);

    assert!(tokens.contains(&SubToken::Placeholder("https://example.com/t/1".to_string())));
    assert_eq!(join_sub_tokens(&tokens), text);
}

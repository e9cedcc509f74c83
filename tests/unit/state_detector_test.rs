//! Unit tests for the State Detector rules and their last-match-wins precedence.

use rstest::rstest;
use serde_json::json;

use tabloop::services::state_detector::{truncate_chars, StateDetector, StateDetectorTrait};
use tabloop::types::settings::DetectorSettings;
use tabloop::types::snapshot::{ActivityKind, PageDocument, PageElement, TabSnapshot};

fn textarea(placeholder: Option<&str>, aria_label: Option<&str>, value: &str) -> PageElement {
    PageElement::Textarea {
        placeholder: placeholder.map(str::to_string),
        aria_label: aria_label.map(str::to_string),
        value: value.to_string(),
    }
}

fn editor(text: &str) -> PageElement {
    PageElement::Div {
        role: Some("textbox".to_string()),
        content_editable: true,
        inner_text: text.to_string(),
    }
}

fn video(current_time: f64, paused: bool) -> PageElement {
    PageElement::Video { current_time, paused }
}

fn doc(elements: Vec<PageElement>) -> PageDocument {
    PageDocument {
        elements,
        scroll_y: 0.0,
        inner_height: 800.0,
        body_text: String::new(),
    }
}

fn detect(doc: &PageDocument) -> TabSnapshot {
    StateDetector::default().detect(doc)
}

#[test]
fn test_idle_page_yields_empty_snapshot() {
    let state = detect(&doc(vec![]));
    assert!(state.is_empty());
    assert_eq!(serde_json::to_value(&state).unwrap(), json!({}));
}

#[test]
fn test_paused_video_at_45_seconds() {
    let state = detect(&doc(vec![video(45.0, true)]));
    assert_eq!(state.activity, ActivityKind::ResumeVideo);
    assert_eq!(state.video_time_seconds, Some(45));
    assert_eq!(state.draft, None);
    assert_eq!(state.article_text, None);
    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        json!({"action": "RESUME_VIDEO", "videoTime": 45})
    );
}

#[rstest]
#[case(video(45.7, true), Some(45))]
#[case(video(30.0, true), None)]
#[case(video(30.5, true), Some(30))]
#[case(video(120.0, false), None)]
fn test_video_threshold(#[case] element: PageElement, #[case] expected: Option<u64>) {
    let state = detect(&doc(vec![element]));
    assert_eq!(state.video_time_seconds, expected);
}

#[test]
fn test_only_first_video_is_inspected() {
    let state = detect(&doc(vec![video(10.0, true), video(300.0, true)]));
    assert!(state.is_empty());
}

#[rstest]
#[case(Some("Leave a comment"), None, true)]
#[case(None, Some("Comment body"), true)]
#[case(Some("Leave a Comment"), None, false)]
#[case(None, Some("comment body"), false)]
fn test_comment_field_selector_is_case_sensitive(
    #[case] placeholder: Option<&str>,
    #[case] aria_label: Option<&str>,
    #[case] is_comment: bool,
) {
    let state = detect(&doc(vec![textarea(placeholder, aria_label, "LGTM")]));
    if is_comment {
        assert_eq!(state.activity, ActivityKind::FinishPr);
        assert_eq!(state.draft.as_deref(), Some("LGTM"));
    } else {
        // "LGTM" is too short to count as a form draft
        assert!(state.is_empty());
    }
}

#[test]
fn test_whitespace_comment_is_not_a_draft() {
    let state = detect(&doc(vec![textarea(Some("Add a comment"), None, "   \n ")]));
    assert!(state.is_empty());
}

#[test]
fn test_rich_text_editor_is_email_draft() {
    let state = detect(&doc(vec![editor("Hi Sam, following up on")]));
    assert_eq!(state.activity, ActivityKind::SendEmail);
    assert_eq!(state.draft.as_deref(), Some("Hi Sam, following up on"));
}

#[test]
fn test_non_editable_textbox_is_ignored() {
    let state = detect(&doc(vec![PageElement::Div {
        role: Some("textbox".to_string()),
        content_editable: false,
        inner_text: "read only".to_string(),
    }]));
    assert!(state.is_empty());
}

#[test]
fn test_deep_scroll_is_article() {
    let mut page = doc(vec![]);
    page.scroll_y = 1500.7;
    page.body_text = "Long read".to_string();
    let state = detect(&page);
    assert_eq!(state.activity, ActivityKind::SummarizeArticle);
    assert_eq!(state.scroll_position, Some(1500));
    assert_eq!(state.article_text.as_deref(), Some("Long read"));
}

#[test]
fn test_scroll_at_threshold_is_not_article() {
    let mut page = doc(vec![]);
    page.scroll_y = 1200.0;
    assert!(detect(&page).is_empty());
}

#[test]
fn test_any_video_blocks_article_rule() {
    let mut page = doc(vec![video(5.0, false)]);
    page.scroll_y = 5000.0;
    assert!(detect(&page).is_empty());
}

#[test]
fn test_form_draft_needs_more_than_30_trimmed_chars() {
    let thirty = "a".repeat(30);
    let state = detect(&doc(vec![textarea(None, None, &format!("  {}  ", thirty))]));
    assert!(state.is_empty());

    let thirty_one = "a".repeat(31);
    let state = detect(&doc(vec![textarea(None, None, &thirty_one)]));
    assert_eq!(state.activity, ActivityKind::SaveForm);
    assert_eq!(state.draft.as_deref(), Some(thirty_one.as_str()));
}

#[test]
fn test_form_rule_overrides_comment_draft() {
    let long = "This cover letter explains why I am a great fit.";
    let state = detect(&doc(vec![
        textarea(Some("Leave a comment"), None, "nit: rename"),
        textarea(None, None, long),
    ]));
    assert_eq!(state.activity, ActivityKind::SaveForm);
    assert_eq!(state.draft.as_deref(), Some(long));
}

#[test]
fn test_video_overrides_email_but_keeps_draft() {
    let state = detect(&doc(vec![editor("Draft reply"), video(90.0, true)]));
    assert_eq!(state.activity, ActivityKind::ResumeVideo);
    assert_eq!(state.video_time_seconds, Some(90));
    assert_eq!(state.draft.as_deref(), Some("Draft reply"));
}

#[test]
fn test_detection_is_idempotent() {
    let mut page = doc(vec![editor("Hello"), textarea(Some("comment"), None, "wip")]);
    page.scroll_y = 4000.0;
    page.body_text = "Body".to_string();
    let detector = StateDetector::default();
    assert_eq!(detector.detect(&page), detector.detect(&page));
}

#[test]
fn test_custom_thresholds() {
    let detector = StateDetector::new(DetectorSettings {
        video_min_seconds: 5.0,
        ..DetectorSettings::default()
    });
    let state = detector.detect(&doc(vec![video(6.0, true)]));
    assert_eq!(state.video_time_seconds, Some(6));
}

// === Article truncation boundary ===

#[test]
fn test_article_exactly_at_limit_is_kept_whole() {
    let text = "x".repeat(10_000);
    let mut page = doc(vec![]);
    page.scroll_y = 2000.0;
    page.body_text = text.clone();
    let state = detect(&page);
    assert_eq!(state.article_text, Some(text));
}

#[test]
fn test_article_beyond_limit_is_truncated_to_limit() {
    let mut page = doc(vec![]);
    page.scroll_y = 2000.0;
    page.body_text = "y".repeat(10_001);
    let state = detect(&page);
    assert_eq!(state.article_text.map(|t| t.chars().count()), Some(10_000));
}

#[test]
fn test_truncate_counts_chars_not_bytes() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("héllo", 10), "héllo");
    assert_eq!(truncate_chars("", 3), "");
}

#[test]
fn test_page_document_wire_format() {
    let page: PageDocument = serde_json::from_value(json!({
        "elements": [
            {"tag": "textarea", "placeholder": "Leave a comment", "value": "wip"},
            {"tag": "video", "currentTime": 61.2, "paused": true}
        ],
        "scrollY": 0,
        "innerHeight": 900,
        "bodyText": ""
    }))
    .unwrap();
    let state = detect(&page);
    assert_eq!(state.activity, ActivityKind::ResumeVideo);
    assert_eq!(state.draft.as_deref(), Some("wip"));
}

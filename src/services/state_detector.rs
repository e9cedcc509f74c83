//! State Detector.
//!
//! Inspects a page document and produces a single `TabSnapshot`. The five
//! rules run in a fixed order and each one that fires overwrites the shared
//! result, so the *last* matching rule decides `activity` and `draft`. Fields
//! set by earlier rules (video time, scroll, article text) are kept.

use crate::types::settings::DetectorSettings;
use crate::types::snapshot::{ActivityKind, PageDocument, PageElement, TabSnapshot};

/// Trait defining page-state detection.
pub trait StateDetectorTrait {
    fn detect(&self, doc: &PageDocument) -> TabSnapshot;
}

type Rule = fn(&DetectorSettings, &PageDocument, &mut TabSnapshot);

/// Evaluation order. Do not reorder: later rules win.
const RULES: [Rule; 5] = [
    comment_draft_rule,
    rich_text_draft_rule,
    paused_video_rule,
    article_scroll_rule,
    form_draft_rule,
];

#[derive(Debug, Clone)]
pub struct StateDetector {
    settings: DetectorSettings,
}

impl StateDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self { settings }
    }
}

impl Default for StateDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}

impl StateDetectorTrait for StateDetector {
    fn detect(&self, doc: &PageDocument) -> TabSnapshot {
        let mut state = TabSnapshot::default();
        for rule in RULES {
            rule(&self.settings, doc, &mut state);
        }
        state
    }
}

/// `textarea[placeholder*="comment"], textarea[aria-label*="Comment"]`
fn is_comment_field(placeholder: &Option<String>, aria_label: &Option<String>) -> bool {
    placeholder.as_deref().is_some_and(|p| p.contains("comment"))
        || aria_label.as_deref().is_some_and(|l| l.contains("Comment"))
}

fn comment_draft_rule(_: &DetectorSettings, doc: &PageDocument, state: &mut TabSnapshot) {
    let field = doc.elements.iter().find_map(|el| match el {
        PageElement::Textarea { placeholder, aria_label, value }
            if is_comment_field(placeholder, aria_label) =>
        {
            Some(value)
        }
        _ => None,
    });

    if let Some(value) = field {
        if !value.trim().is_empty() {
            state.draft = Some(value.clone());
            state.activity = ActivityKind::FinishPr;
        }
    }
}

fn rich_text_draft_rule(_: &DetectorSettings, doc: &PageDocument, state: &mut TabSnapshot) {
    let region = doc.elements.iter().find_map(|el| match el {
        PageElement::Div { role: Some(role), content_editable: true, inner_text } if role == "textbox" => {
            Some(inner_text)
        }
        _ => None,
    });

    if let Some(text) = region {
        if !text.trim().is_empty() {
            state.draft = Some(text.clone());
            state.activity = ActivityKind::SendEmail;
        }
    }
}

fn first_video(doc: &PageDocument) -> Option<(f64, bool)> {
    doc.elements.iter().find_map(|el| match el {
        PageElement::Video { current_time, paused } => Some((*current_time, *paused)),
        _ => None,
    })
}

fn paused_video_rule(settings: &DetectorSettings, doc: &PageDocument, state: &mut TabSnapshot) {
    if let Some((current_time, paused)) = first_video(doc) {
        if current_time > settings.video_min_seconds && paused {
            state.video_time_seconds = Some(current_time.floor() as u64);
            state.activity = ActivityKind::ResumeVideo;
        }
    }
}

fn article_scroll_rule(settings: &DetectorSettings, doc: &PageDocument, state: &mut TabSnapshot) {
    let deep = doc.scroll_y > doc.inner_height * settings.scroll_viewport_factor;
    if deep && first_video(doc).is_none() {
        state.scroll_position = Some(doc.scroll_y.max(0.0).floor() as u64);
        state.article_text = Some(truncate_chars(&doc.body_text, settings.article_max_chars));
        state.activity = ActivityKind::SummarizeArticle;
    }
}

fn form_draft_rule(settings: &DetectorSettings, doc: &PageDocument, state: &mut TabSnapshot) {
    let field = doc.elements.iter().find_map(|el| match el {
        PageElement::Textarea { placeholder, aria_label, value }
            if !is_comment_field(placeholder, aria_label) =>
        {
            Some(value)
        }
        _ => None,
    });

    if let Some(value) = field {
        if value.trim().chars().count() > settings.form_min_chars {
            state.draft = Some(value.clone());
            state.activity = ActivityKind::SaveForm;
        }
    }
}

/// First `max` characters of `text`, or all of it when shorter.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

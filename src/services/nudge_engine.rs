//! Nudge Engine.
//!
//! Runs on explicit user request for one grouped tab:
//! Pending -> Transforming -> Presented -> Closed.
//! A failed transformation presents the original text instead; the tab is
//! closed after presentation either way. The nudge record is left in place.

use log::{debug, info, warn};

use crate::managers::kv_store::KeyValueStore;
use crate::managers::nudge_store::NudgeStore;
use crate::managers::snapshot_store::SnapshotStore;
use crate::managers::tab_manager::TabHost;
use crate::services::language_model::{
    LanguageModel, RewriteLength, RewriteOptions, RewriteTone, SummarizeOptions, SummaryFormat,
    SummaryLength,
};
use crate::types::errors::{ModelError, NudgeError};
use crate::types::nudge::{NudgeAction, NudgeOutcome, NudgeRecord, NudgeState};
use crate::types::snapshot::TabSnapshot;
use crate::types::tab::{TabId, TabInfo};

const DRAFT_REWRITE: RewriteOptions = RewriteOptions {
    tone: RewriteTone::Professional,
    length: RewriteLength::Same,
};

const ARTICLE_SUMMARY: SummarizeOptions = SummarizeOptions {
    length: SummaryLength::Short,
    format: SummaryFormat::Bullets,
};

/// Surfaces nudge text to the user. Returns once the user has seen it.
pub trait NudgePresenter {
    fn present(&mut self, tab: &TabInfo, action: NudgeAction, text: &str);
}

/// Presenter that writes the nudge to the log.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl NudgePresenter for LogPresenter {
    fn present(&mut self, tab: &TabInfo, action: NudgeAction, text: &str) {
        info!("Nudge {:?} for '{}': {}", action, tab.title, text);
    }
}

enum Transform<'t> {
    Rewrite(&'t str),
    Summarize(&'t str),
    PassThrough(String),
}

pub struct NudgeEngine<'a> {
    nudges: NudgeStore<'a>,
    snapshots: SnapshotStore<'a>,
}

impl<'a> NudgeEngine<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            nudges: NudgeStore::new(store),
            snapshots: SnapshotStore::new(store),
        }
    }

    /// Nudges whose tab is still open, in tab order.
    pub fn pending(&self, host: &dyn TabHost) -> Result<Vec<(TabInfo, NudgeRecord)>, NudgeError> {
        let records = self.nudges.all()?;
        Ok(host
            .query_tabs()
            .into_iter()
            .filter_map(|tab| records.get(&tab.id).cloned().map(|record| (tab, record)))
            .collect())
    }

    /// Runs the nudge for `tab_id` to completion. `model` may be absent, in
    /// which case every transformation falls back to the original text.
    pub async fn run_nudge(
        &self,
        tab_id: TabId,
        host: &mut dyn TabHost,
        model: Option<&dyn LanguageModel>,
        presenter: &mut dyn NudgePresenter,
    ) -> Result<NudgeOutcome, NudgeError> {
        let record = self
            .nudges
            .get(tab_id)?
            .ok_or(NudgeError::NoPendingNudge(tab_id))?;
        let tab = host
            .get_tab(tab_id)
            .map_err(|_| NudgeError::TabNotOpen(tab_id))?;

        let mut state = NudgeState::Pending;
        let saved = self
            .snapshots
            .get(tab_id)?
            .map(|s| s.state)
            .unwrap_or_default();

        state = advance(tab_id, state, NudgeState::Transforming);
        let (text, transformed, fallback_reason) =
            match transform_for(record.action, &saved) {
                Transform::PassThrough(text) => (text, false, None),
                Transform::Rewrite(original) => {
                    resolve(original, call_rewrite(model, original).await, tab_id)
                }
                Transform::Summarize(original) => {
                    resolve(original, call_summarize(model, original).await, tab_id)
                }
            };

        presenter.present(&tab, record.action, &text);
        state = advance(tab_id, state, NudgeState::Presented);

        let failures = host.remove_tabs(&[tab_id]);
        if let Some((_, e)) = failures.into_iter().next() {
            warn!("Nudge could not close tab {}: {}", tab_id, e);
            return Err(NudgeError::CloseFailed(tab_id, e.to_string()));
        }
        state = advance(tab_id, state, NudgeState::Closed);

        Ok(NudgeOutcome {
            tab_id,
            action: record.action,
            text,
            transformed,
            fallback_reason,
            state,
        })
    }
}

fn advance(tab_id: TabId, from: NudgeState, to: NudgeState) -> NudgeState {
    debug!("Nudge for tab {}: {:?} -> {:?}", tab_id, from, to);
    to
}

/// Picks the transformation for a nudge kind and the text it applies to.
fn transform_for(action: NudgeAction, saved: &TabSnapshot) -> Transform<'_> {
    match action {
        NudgeAction::FinishPr | NudgeAction::SendEmail => match saved.draft.as_deref() {
            Some(draft) => Transform::Rewrite(draft),
            None => Transform::PassThrough(String::new()),
        },
        NudgeAction::SummarizeArticle | NudgeAction::Review => {
            match saved.article_text.as_deref() {
                Some(article) => Transform::Summarize(article),
                None => Transform::PassThrough(saved.draft.clone().unwrap_or_default()),
            }
        }
        NudgeAction::ResumeVideo => Transform::PassThrough(
            saved
                .draft
                .clone()
                .or_else(|| saved.article_text.clone())
                .unwrap_or_default(),
        ),
    }
}

async fn call_rewrite(model: Option<&dyn LanguageModel>, text: &str) -> Result<String, ModelError> {
    model
        .ok_or(ModelError::NotConfigured)?
        .rewrite(text, &DRAFT_REWRITE)
        .await
}

async fn call_summarize(
    model: Option<&dyn LanguageModel>,
    text: &str,
) -> Result<String, ModelError> {
    model
        .ok_or(ModelError::NotConfigured)?
        .summarize(text, &ARTICLE_SUMMARY)
        .await
}

fn resolve(
    original: &str,
    result: Result<String, ModelError>,
    tab_id: TabId,
) -> (String, bool, Option<String>) {
    match result {
        Ok(text) => (text, true, None),
        Err(e) => {
            warn!("Transformation failed for tab {}, presenting original: {}", tab_id, e);
            (original.to_string(), false, Some(e.to_string()))
        }
    }
}

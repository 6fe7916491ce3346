//! Draft lifecycle manager.
//!
//! [`DraftManager`] owns the draft being edited: its identity, the status it
//! was loaded with, and the in-memory payload. It loads drafts for the
//! authenticated owner, persists them (insert on first save, update after)
//! with retry, and decides when a save is not worth making.
//!
//! State lives behind a synchronous mutex that is never held across an
//! await point; saves are serialized by a separate async lock so two saves
//! of a brand new draft cannot both insert.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::CoreError;
use crate::field_mapper;
use crate::listing::{non_blank, ListingDraft, ListingRow, ListingStatus};
use crate::naming::placeholder_title;
use crate::notices::{DraftNotice, DraftNotices};
use crate::profile::{InterviewAnswer, ProfileGenerator, ProfileRequest};
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::store::{ListingStore, StoreError};
use crate::types::{DbId, Timestamp};
use crate::validation::ValidationEngine;

const ENTITY: &str = "listing";

// ---------------------------------------------------------------------------
// Save state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

/// Observable persistence state of the current draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveState {
    pub status: SaveStatus,
    pub last_saved_at: Option<Timestamp>,
    /// Message of the last terminal save failure, cleared by a later success.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The row was loaded; carries the mapped draft.
    Loaded(ListingDraft),
    /// Another load was already running; nothing was done.
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The draft holds nothing worth persisting yet.
    Skipped,
    Saved { draft_id: DbId, created: bool },
}

/// Dashboard entry for one of the owner's listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingOverview {
    pub id: DbId,
    pub title: Option<String>,
    pub status: ListingStatus,
    pub updated_at: Option<Timestamp>,
    pub completion_percentage: u8,
}

/// `true` when at least one field that makes a draft worth keeping is set.
///
/// Guards against persisting "ghost" drafts for users who opened the form
/// and left.
pub fn has_minimal_content(draft: &ListingDraft) -> bool {
    non_blank(&draft.horse_name).is_some()
        || non_blank(&draft.breed).is_some()
        || non_blank(&draft.current_location).is_some()
        || draft.price.is_some()
        || non_blank(&draft.description).is_some()
        || draft.filler_role.is_some()
        || draft.ownership_type.is_some()
        || draft.listing_type.is_some()
        || draft.contact_visibility.is_some()
}

// ---------------------------------------------------------------------------
// DraftManager
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DraftState {
    draft: ListingDraft,
    draft_id: Option<DbId>,
    /// Status the row had when loaded; `None` until the draft is persisted.
    original_status: Option<ListingStatus>,
    title: Option<String>,
    /// Bumped on every in-memory edit.
    revision: u64,
    /// Revision captured by the last successful save.
    saved_revision: u64,
}

/// Resets the in-flight load flag when dropped.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Failure of a single persistence attempt.
enum AttemptError {
    /// The update matched no row owned by the caller; not retried.
    NotOwned(DbId),
    Store(StoreError),
}

pub struct DraftManager {
    store: Arc<dyn ListingStore>,
    session: Session,
    engine: ValidationEngine,
    retry: RetryPolicy,
    notices: Arc<DraftNotices>,
    state: Mutex<DraftState>,
    save_lock: tokio::sync::Mutex<()>,
    loading: AtomicBool,
    save_state: watch::Sender<SaveState>,
}

impl DraftManager {
    pub fn new(store: Arc<dyn ListingStore>, session: Session) -> Self {
        let (save_state, _) = watch::channel(SaveState::default());
        Self {
            store,
            engine: ValidationEngine::new(session.clone()),
            session,
            retry: RetryPolicy::default(),
            notices: Arc::new(DraftNotices::default()),
            state: Mutex::new(DraftState::default()),
            save_lock: tokio::sync::Mutex::new(()),
            loading: AtomicBool::new(false),
            save_state,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Publish notices into a shared channel instead of a private one.
    pub fn with_notices(mut self, notices: Arc<DraftNotices>) -> Self {
        self.notices = notices;
        self
    }

    // -- accessors --

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn notices(&self) -> &DraftNotices {
        &self.notices
    }

    /// Snapshot of the in-memory draft.
    pub fn draft(&self) -> ListingDraft {
        self.lock_state().draft.clone()
    }

    /// The draft in the UI shape, legacy keys included.
    pub fn ui_value(&self) -> Value {
        field_mapper::to_ui_value(&self.lock_state().draft)
    }

    pub fn draft_id(&self) -> Option<DbId> {
        self.lock_state().draft_id
    }

    /// Status the draft was loaded or first saved with.
    pub fn original_status(&self) -> Option<ListingStatus> {
        self.lock_state().original_status
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state.borrow().clone()
    }

    pub fn subscribe_save_state(&self) -> watch::Receiver<SaveState> {
        self.save_state.subscribe()
    }

    /// `true` when edits were made since the last successful save.
    pub fn is_dirty(&self) -> bool {
        let state = self.lock_state();
        state.revision != state.saved_revision
    }

    pub fn is_saving(&self) -> bool {
        self.save_lock.try_lock().is_err()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    // -- loading --

    /// Load the draft `id` owned by the session user for editing.
    ///
    /// Returns [`LoadOutcome::InFlight`] without touching the store when a
    /// load is already running. Loads are not retried.
    pub async fn load_draft(&self, id: DbId) -> Result<LoadOutcome, CoreError> {
        if self.loading.swap(true, Ordering::AcqRel) {
            tracing::debug!(draft_id = id, "Load already in flight, ignoring");
            return Ok(LoadOutcome::InFlight);
        }
        let _guard = LoadingGuard(&self.loading);
        let owner_id = self.session.user_id;

        let row = match self.store.find_owned(id, owner_id).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tracing::warn!(draft_id = id, owner_id, "Draft not found or not owned");
                let err = CoreError::NotFoundOrForbidden { entity: ENTITY, id };
                self.notify_load_failed(id, &err);
                return Err(err);
            }
            Err(e) => {
                tracing::error!(draft_id = id, owner_id, error = %e, "Draft load failed");
                let err = CoreError::Persistence {
                    attempts: 1,
                    message: e.to_string(),
                };
                self.notify_load_failed(id, &err);
                return Err(err);
            }
        };

        let draft = field_mapper::from_row(&row);
        {
            let mut state = self.lock_state();
            let revision = state.revision;
            *state = DraftState {
                draft: draft.clone(),
                draft_id: Some(id),
                original_status: Some(row.listing_status),
                title: row.title.clone(),
                revision,
                saved_revision: revision,
            };
        }
        self.save_state.send_replace(SaveState {
            status: SaveStatus::Idle,
            last_saved_at: row.updated_at,
            last_error: None,
        });

        tracing::info!(
            draft_id = id,
            owner_id,
            status = row.listing_status.as_str(),
            "Draft loaded"
        );
        Ok(LoadOutcome::Loaded(draft))
    }

    // -- editing --

    /// Merge a typed patch into the in-memory draft.
    pub fn update_draft(&self, patch: ListingDraft) {
        {
            let mut state = self.lock_state();
            state.draft.merge(patch);
            state.revision += 1;
        }
        self.mark_edited();
    }

    /// Apply a camelCase patch from a step component.
    ///
    /// A malformed patch is rejected as a whole and leaves the draft as it
    /// was.
    pub fn apply_ui_patch(&self, patch: &Value) -> Result<(), CoreError> {
        {
            let mut state = self.lock_state();
            state.draft = field_mapper::apply_ui_patch(&state.draft, patch)?;
            state.revision += 1;
        }
        self.mark_edited();
        Ok(())
    }

    /// Ask the generation service for profile text and merge it in.
    ///
    /// Returns the patch that was applied.
    pub async fn generate_profile(
        &self,
        generator: &dyn ProfileGenerator,
        answers: Vec<InterviewAnswer>,
    ) -> Result<ListingDraft, CoreError> {
        let request = ProfileRequest::from_draft(&self.draft(), answers);
        let generated = generator.generate(&request).await.map_err(|e| {
            tracing::error!(error = %e, "Profile generation failed");
            CoreError::ProfileGeneration(e.to_string())
        })?;
        let patch = generated.into_patch()?;
        self.update_draft(patch.clone());
        tracing::info!(draft_id = ?self.draft_id(), "Generated profile merged into draft");
        Ok(patch)
    }

    // -- saving --

    /// Persist the current draft.
    ///
    /// Skips silently when the draft has no meaningful content. Failed
    /// attempts are retried per the retry policy with the payload captured
    /// at the start of the call. A failure notice is always published; a
    /// success notice only when `show_feedback` is set.
    pub async fn save_draft(&self, show_feedback: bool) -> Result<SaveOutcome, CoreError> {
        let _save = self.save_lock.lock().await;
        let owner_id = self.session.user_id;

        let (row, draft_id, revision) = {
            let state = self.lock_state();
            if !has_minimal_content(&state.draft) {
                tracing::debug!(owner_id, "Draft has no meaningful content, skipping save");
                return Ok(SaveOutcome::Skipped);
            }
            let status = state.original_status.unwrap_or_default();
            let mut row = field_mapper::to_row(&state.draft, owner_id, status);
            row.title = match (&state.title, state.draft_id) {
                (Some(title), _) => Some(title.clone()),
                (None, None) => Some(placeholder_title(&state.draft, Utc::now().date_naive())),
                (None, Some(_)) => None,
            };
            (row, state.draft_id, state.revision)
        };

        self.save_state.send_modify(|s| s.status = SaveStatus::Saving);

        match self.persist_with_retry(draft_id, &row).await {
            Ok(id) => {
                let still_dirty = {
                    let mut state = self.lock_state();
                    state.draft_id = Some(id);
                    state.original_status = Some(row.listing_status);
                    state.title = row.title.clone();
                    state.saved_revision = revision;
                    state.revision != revision
                };
                let saved_at = row.updated_at.unwrap_or_else(Utc::now);
                self.save_state.send_replace(SaveState {
                    status: if still_dirty {
                        SaveStatus::Idle
                    } else {
                        SaveStatus::Saved
                    },
                    last_saved_at: Some(saved_at),
                    last_error: None,
                });

                let created = draft_id.is_none();
                tracing::info!(draft_id = id, owner_id, created, "Draft saved");
                if show_feedback {
                    self.notices.publish(DraftNotice::Saved {
                        draft_id: id,
                        created,
                    });
                }
                Ok(SaveOutcome::Saved {
                    draft_id: id,
                    created,
                })
            }
            Err(err) => {
                self.save_state.send_modify(|s| {
                    s.status = SaveStatus::Error;
                    s.last_error = Some(err.to_string());
                });
                let attempts = match &err {
                    CoreError::Persistence { attempts, .. } => *attempts,
                    _ => 1,
                };
                self.notices.publish(DraftNotice::SaveFailed {
                    attempts,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn persist_with_retry(
        &self,
        draft_id: Option<DbId>,
        row: &ListingRow,
    ) -> Result<DbId, CoreError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;
        loop {
            match self.persist_once(draft_id, row).await {
                Ok(id) => return Ok(id),
                Err(AttemptError::NotOwned(id)) => {
                    tracing::warn!(draft_id = id, owner_id = row.owner_id, "Update matched no owned row");
                    return Err(CoreError::NotFoundOrForbidden { entity: ENTITY, id });
                }
                Err(AttemptError::Store(e)) if attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        draft_id = ?draft_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Draft save failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Store(e)) => {
                    tracing::error!(draft_id = ?draft_id, attempts = attempt, error = %e, "Draft save failed");
                    return Err(CoreError::Persistence {
                        attempts: attempt,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    async fn persist_once(
        &self,
        draft_id: Option<DbId>,
        row: &ListingRow,
    ) -> Result<DbId, AttemptError> {
        match draft_id {
            Some(id) => {
                let updated = self
                    .store
                    .update_owned(id, row.owner_id, row)
                    .await
                    .map_err(AttemptError::Store)?;
                if updated {
                    Ok(id)
                } else {
                    Err(AttemptError::NotOwned(id))
                }
            }
            None => self.store.insert(row).await.map_err(AttemptError::Store),
        }
    }

    // -- owner dashboard --

    /// The owner's listings with `status`, most recently updated first.
    pub async fn list_listings(
        &self,
        status: ListingStatus,
    ) -> Result<Vec<ListingOverview>, CoreError> {
        let owner_id = self.session.user_id;
        let rows = self
            .store
            .list_by_owner_and_status(owner_id, status)
            .await
            .map_err(|e| CoreError::Persistence {
                attempts: 1,
                message: e.to_string(),
            })?;

        Ok(rows
            .into_iter()
            .map(|stored| {
                let draft = field_mapper::from_row(&stored.row);
                ListingOverview {
                    id: stored.id,
                    title: stored.row.title,
                    status: stored.row.listing_status,
                    updated_at: stored.row.updated_at,
                    completion_percentage: self.engine.form_completion_percentage(&draft),
                }
            })
            .collect())
    }

    // -- cleanup --

    /// Delete the persisted draft and start over with an empty one.
    ///
    /// Published listings are left alone. Returns `false` when the draft
    /// was never persisted.
    pub async fn discard_draft(&self) -> Result<bool, CoreError> {
        let _save = self.save_lock.lock().await;
        let (draft_id, status) = {
            let state = self.lock_state();
            (state.draft_id, state.original_status)
        };

        let deleted = match draft_id {
            None => false,
            Some(id) => {
                if status == Some(ListingStatus::Published) {
                    return Err(CoreError::Validation(
                        "Published listings cannot be discarded".to_string(),
                    ));
                }
                let owner_id = self.session.user_id;
                let deleted = self.store.delete_owned(id, owner_id).await.map_err(|e| {
                    CoreError::Persistence {
                        attempts: 1,
                        message: e.to_string(),
                    }
                })?;
                if !deleted {
                    return Err(CoreError::NotFoundOrForbidden { entity: ENTITY, id });
                }
                tracing::info!(draft_id = id, owner_id, "Draft discarded");
                true
            }
        };

        {
            let mut state = self.lock_state();
            let revision = state.revision + 1;
            *state = DraftState {
                revision,
                saved_revision: revision,
                ..Default::default()
            };
        }
        self.save_state.send_replace(SaveState::default());
        Ok(deleted)
    }

    // -- internals --

    fn lock_state(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Any edit after a successful save drops the `saved` badge.
    fn mark_edited(&self) {
        self.save_state.send_if_modified(|s| {
            if s.status == SaveStatus::Saved {
                s.status = SaveStatus::Idle;
                true
            } else {
                false
            }
        });
    }

    fn notify_load_failed(&self, draft_id: DbId, err: &CoreError) {
        self.notices.publish(DraftNotice::LoadFailed {
            draft_id,
            message: err.to_string(),
        });
    }
}

//! Integration tests for the draft lifecycle manager.
//!
//! Drives [`DraftManager`] against an in-memory [`ListingStore`] whose
//! write failures and latency are scripted per test.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use paddock_core::autosave;
use paddock_core::draft::{DraftManager, LoadOutcome, SaveOutcome, SaveStatus};
use paddock_core::error::CoreError;
use paddock_core::listing::{FillerRole, ListingDraft, ListingRow, ListingStatus};
use paddock_core::notices::DraftNotice;
use paddock_core::profile::{
    GeneratedProfile, InterviewAnswer, ProfileGenError, ProfileGenerator, ProfileRequest,
};
use paddock_core::retry::RetryPolicy;
use paddock_core::session::Session;
use paddock_core::store::{ListingStore, StoreError, StoredListing};
use paddock_core::types::{DbId, Timestamp};

const OWNER: DbId = 1;
const OTHER_OWNER: DbId = 2;

// ---------------------------------------------------------------------------
// Scripted store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Find(DbId),
    Insert,
    Update(DbId),
    List,
    Delete(DbId),
}

#[derive(Default)]
struct FakeStore {
    rows: Mutex<HashMap<DbId, ListingRow>>,
    next_id: AtomicI64,
    /// Failures returned by the next writes, in order.
    write_failures: Mutex<VecDeque<StoreError>>,
    calls: Mutex<Vec<(Call, Instant)>>,
    latency: Option<Duration>,
}

impl FakeStore {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::new()
        }
    }

    fn fail_next_writes(&self, count: usize) {
        let mut failures = self.write_failures.lock().unwrap();
        for _ in 0..count {
            failures.push_back(StoreError::Unavailable("connection refused".into()));
        }
    }

    fn seed(&self, row: ListingRow) -> DbId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().insert(id, row);
        id
    }

    fn row(&self, id: DbId) -> Option<ListingRow> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    fn remove(&self, id: DbId) {
        self.rows.lock().unwrap().remove(&id);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn next_failure(&self) -> Option<StoreError> {
        self.write_failures.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ListingStore for FakeStore {
    async fn find_owned(&self, id: DbId, owner_id: DbId) -> Result<Option<ListingRow>, StoreError> {
        self.record(Call::Find(id)).await;
        Ok(self.row(id).filter(|r| r.owner_id == owner_id))
    }

    async fn insert(&self, row: &ListingRow) -> Result<DbId, StoreError> {
        self.record(Call::Insert).await;
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        Ok(self.seed(row.clone()))
    }

    async fn update_owned(
        &self,
        id: DbId,
        owner_id: DbId,
        row: &ListingRow,
    ) -> Result<bool, StoreError> {
        self.record(Call::Update(id)).await;
        if let Some(err) = self.next_failure() {
            return Err(err);
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&id) {
            Some(existing) if existing.owner_id == owner_id => {
                *existing = row.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_owner_and_status(
        &self,
        owner_id: DbId,
        status: ListingStatus,
    ) -> Result<Vec<StoredListing>, StoreError> {
        self.record(Call::List).await;
        let mut listings: Vec<StoredListing> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.owner_id == owner_id && r.listing_status == status)
            .map(|(id, row)| StoredListing {
                id: *id,
                created_at: None,
                row: row.clone(),
            })
            .collect();
        listings.sort_by(|a, b| b.row.updated_at.cmp(&a.row.updated_at));
        Ok(listings)
    }

    async fn delete_owned(&self, id: DbId, owner_id: DbId) -> Result<bool, StoreError> {
        self.record(Call::Delete(id)).await;
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&id) {
            Some(r) if r.owner_id == owner_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager(store: &Arc<FakeStore>) -> DraftManager {
    DraftManager::new(store.clone(), Session::new(OWNER)).with_retry_policy(RetryPolicy::immediate(2))
}

fn named(name: &str) -> ListingDraft {
    ListingDraft {
        horse_name: Some(name.into()),
        ..Default::default()
    }
}

fn stored_row(owner_id: DbId, status: ListingStatus, name: &str) -> ListingRow {
    ListingRow {
        owner_id,
        listing_status: status,
        title: Some(format!("{name} listing")),
        horse_name: Some(name.into()),
        ..Default::default()
    }
}

/// Paused-clock sleeps land on the timer wheel's millisecond resolution.
fn assert_gap(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(5),
        "expected a gap of {expected:?}, got {actual:?}"
    );
}

fn at(secs: i64) -> Option<Timestamp> {
    chrono::DateTime::from_timestamp(1_790_000_000 + secs, 0)
}

// ---------------------------------------------------------------------------
// Test: first save inserts, later saves update
// ---------------------------------------------------------------------------

/// A new draft is inserted once and updated in place afterwards, keeping
/// the placeholder title generated at insert.
#[tokio::test]
async fn first_save_inserts_then_updates() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);

    manager.update_draft(named("Bo"));
    let first = manager.save_draft(true).await.unwrap();
    assert_eq!(
        first,
        SaveOutcome::Saved {
            draft_id: 1,
            created: true
        }
    );
    assert_eq!(manager.draft_id(), Some(1));

    manager.update_draft(ListingDraft {
        breed: Some("Warmblood".into()),
        ..Default::default()
    });
    let second = manager.save_draft(true).await.unwrap();
    assert_eq!(
        second,
        SaveOutcome::Saved {
            draft_id: 1,
            created: false
        }
    );

    assert_eq!(store.calls(), vec![Call::Insert, Call::Update(1)]);
    let row = store.row(1).unwrap();
    assert_eq!(row.listing_status, ListingStatus::Draft);
    assert_eq!(row.title.as_deref(), Some("Bo"));
    assert_eq!(row.breed.as_deref(), Some("Warmblood"));
    assert!(row.updated_at.is_some());
}

// ---------------------------------------------------------------------------
// Test: empty drafts are never persisted
// ---------------------------------------------------------------------------

/// Saving a draft without meaningful content makes no store call, however
/// often it is repeated.
#[tokio::test]
async fn empty_draft_save_is_skipped() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    manager.update_draft(ListingDraft {
        images: Some(vec!["https://cdn.example.com/1.jpg".into()]),
        ..Default::default()
    });

    for _ in 0..3 {
        assert_eq!(manager.save_draft(true).await.unwrap(), SaveOutcome::Skipped);
    }
    assert!(store.calls().is_empty());
    assert_eq!(manager.save_state().status, SaveStatus::Idle);
    assert!(manager.draft_id().is_none());
}

// ---------------------------------------------------------------------------
// Test: step completion through the UI boundary
// ---------------------------------------------------------------------------

/// Three of the five horse-basics fields, entered with legacy keys, make
/// the step 60% complete.
#[tokio::test]
async fn legacy_ui_patch_counts_towards_completion() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);

    manager
        .apply_ui_patch(&json!({
            "barnName": "Bo",
            "breed": "Warmblood",
            "location": "Ocala, FL",
        }))
        .unwrap();

    let step = manager.engine().validate_step(4, &manager.draft());
    assert_eq!(step.completion_percentage, 60);
    assert_eq!(step.errors.len(), 2);

    let ui = manager.ui_value();
    assert_eq!(ui["horseName"], "Bo");
    assert_eq!(ui["barnName"], "Bo");
    assert_eq!(ui["currentLocation"], "Ocala, FL");
}

/// A malformed patch leaves the draft untouched.
#[tokio::test]
async fn malformed_ui_patch_is_rejected_whole() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    manager.update_draft(named("Bo"));

    let err = manager
        .apply_ui_patch(&json!({ "breed": "Arabian", "price": { "amount": 5 } }))
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(msg) if msg.contains("price"));
    assert_eq!(manager.draft(), named("Bo"));
}

// ---------------------------------------------------------------------------
// Test: retry with backoff
// ---------------------------------------------------------------------------

/// Two failures then a success: three attempts, 2s then 4s apart, and the
/// same payload every time.
#[tokio::test(start_paused = true)]
async fn save_retries_with_linear_backoff() {
    let store = Arc::new(FakeStore::new());
    store.fail_next_writes(2);
    let manager =
        DraftManager::new(store.clone(), Session::new(OWNER)).with_retry_policy(RetryPolicy::default());
    manager.update_draft(named("Bo"));

    let outcome = manager.save_draft(false).await.unwrap();
    assert_matches!(outcome, SaveOutcome::Saved { created: true, .. });

    assert_eq!(store.calls(), vec![Call::Insert, Call::Insert, Call::Insert]);
    let times = store.call_times();
    assert_gap(times[1] - times[0], Duration::from_secs(2));
    assert_gap(times[2] - times[1], Duration::from_secs(4));
    assert_eq!(manager.save_state().status, SaveStatus::Saved);
}

/// Retries reuse the snapshot taken when the save started, even if the
/// draft is edited during the backoff.
#[tokio::test(start_paused = true)]
async fn retries_reuse_original_snapshot() {
    let store = Arc::new(FakeStore::new());
    store.fail_next_writes(1);
    let manager = Arc::new(
        DraftManager::new(store.clone(), Session::new(OWNER))
            .with_retry_policy(RetryPolicy::default()),
    );
    manager.update_draft(named("Bo"));

    let saving = tokio::spawn({
        let manager = manager.clone();
        async move { manager.save_draft(false).await }
    });
    while store.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    manager.update_draft(named("Renamed"));

    saving.await.unwrap().unwrap();
    assert_eq!(store.row(1).unwrap().horse_name.as_deref(), Some("Bo"));
    assert!(manager.is_dirty());
    assert_eq!(manager.save_state().status, SaveStatus::Idle);
}

/// After every attempt fails the error is terminal, a notice is published
/// and the in-memory draft is kept.
#[tokio::test]
async fn exhausted_retries_surface_persistence_error() {
    let store = Arc::new(FakeStore::new());
    store.fail_next_writes(3);
    let manager = manager(&store);
    let mut notices = manager.notices().subscribe();
    manager.update_draft(named("Bo"));

    let err = manager.save_draft(false).await.unwrap_err();
    assert_matches!(err, CoreError::Persistence { attempts: 3, .. });

    assert_eq!(store.calls().len(), 3);
    assert_eq!(manager.draft(), named("Bo"));
    assert!(manager.draft_id().is_none());
    assert!(manager.is_dirty());

    let state = manager.save_state();
    assert_eq!(state.status, SaveStatus::Error);
    assert!(state.last_error.is_some());
    assert_matches!(
        notices.try_recv(),
        Ok(DraftNotice::SaveFailed { attempts: 3, .. })
    );
}

// ---------------------------------------------------------------------------
// Test: status preservation
// ---------------------------------------------------------------------------

/// Editing and saving a published listing keeps it published.
#[tokio::test]
async fn published_listing_stays_published() {
    let store = Arc::new(FakeStore::new());
    let id = store.seed(stored_row(OWNER, ListingStatus::Published, "Bo"));
    let manager = manager(&store);

    let loaded = manager.load_draft(id).await.unwrap();
    assert_matches!(loaded, LoadOutcome::Loaded(draft) if draft.horse_name.as_deref() == Some("Bo"));
    assert_eq!(manager.original_status(), Some(ListingStatus::Published));

    manager.update_draft(ListingDraft {
        price: Some(25_000),
        ..Default::default()
    });
    manager.save_draft(false).await.unwrap();

    let row = store.row(id).unwrap();
    assert_eq!(row.listing_status, ListingStatus::Published);
    assert_eq!(row.price, Some(25_000));
    assert_eq!(row.title.as_deref(), Some("Bo listing"));
}

/// A loaded draft stays a draft after saving.
#[tokio::test]
async fn loaded_draft_stays_draft() {
    let store = Arc::new(FakeStore::new());
    let id = store.seed(stored_row(OWNER, ListingStatus::Draft, "Bo"));
    let manager = manager(&store);

    manager.load_draft(id).await.unwrap();
    manager.update_draft(named("Bo II"));
    manager.save_draft(false).await.unwrap();

    assert_eq!(store.row(id).unwrap().listing_status, ListingStatus::Draft);
    assert_eq!(store.calls(), vec![Call::Find(id), Call::Update(id)]);
}

// ---------------------------------------------------------------------------
// Test: ownership
// ---------------------------------------------------------------------------

/// Loading another owner's row fails immediately without retry.
#[tokio::test]
async fn load_of_foreign_draft_is_not_found() {
    let store = Arc::new(FakeStore::new());
    let id = store.seed(stored_row(OTHER_OWNER, ListingStatus::Draft, "Bo"));
    let manager = manager(&store);
    let mut notices = manager.notices().subscribe();

    let err = manager.load_draft(id).await.unwrap_err();
    assert_matches!(err, CoreError::NotFoundOrForbidden { id: got, .. } if got == id);
    assert_eq!(store.calls(), vec![Call::Find(id)]);
    assert!(manager.draft_id().is_none());
    assert_matches!(notices.try_recv(), Ok(DraftNotice::LoadFailed { .. }));
}

/// An update that no longer matches an owned row is not retried.
#[tokio::test]
async fn update_of_vanished_row_is_not_found() {
    let store = Arc::new(FakeStore::new());
    let id = store.seed(stored_row(OWNER, ListingStatus::Draft, "Bo"));
    let manager = manager(&store);
    manager.load_draft(id).await.unwrap();
    store.remove(id);

    manager.update_draft(named("Bo II"));
    let err = manager.save_draft(false).await.unwrap_err();
    assert_matches!(err, CoreError::NotFoundOrForbidden { .. });
    assert_eq!(store.calls(), vec![Call::Find(id), Call::Update(id)]);
}

// ---------------------------------------------------------------------------
// Test: concurrency
// ---------------------------------------------------------------------------

/// A second load issued while the first is running is suppressed.
#[tokio::test(start_paused = true)]
async fn concurrent_load_is_suppressed() {
    let store = Arc::new(FakeStore::with_latency(Duration::from_millis(500)));
    let id = store.seed(stored_row(OWNER, ListingStatus::Draft, "Bo"));
    let manager = manager(&store);

    let (first, second) = tokio::join!(manager.load_draft(id), manager.load_draft(id));
    assert_matches!(first, Ok(LoadOutcome::Loaded(_)));
    assert_matches!(second, Ok(LoadOutcome::InFlight));
    assert_eq!(store.calls(), vec![Call::Find(id)]);
    assert!(!manager.is_loading());
}

/// Edits made while a save is in flight keep the draft dirty and the save
/// ends in `idle` rather than `saved`.
#[tokio::test(start_paused = true)]
async fn edit_during_save_ends_idle() {
    let store = Arc::new(FakeStore::with_latency(Duration::from_secs(1)));
    let manager = Arc::new(manager(&store));
    manager.update_draft(named("Bo"));

    let saving = tokio::spawn({
        let manager = manager.clone();
        async move { manager.save_draft(false).await }
    });
    while !manager.is_saving() {
        tokio::task::yield_now().await;
    }
    assert_eq!(manager.save_state().status, SaveStatus::Saving);
    manager.update_draft(ListingDraft {
        breed: Some("Arabian".into()),
        ..Default::default()
    });

    saving.await.unwrap().unwrap();
    assert_eq!(manager.save_state().status, SaveStatus::Idle);
    assert!(manager.save_state().last_saved_at.is_some());
    assert!(manager.is_dirty());

    manager.save_draft(false).await.unwrap();
    assert_eq!(manager.save_state().status, SaveStatus::Saved);
    assert!(!manager.is_dirty());
}

// ---------------------------------------------------------------------------
// Test: save state and notices
// ---------------------------------------------------------------------------

/// Success notices are only published when feedback is requested.
#[tokio::test]
async fn success_notice_requires_feedback() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    let mut notices = manager.notices().subscribe();

    manager.update_draft(named("Bo"));
    manager.save_draft(false).await.unwrap();
    assert!(notices.try_recv().is_err());

    manager.update_draft(named("Bo II"));
    manager.save_draft(true).await.unwrap();
    assert_eq!(
        notices.try_recv().unwrap(),
        DraftNotice::Saved {
            draft_id: 1,
            created: false
        }
    );
}

/// Editing after a successful save drops the `saved` status, and watchers
/// see every transition.
#[tokio::test]
async fn edit_after_save_resets_to_idle() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    let mut watcher = manager.subscribe_save_state();

    manager.update_draft(named("Bo"));
    manager.save_draft(false).await.unwrap();
    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().status, SaveStatus::Saved);

    manager.update_draft(ListingDraft {
        filler_role: Some(FillerRole::Owner),
        ..Default::default()
    });
    assert!(watcher.has_changed().unwrap());
    assert_eq!(watcher.borrow_and_update().status, SaveStatus::Idle);
}

// ---------------------------------------------------------------------------
// Test: owner dashboard and cleanup
// ---------------------------------------------------------------------------

/// Only the caller's listings with the requested status are returned,
/// newest first.
#[tokio::test]
async fn list_listings_filters_by_owner_and_status() {
    let store = Arc::new(FakeStore::new());
    let older = store.seed(ListingRow {
        updated_at: at(0),
        ..stored_row(OWNER, ListingStatus::Draft, "Older")
    });
    let newer = store.seed(ListingRow {
        updated_at: at(60),
        ..stored_row(OWNER, ListingStatus::Draft, "Newer")
    });
    store.seed(stored_row(OWNER, ListingStatus::Published, "Live"));
    store.seed(stored_row(OTHER_OWNER, ListingStatus::Draft, "Theirs"));
    let manager = manager(&store);

    let drafts = manager.list_listings(ListingStatus::Draft).await.unwrap();
    let ids: Vec<DbId> = drafts.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![newer, older]);
    assert!(drafts.iter().all(|l| l.status == ListingStatus::Draft));
    assert!(drafts.iter().all(|l| l.completion_percentage < 100));
}

/// Discarding deletes the persisted draft and resets the manager.
#[tokio::test]
async fn discard_deletes_and_resets() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    manager.update_draft(named("Bo"));
    manager.save_draft(false).await.unwrap();

    assert!(manager.discard_draft().await.unwrap());
    assert!(store.row(1).is_none());
    assert!(manager.draft_id().is_none());
    assert!(manager.draft().is_empty());
    assert!(!manager.is_dirty());

    // Nothing persisted anymore.
    assert!(!manager.discard_draft().await.unwrap());
}

/// Published listings cannot be discarded from the editor.
#[tokio::test]
async fn discard_refuses_published_listing() {
    let store = Arc::new(FakeStore::new());
    let id = store.seed(stored_row(OWNER, ListingStatus::Published, "Bo"));
    let manager = manager(&store);
    manager.load_draft(id).await.unwrap();

    assert_matches!(manager.discard_draft().await, Err(CoreError::Validation(_)));
    assert!(store.row(id).is_some());
}

// ---------------------------------------------------------------------------
// Test: profile generation
// ---------------------------------------------------------------------------

struct CannedGenerator;

#[async_trait]
impl ProfileGenerator for CannedGenerator {
    async fn generate(&self, request: &ProfileRequest) -> Result<GeneratedProfile, ProfileGenError> {
        let name = request.horse_name.clone().unwrap_or_default();
        Ok(GeneratedProfile {
            description: Some(format!("  {name} is a kind, willing partner.  ")),
            disciplines: vec!["Dressage".into(), "rodeo clown".into()],
            ..Default::default()
        })
    }
}

struct FailingGenerator;

#[async_trait]
impl ProfileGenerator for FailingGenerator {
    async fn generate(&self, _: &ProfileRequest) -> Result<GeneratedProfile, ProfileGenError> {
        Err(ProfileGenError::Rejected {
            status: 503,
            body: "overloaded".into(),
        })
    }
}

/// Generated text is cleaned and merged into the draft.
#[tokio::test]
async fn generated_profile_is_merged() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    manager.update_draft(named("Bo"));

    let answers = vec![InterviewAnswer {
        question: "What is he like to ride?".into(),
        answer: "Forward but sensible".into(),
    }];
    manager.generate_profile(&CannedGenerator, answers).await.unwrap();

    let draft = manager.draft();
    assert_eq!(draft.horse_name.as_deref(), Some("Bo"));
    assert_eq!(
        draft.description.as_deref(),
        Some("Bo is a kind, willing partner.")
    );
    assert_eq!(draft.disciplines, Some(vec!["dressage".to_string()]));
    assert!(manager.is_dirty());
}

/// A failing generator leaves the draft alone.
#[tokio::test]
async fn generator_failure_is_reported() {
    let store = Arc::new(FakeStore::new());
    let manager = manager(&store);
    manager.update_draft(named("Bo"));

    let err = manager
        .generate_profile(&FailingGenerator, vec![])
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::ProfileGeneration(msg) if msg.contains("503"));
    assert_eq!(manager.draft(), named("Bo"));
}

// ---------------------------------------------------------------------------
// Test: autosave
// ---------------------------------------------------------------------------

/// The autosave loop saves dirty drafts on each tick and stays quiet when
/// nothing changed.
#[tokio::test(start_paused = true)]
async fn autosave_saves_only_dirty_drafts() {
    let store = Arc::new(FakeStore::new());
    let manager = Arc::new(manager(&store));
    let cancel = CancellationToken::new();
    let task = tokio::spawn(autosave::run(
        manager.clone(),
        Duration::from_secs(30),
        cancel.clone(),
    ));

    manager.update_draft(named("Bo"));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(store.calls(), vec![Call::Insert]);
    assert!(!manager.is_dirty());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.calls(), vec![Call::Insert]);

    manager.update_draft(named("Bo II"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.calls(), vec![Call::Insert, Call::Update(1)]);

    cancel.cancel();
    task.await.unwrap();
}

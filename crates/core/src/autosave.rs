//! Periodic autosave of the draft being edited.
//!
//! Spawned next to a [`DraftManager`]; on every tick it saves the draft
//! without user feedback when there are unsaved edits and no save is
//! already running. Runs until `cancel` is triggered.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::draft::{DraftManager, SaveOutcome};

/// Run the autosave loop.
pub async fn run(manager: Arc<DraftManager>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Draft autosave started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing has been edited yet.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Draft autosave stopping");
                break;
            }
            _ = interval.tick() => {
                if !manager.is_dirty() || manager.is_saving() {
                    continue;
                }
                match manager.save_draft(false).await {
                    Ok(SaveOutcome::Saved { draft_id, .. }) => {
                        tracing::debug!(draft_id, "Autosave: draft saved");
                    }
                    Ok(SaveOutcome::Skipped) => {
                        tracing::debug!("Autosave: nothing worth saving yet");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Autosave: save failed");
                    }
                }
            }
        }
    }
}

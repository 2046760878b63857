use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, instrument, warn};

use super::dto::{MacroTargets, UserTargets};
use crate::storage::KvStore;

pub const TARGETS_KEY: &str = "user-targets";

const CARB_SHARE: f64 = 0.40;
const FAT_SHARE: f64 = 0.30;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Carb and fat grams for a calorie goal: 40% of calories from carbs, 30% from fat.
/// Returns `(carbs, fats)`, or `None` when no calorie goal is set.
pub fn macro_split(daily_calories: Option<u32>) -> Option<(u32, u32)> {
    let cals = f64::from(daily_calories?);
    let carbs = (cals * CARB_SHARE / KCAL_PER_G_CARB).round() as u32;
    let fats = (cals * FAT_SHARE / KCAL_PER_G_FAT).round() as u32;
    Some((carbs, fats))
}

impl UserTargets {
    pub fn macro_targets(&self) -> Option<MacroTargets> {
        macro_split(self.daily_calories).map(|(carbs, fats)| MacroTargets {
            protein: self.protein_goal,
            carbs,
            fats,
        })
    }
}

#[derive(Clone)]
pub struct TargetStore {
    kv: Arc<dyn KvStore>,
}

impl TargetStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Missing and unreadable records both load as `None`; the latter is logged.
    #[instrument(skip(self))]
    pub async fn load(&self) -> anyhow::Result<Option<UserTargets>> {
        let Some(raw) = self.kv.get(TARGETS_KEY).await.context("load targets")? else {
            debug!("no saved targets");
            return Ok(None);
        };
        match serde_json::from_str::<UserTargets>(&raw) {
            Ok(t) => Ok(Some(t)),
            Err(e) => {
                warn!(error = %e, key = TARGETS_KEY, "saved targets unreadable; using defaults");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn save(&self, targets: &UserTargets) -> anyhow::Result<()> {
        let raw = serde_json::to_string(targets).context("encode targets")?;
        self.kv
            .set(TARGETS_KEY, &raw)
            .await
            .context("save targets")?;
        debug!("targets saved");
        Ok(())
    }
}

/// Shown while the latest target write has failed.
pub const TARGETS_SAVE_FAILED: &str = "Couldn't save your targets. Your changes are kept for now.";

/// Writes the target aggregate once it has stopped changing for `settle`.
/// A value equal to the last successful write is skipped.
pub struct TargetAutosave {
    tx: watch::Sender<Option<UserTargets>>,
    failure: watch::Receiver<Option<String>>,
    handle: JoinHandle<()>,
}

impl TargetAutosave {
    pub fn spawn(store: TargetStore, settle: Duration, initial: Option<UserTargets>) -> Self {
        let (tx, rx) = watch::channel(None);
        let (failure_tx, failure) = watch::channel(None);
        let handle = tokio::spawn(run_autosave(store, settle, rx, failure_tx, initial));
        Self {
            tx,
            failure,
            handle,
        }
    }

    /// Notice for the user while the most recent write attempt has failed.
    pub fn failure(&self) -> Option<String> {
        self.failure.borrow().clone()
    }

    pub fn notify(&self, targets: UserTargets) {
        // The receiver only goes away after `shutdown`.
        let _ = self.tx.send(Some(targets));
    }

    /// Stops observing and flushes a pending value.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "target autosave task ended abnormally");
        }
    }
}

async fn run_autosave(
    store: TargetStore,
    settle: Duration,
    mut rx: watch::Receiver<Option<UserTargets>>,
    failure: watch::Sender<Option<String>>,
    mut last_written: Option<UserTargets>,
) {
    loop {
        let mut closed = rx.changed().await.is_err();
        if !closed {
            // settle: restart the window on every further change
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(settle) => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            closed = true;
                            break;
                        }
                    }
                }
            }
        }

        let latest = *rx.borrow_and_update();
        if let Some(targets) = latest {
            if last_written != Some(targets) {
                match store.save(&targets).await {
                    Ok(()) => {
                        info!(?targets, "targets persisted");
                        last_written = Some(targets);
                        failure.send_replace(None);
                    }
                    Err(e) => {
                        warn!(error = %e, "saving targets failed; keeping in-memory value");
                        failure.send_replace(Some(TARGETS_SAVE_FAILED.to_string()));
                    }
                }
            }
        }

        if closed {
            break;
        }
    }
}

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use anyhow::Context;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::dto::{MealTemplate, SkippedTemplate, TemplateListing};
use crate::error::PlannerError;
use crate::meals::dto::MealEntrySet;
use crate::storage::KvStore;

pub const TEMPLATE_PREFIX: &str = "template:";

/// CRUD over templates stored as `template:<unix millis>` keys.
#[derive(Clone)]
pub struct TemplateStore {
    kv: Arc<dyn KvStore>,
    last_id_ms: Arc<AtomicI64>,
}

impl TemplateStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            last_id_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Fetches every template. Records that vanish or fail to decode are
    /// reported in `skipped` instead of failing the whole listing.
    #[instrument(skip(self))]
    pub async fn list(&self) -> anyhow::Result<TemplateListing> {
        let keys = self
            .kv
            .list(TEMPLATE_PREFIX)
            .await
            .context("list template keys")?;

        let mut listing = TemplateListing::default();
        for key in keys {
            let reason = match self.kv.get(&key).await {
                Ok(Some(raw)) => match serde_json::from_str::<MealTemplate>(&raw) {
                    Ok(t) => {
                        listing.templates.push(t);
                        continue;
                    }
                    Err(e) => format!("unreadable record: {e}"),
                },
                Ok(None) => "record not found".to_string(),
                Err(e) => format!("fetch failed: {e:#}"),
            };
            warn!(%key, %reason, "skipping template");
            listing.skipped.push(SkippedTemplate { key, reason });
        }

        listing
            .templates
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(
            loaded = listing.templates.len(),
            skipped = listing.skipped.len(),
            "templates listed"
        );
        Ok(listing)
    }

    #[instrument(skip(self, meals))]
    pub async fn save(&self, name: &str, meals: &MealEntrySet) -> Result<MealTemplate, PlannerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::Validation(
                "Please enter a name for this meal template".into(),
            ));
        }

        let created_at = OffsetDateTime::now_utc();
        let id = format!("{TEMPLATE_PREFIX}{}", self.next_id_ms(created_at));
        let template = MealTemplate {
            id,
            name: name.to_string(),
            breakfast: meals.breakfast.clone(),
            lunch: meals.lunch.clone(),
            dinner: meals.dinner.clone(),
            snacks: meals.snacks.clone(),
            created_at,
        };

        let raw = serde_json::to_string(&template).context("encode template")?;
        self.kv
            .set(&template.id, &raw)
            .await
            .with_context(|| format!("save template {}", template.id))?;

        info!(id = %template.id, "template saved");
        Ok(template)
    }

    pub async fn get(&self, id: &str) -> Result<MealTemplate, PlannerError> {
        let raw = self
            .kv
            .get(id)
            .await
            .with_context(|| format!("fetch template {id}"))?
            .ok_or_else(|| PlannerError::TemplateNotFound(id.to_string()))?;
        let template = serde_json::from_str(&raw)
            .with_context(|| format!("decode template {id}"))?;
        Ok(template)
    }

    /// Removes a stored template. Nothing is touched unless `confirmed`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str, confirmed: bool) -> Result<(), PlannerError> {
        if !confirmed {
            return Err(PlannerError::ConfirmationRequired);
        }
        let stored = id.starts_with(TEMPLATE_PREFIX)
            && self
                .kv
                .get(id)
                .await
                .with_context(|| format!("fetch template {id}"))?
                .is_some();
        if !stored {
            return Err(PlannerError::TemplateNotFound(id.to_string()));
        }
        self.kv
            .delete(id)
            .await
            .with_context(|| format!("delete template {id}"))?;
        info!(%id, "template deleted");
        Ok(())
    }

    /// Millisecond id, strictly increasing within this process.
    fn next_id_ms(&self, at: OffsetDateTime) -> i64 {
        let now_ms = (at.unix_timestamp_nanos() / 1_000_000) as i64;
        let mut prev = self.last_id_ms.load(Ordering::SeqCst);
        loop {
            let next = now_ms.max(prev + 1);
            match self
                .last_id_ms
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Loading is a pure read; the caller drops any analysis of the old texts.
pub fn load(template: &MealTemplate) -> MealEntrySet {
    template.meals()
}

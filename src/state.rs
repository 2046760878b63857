use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::analysis::client::{AnalysisService, AnthropicClient};
use crate::config::{AppConfig, StorageConfig};
use crate::db::PgStore;
use crate::planner::session::PlannerSession;
use crate::storage::{KvStore, MemoryStore, S3Store};
use crate::targets::services::{TargetAutosave, TargetStore};
use crate::templates::dto::TemplateListing;
use crate::templates::repo::TemplateStore;

/// Shown when saved targets or templates could not be read at startup.
pub const STARTUP_LOAD_FAILED: &str = "Couldn't load your saved data. Starting with defaults.";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub targets: TargetStore,
    pub templates: TemplateStore,
    pub analyzer: Arc<dyn AnalysisService>,
    pub autosave: Arc<TargetAutosave>,
    pub session: Arc<Mutex<PlannerSession>>,
}

pub async fn connect_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn KvStore>> {
    let kv: Arc<dyn KvStore> = match storage {
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
        StorageConfig::Postgres { database_url } => Arc::new(PgStore::connect(database_url).await?),
        StorageConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
        } => Arc::new(S3Store::new(endpoint, bucket, access_key, secret_key, region).await?),
    };
    Ok(kv)
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let kv = connect_store(&config.storage).await?;
        let analyzer = Arc::new(AnthropicClient::new(config.analysis.clone())?) as Arc<dyn AnalysisService>;
        Self::from_parts(Arc::new(config), kv, analyzer).await
    }

    /// Loads targets, then templates, then starts watching targets for autosave.
    pub async fn from_parts(
        config: Arc<AppConfig>,
        kv: Arc<dyn KvStore>,
        analyzer: Arc<dyn AnalysisService>,
    ) -> anyhow::Result<Self> {
        let targets = TargetStore::new(kv.clone());
        let templates = TemplateStore::new(kv);

        let mut load_failed = false;
        let saved = match targets.load().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "loading saved targets failed; using defaults");
                load_failed = true;
                None
            }
        };
        let listing = match templates.list().await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "listing templates failed; starting without them");
                load_failed = true;
                TemplateListing::default()
            }
        };
        info!(
            targets_saved = saved.is_some(),
            templates = listing.templates.len(),
            skipped = listing.skipped.len(),
            "session restored"
        );

        let autosave = TargetAutosave::spawn(targets.clone(), config.targets_settle, saved);
        let mut session = PlannerSession::new(saved.unwrap_or_default(), listing);
        if load_failed {
            session.set_notice(STARTUP_LOAD_FAILED);
        }

        Ok(Self {
            config,
            targets,
            templates,
            analyzer,
            autosave: Arc::new(autosave),
            session: Arc::new(Mutex::new(session)),
        })
    }
}

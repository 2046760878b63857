use std::time::Duration;

use anyhow::{bail, Context};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Postgres {
        database_url: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub api_url: String,
    pub api_key: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com".into(),
            api_key: String::new(),
            api_version: "2023-06-01".into(),
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 3000,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub analysis: AnalysisConfig,
    pub targets_settle: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));
        let parsed = |key: &str, default: u64| -> anyhow::Result<u64> {
            match var(key) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a whole number, got {v:?}")),
                None => Ok(default),
            }
        };

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => StorageConfig::Memory,
            "postgres" => StorageConfig::Postgres {
                database_url: required("DATABASE_URL")?,
            },
            "s3" => StorageConfig::S3 {
                endpoint: required("S3_ENDPOINT")?,
                bucket: required("S3_BUCKET")?,
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
                region: var("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
            },
            other => bail!("unknown STORAGE_BACKEND {other:?} (expected memory, postgres or s3)"),
        };

        let defaults = AnalysisConfig::default();
        let analysis = AnalysisConfig {
            api_url: var("ANALYSIS_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            api_key: required("ANTHROPIC_API_KEY")?,
            api_version: var("ANALYSIS_API_VERSION").unwrap_or(defaults.api_version),
            model: var("ANALYSIS_MODEL").unwrap_or(defaults.model),
            max_tokens: u32::try_from(parsed("ANALYSIS_MAX_TOKENS", u64::from(defaults.max_tokens))?)
                .context("ANALYSIS_MAX_TOKENS out of range")?,
            timeout: Duration::from_secs(parsed(
                "ANALYSIS_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: u16::try_from(parsed("APP_PORT", 8080)?).context("APP_PORT out of range")?,
            storage,
            analysis,
            targets_settle: Duration::from_millis(parsed("TARGETS_SETTLE_MS", 500)?),
        })
    }
}

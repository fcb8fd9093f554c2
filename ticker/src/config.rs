use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use engine::random::{EntropyRandomFactory, RandomSourceFactory, SeededRandomFactory};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Upper bound on pooled database connections.
    pub db_max_connections: u32,

    // =========================
    // Cycle configuration
    // =========================
    /// Time between two cycle triggers.
    ///
    /// The first cycle fires immediately at startup.
    pub cycle_interval: Duration,

    /// Deadline for a single cycle.
    ///
    /// A cycle that has not committed by then is dropped; its in-memory
    /// updates are discarded and the store keeps its last committed state.
    pub cycle_timeout: Duration,

    /// Maximum number of compute workers a cycle fans out to.
    pub workers: usize,

    /// Seed for reproducible runs. `None` seeds every worker from OS entropy.
    pub rng_seed: Option<u64>,

    /// Emit JSON logs instead of the pretty human format.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://ticker_dev.db?mode=rwc".to_string());

        let default_workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(Self {
            database_url,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 16)?,

            // Five-minute cadence, one minute to finish.
            cycle_interval: Duration::from_secs(parse_or(&get, "CYCLE_INTERVAL_SECS", 300)?),
            cycle_timeout: Duration::from_secs(parse_or(&get, "CYCLE_TIMEOUT_SECS", 60)?),

            workers: parse_or(&get, "TICKER_WORKERS", default_workers)?.max(1),
            rng_seed: parse_opt(&get, "TICKER_RNG_SEED")?,

            json_logs: get("APP_ENV").as_deref() == Some("production"),
        })
    }

    pub fn rng_factory(&self) -> Arc<dyn RandomSourceFactory> {
        match self.rng_seed {
            Some(seed) => Arc::new(SeededRandomFactory::new(seed)),
            None => Arc::new(EntropyRandomFactory),
        }
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => {
            let v = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {key}: {raw:?}"))?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

pub mod aggregation;
pub mod db;
pub mod features;
pub mod ingest;
pub mod labels;
pub mod metrics;
pub mod settings;
pub mod stdio;
pub mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use db::Database;
use ingest::IngestController;
use metrics::IngestMetrics;
use settings::{EngineSettings, SettingsStore};

const DATA_DIR_ENV: &str = "MOTORSKILL_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "./motorskill-data";

pub struct AppState {
    pub db: Database,
    pub ingest: IngestController,
    pub metrics: IngestMetrics,
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Open the database and settings under `data_dir` and start the ingest
    /// worker. Must be called from within a tokio runtime.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let database = Database::new(data_dir.join("motorskill.sqlite3"))?;
        Ok(Self::with_parts(database, settings))
    }

    pub fn with_parts(db: Database, settings: SettingsStore) -> Self {
        let settings = Arc::new(settings);
        let metrics = IngestMetrics::new();
        let ingest = IngestController::spawn(db.clone(), settings.clone(), metrics.clone());

        Self {
            db,
            ingest,
            metrics,
            settings,
        }
    }
}

pub async fn get_engine_settings(state: &AppState) -> Result<EngineSettings, String> {
    Ok(state.settings.snapshot())
}

/// Replace the engine settings. Bucket capacities apply to buckets opened
/// after the change; existing buckets keep theirs.
pub async fn update_engine_settings(
    state: &AppState,
    settings: EngineSettings,
) -> Result<EngineSettings, String> {
    state
        .settings
        .update(settings)
        .map_err(|e| e.to_string())?;
    Ok(state.settings.snapshot())
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("motorskill starting up...");

    if let Err(err) = serve_stdio() {
        log::error!("motorskill exited with error: {err:?}");
        std::process::exit(1);
    }
}

fn serve_stdio() -> Result<()> {
    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(async move {
        let state = AppState::open(&data_dir)?;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let result = stdio::serve(&state, stdin, tokio::io::stdout()).await;

        state.ingest.shutdown().await?;
        result
    })
}

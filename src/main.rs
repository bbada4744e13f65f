#![forbid(unsafe_code)]

mod config;
mod constants;
mod error;
mod export;
mod gui;
mod hotkeys;
mod model;
mod persistence;
mod views;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::Config;
use constants::storage::{ACTIVE_VIEW_KEY, VIEWS_KEY};
use export::ExportPipeline;
use persistence::{Document, LocalStorage, ViewStore};
use views::ViewSwitcher;

/// Garment technical production sheet editor
#[derive(Parser, Debug)]
#[command(name = "ficha-tecnica", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the autosaved sheet (overrides the configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// View to open instead of the remembered one (vista1..vista4)
    #[arg(long)]
    view: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a saved sheet to PDF without opening the editor
    Export {
        /// Saved sheet (.json)
        #[arg(long)]
        input: PathBuf,

        /// Output file (defaults to today's name in the downloads folder)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Erase the autosaved sheet and the remembered view
    Clear,
}

fn init_logging() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;
    Ok(())
}

/// Run the export pipeline over a saved sheet, isolated from the autosave slot
fn export_headless(config: &Config, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let document = Document::load_from(input)?;

    let scratch = std::env::temp_dir().join(format!("ficha-tecnica-export-{}", std::process::id()));
    let mut switcher = ViewSwitcher::new(ViewStore::open(LocalStorage::open(&scratch)));
    switcher.replace_all(document.views)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let pipeline = ExportPipeline::from_settings(config.export.clone());
    let outcome = runtime.block_on(pipeline.export_all(&mut switcher));

    if let Err(e) = fs::remove_dir_all(&scratch) {
        info!(dir = %scratch.display(), error = %e, "Scratch directory left behind");
    }
    let outcome = outcome?;

    for failure in &outcome.failures {
        error!(error = %failure, "View missing from the export");
    }

    let path = match output {
        Some(path) => {
            fs::write(&path, &outcome.bytes)
                .with_context(|| format!("Failed to write PDF to {:?}", path))?;
            path
        }
        None => export::write_download(&outcome.bytes, &export::download_dir())?,
    };
    info!(path = %path.display(), pages = outcome.pages, "Exported sheet");
    println!("{}", path.display());
    Ok(())
}

fn clear_local_state(storage: LocalStorage) -> Result<()> {
    storage.remove_item(ACTIVE_VIEW_KEY)?;
    let mut store = ViewStore::open(storage);
    store.clear();
    let storage = store.storage();
    if storage.get_item(VIEWS_KEY)?.is_some() {
        anyhow::bail!("Failed to erase the autosaved sheet in {}", storage.dir().display());
    }
    info!(dir = %storage.dir().display(), "Cleared local state");
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::path);
    let mut config = Config::load_from(&config_path)?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    let storage = config.storage.open_storage();

    match cli.command {
        None => gui::run_gui(config, storage, cli.view),
        Some(Command::Export { input, output }) => export_headless(&config, &input, output),
        Some(Command::Clear) => clear_local_state(storage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ViewData, ViewName};

    #[test]
    fn test_clear_erases_sheet_and_active_view() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        let mut store = ViewStore::open(storage.clone());
        let mut data = ViewData::new();
        data.set_text("articulo", "A-99");
        store.set(ViewName::Vista1, data);
        storage.set_item(ACTIVE_VIEW_KEY, "vista3").unwrap();

        clear_local_state(storage.clone()).unwrap();

        assert_eq!(storage.get_item(VIEWS_KEY).unwrap(), None);
        assert_eq!(storage.get_item(ACTIVE_VIEW_KEY).unwrap(), None);
        assert!(ViewStore::open(storage).get(ViewName::Vista1).is_empty());
    }

    #[test]
    fn test_clear_on_empty_storage_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        clear_local_state(LocalStorage::open(dir.path().join("fresh"))).unwrap();
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{config, export, storage};
use crate::persistence::LocalStorage;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub window: WindowSettings,
}

/// PDF export: page geometry, waits and rasterizer font
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_document_title")]
    pub document_title: String,
    #[serde(default = "default_page_width_mm")]
    pub page_width_mm: f32,
    #[serde(default = "default_page_height_mm")]
    pub page_height_mm: f32,
    #[serde(default = "default_margin_mm")]
    pub margin_mm: f32,
    #[serde(default = "default_title_band_mm")]
    pub title_band_mm: f32,
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_font_name")]
    pub font_name: String,
    #[serde(default = "default_raster_width_px")]
    pub raster_width_px: u32,
}

/// Local durable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    /// Per-slot byte limit; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_window_width")]
    pub width: f32,
    #[serde(default = "default_window_height")]
    pub height: f32,
}

// Default value functions
fn default_document_title() -> String {
    export::DOCUMENT_TITLE.to_string()
}

fn default_page_width_mm() -> f32 {
    export::PAGE_WIDTH_MM
}

fn default_page_height_mm() -> f32 {
    export::PAGE_HEIGHT_MM
}

fn default_margin_mm() -> f32 {
    export::MARGIN_MM
}

fn default_title_band_mm() -> f32 {
    export::TITLE_BAND_MM
}

fn default_image_timeout_ms() -> u64 {
    export::IMAGE_TIMEOUT_MS
}

fn default_settle_delay_ms() -> u64 {
    export::SETTLE_DELAY_MS
}

fn default_font_name() -> String {
    export::FONT_NAME.to_string()
}

fn default_raster_width_px() -> u32 {
    export::RASTER_WIDTH_PX
}

fn default_autosave_interval_secs() -> u64 {
    storage::AUTOSAVE_INTERVAL_SECS
}

fn default_window_width() -> f32 {
    crate::gui::constants::WINDOW_WIDTH
}

fn default_window_height() -> f32 {
    crate::gui::constants::WINDOW_HEIGHT
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            document_title: default_document_title(),
            page_width_mm: default_page_width_mm(),
            page_height_mm: default_page_height_mm(),
            margin_mm: default_margin_mm(),
            title_band_mm: default_title_band_mm(),
            image_timeout_ms: default_image_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            font_name: default_font_name(),
            raster_width_px: default_raster_width_px(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_interval_secs: default_autosave_interval_secs(),
            quota_bytes: None,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl StorageSettings {
    /// Configured data directory or the platform default
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(LocalStorage::default_dir)
    }

    pub fn open_storage(&self) -> LocalStorage {
        LocalStorage::open(self.data_dir()).with_quota(self.quota_bytes)
    }
}

impl Config {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(storage::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", path))?;

        config.validate_and_clamp();
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {:?}", path))?;

        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Pull out-of-range values back into range
    pub fn validate_and_clamp(&mut self) {
        use crate::constants::validation::*;

        let ex = &mut self.export;

        for (name, value) in [
            ("page_width_mm", &mut ex.page_width_mm),
            ("page_height_mm", &mut ex.page_height_mm),
        ] {
            if !(MIN_PAGE_MM..=MAX_PAGE_MM).contains(&*value) {
                let clamped = (*value).clamp(MIN_PAGE_MM, MAX_PAGE_MM);
                warn!(setting = name, value = *value, clamped, "Page dimension out of range, clamping");
                *value = if clamped.is_nan() { MIN_PAGE_MM } else { clamped };
            }
        }

        if !(MIN_MARGIN_MM..=MAX_MARGIN_MM).contains(&ex.margin_mm) {
            warn!(margin_mm = ex.margin_mm, max = MAX_MARGIN_MM, "margin_mm out of range, clamping");
            ex.margin_mm = ex.margin_mm.clamp(MIN_MARGIN_MM, MAX_MARGIN_MM);
        }

        if !(ex.title_band_mm >= 0.0) {
            warn!(title_band_mm = ex.title_band_mm, "title_band_mm is negative, using default");
            ex.title_band_mm = default_title_band_mm();
        }

        // The raster needs some room left on the page
        let printable_width = ex.page_width_mm - 2.0 * ex.margin_mm;
        let printable_height = ex.page_height_mm - 2.0 * ex.margin_mm - ex.title_band_mm;
        if printable_width <= 0.0 || printable_height <= 0.0 {
            warn!(
                printable_width,
                printable_height,
                "Margins leave no printable area, using default margin and title band"
            );
            ex.margin_mm = default_margin_mm();
            ex.title_band_mm = default_title_band_mm();
            if ex.page_width_mm - 2.0 * ex.margin_mm <= 0.0
                || ex.page_height_mm - 2.0 * ex.margin_mm - ex.title_band_mm <= 0.0
            {
                ex.page_width_mm = default_page_width_mm();
                ex.page_height_mm = default_page_height_mm();
            }
        }

        if ex.image_timeout_ms > MAX_IMAGE_TIMEOUT_MS {
            warn!(image_timeout_ms = ex.image_timeout_ms, max = MAX_IMAGE_TIMEOUT_MS, "image_timeout_ms exceeds maximum, clamping");
            ex.image_timeout_ms = MAX_IMAGE_TIMEOUT_MS;
        }

        if ex.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            warn!(settle_delay_ms = ex.settle_delay_ms, max = MAX_SETTLE_DELAY_MS, "settle_delay_ms exceeds maximum, clamping");
            ex.settle_delay_ms = MAX_SETTLE_DELAY_MS;
        }

        if ex.raster_width_px < MIN_RASTER_WIDTH_PX {
            warn!(raster_width_px = ex.raster_width_px, min = MIN_RASTER_WIDTH_PX, "raster_width_px below minimum, clamping");
            ex.raster_width_px = MIN_RASTER_WIDTH_PX;
        } else if ex.raster_width_px > MAX_RASTER_WIDTH_PX {
            warn!(raster_width_px = ex.raster_width_px, max = MAX_RASTER_WIDTH_PX, "raster_width_px exceeds maximum, clamping");
            ex.raster_width_px = MAX_RASTER_WIDTH_PX;
        }

        if ex.font_name.trim().is_empty() {
            warn!(using = export::FONT_NAME, "font_name is empty, using default");
            ex.font_name = default_font_name();
        }

        let st = &mut self.storage;
        if st.autosave_interval_secs < MIN_AUTOSAVE_SECS {
            warn!(autosave_interval_secs = st.autosave_interval_secs, min = MIN_AUTOSAVE_SECS, "autosave_interval_secs below minimum, clamping");
            st.autosave_interval_secs = MIN_AUTOSAVE_SECS;
        } else if st.autosave_interval_secs > MAX_AUTOSAVE_SECS {
            warn!(autosave_interval_secs = st.autosave_interval_secs, max = MAX_AUTOSAVE_SECS, "autosave_interval_secs exceeds maximum, clamping");
            st.autosave_interval_secs = MAX_AUTOSAVE_SECS;
        }

        let win = &mut self.window;
        for (name, value) in [("width", &mut win.width), ("height", &mut win.height)] {
            if !(MIN_WINDOW_DIMENSION..=MAX_WINDOW_DIMENSION).contains(&*value) {
                warn!(setting = name, value = *value, "Window dimension out of range, clamping");
                let clamped = (*value).clamp(MIN_WINDOW_DIMENSION, MAX_WINDOW_DIMENSION);
                *value = if clamped.is_nan() { MIN_WINDOW_DIMENSION } else { clamped };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "export": { "document_title": "Temporada 2027" } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.export.document_title, "Temporada 2027");
        assert_eq!(config.export.margin_mm, export::MARGIN_MM);
        assert_eq!(config.storage.autosave_interval_secs, storage::AUTOSAVE_INTERVAL_SECS);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ export: ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.export.margin_mm = 90.0;
        config.export.raster_width_px = 10;
        config.export.image_timeout_ms = 1_000_000;
        config.storage.autosave_interval_secs = 1;
        config.window.width = 100.0;

        config.validate_and_clamp();

        use crate::constants::validation::*;
        assert_eq!(config.export.margin_mm, MAX_MARGIN_MM);
        assert_eq!(config.export.raster_width_px, MIN_RASTER_WIDTH_PX);
        assert_eq!(config.export.image_timeout_ms, MAX_IMAGE_TIMEOUT_MS);
        assert_eq!(config.storage.autosave_interval_secs, MIN_AUTOSAVE_SECS);
        assert_eq!(config.window.width, MIN_WINDOW_DIMENSION);
    }

    #[test]
    fn test_margins_that_swallow_the_page_are_reset() {
        let mut config = Config::default();
        config.export.page_width_mm = 60.0;
        config.export.margin_mm = 40.0;

        config.validate_and_clamp();

        assert_eq!(config.export.margin_mm, export::MARGIN_MM);
        assert!(config.export.page_width_mm - 2.0 * config.export.margin_mm > 0.0);
    }

    #[test]
    fn test_storage_override() {
        let settings = StorageSettings {
            data_dir: Some(PathBuf::from("/tmp/fichas")),
            ..StorageSettings::default()
        };
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/fichas"));
    }
}

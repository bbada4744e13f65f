//! Saved document format (user-initiated save/load)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::constants::document::FORMAT_VERSION;
use crate::error::AppError;
use crate::model::{ViewDataMap, ViewName};

/// The full persisted unit written by "save" and read by "load"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub views: ViewDataMap,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl Document {
    pub fn new(views: ViewDataMap) -> Self {
        Self {
            version: default_version(),
            timestamp: Utc::now(),
            views,
        }
    }

    /// Parse and shape-check a document. Nothing is mutated on failure.
    pub fn parse(contents: &str) -> std::result::Result<Self, AppError> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| AppError::Validation(format!("the file is not valid JSON: {e}")))?;

        let views = value
            .get("views")
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::Validation("the file has no 'views' object".to_string()))?;

        let missing: Vec<&str> = ViewName::ALL
            .iter()
            .map(|view| view.id())
            .filter(|id| !views.contains_key(*id))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "the file is missing views: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("the file has an unexpected shape: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document to JSON")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write document to {:?}", path))?;
        info!(path = %path.display(), "Saved document");
        Ok(())
    }

    /// Read a document from disk. I/O problems are `anyhow` errors, shape
    /// problems come back as `AppError::Validation` inside the chain.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document from {:?}", path))?;
        let document = Self::parse(&contents)?;
        info!(path = %path.display(), version = %document.version, "Loaded document");
        Ok(document)
    }
}

//! Harvest configuration.
//!
//! A single [`HarvestConfig`] is built at startup and handed to the pipeline.
//! Values come from a TOML file (every key optional, defaults fill the rest),
//! then CLI flags override individual fields.

use crate::dblp::DBLP_API_BASE;
use crate::error::{HarvestError, Result};
use crate::semanticscholar::SS_API_BASE;
use crate::sheets::{DRIVE_API_BASE, SHEETS_API_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "paperharvest.toml";

/// Run configuration for a harvest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Search keywords, processed in order
    pub keywords: Vec<String>,
    /// DBLP hit cap per keyword
    pub max_results_per_keyword: usize,
    /// CSV file holding the corpus
    pub output_file: PathBuf,
    /// Pause after each DBLP request
    pub index_delay_ms: u64,
    /// Pause after each enriched record
    pub abstract_delay_ms: u64,
    /// Mirror the result to Google Sheets after saving
    pub publish_to_sheet: bool,
    pub sheet_name: String,
    /// Service-account key file
    pub credentials_path: PathBuf,
    pub semantic_scholar_api_key: Option<String>,
    pub endpoints: Endpoints,
}

/// Remote service base URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub dblp: String,
    pub semantic_scholar: String,
    pub google_drive: String,
    pub google_sheets: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            dblp: DBLP_API_BASE.to_string(),
            semantic_scholar: SS_API_BASE.to_string(),
            google_drive: DRIVE_API_BASE.to_string(),
            google_sheets: SHEETS_API_BASE.to_string(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["learnable item tokenization".to_string()],
            max_results_per_keyword: 50,
            output_file: PathBuf::from("papers_with_abstract.csv"),
            index_delay_ms: 200,
            abstract_delay_ms: 200,
            publish_to_sheet: false,
            sheet_name: "Literature Search Results".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            semantic_scholar_api_key: None,
            endpoints: Endpoints::default(),
        }
    }
}

/// Platform config path: `<config_dir>/paperharvest/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperharvest").join("config.toml"))
}

impl HarvestConfig {
    pub fn index_delay(&self) -> Duration {
        Duration::from_millis(self.index_delay_ms)
    }

    pub fn abstract_delay(&self) -> Duration {
        Duration::from_millis(self.abstract_delay_ms)
    }

    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a specific file, which must exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
    }

    /// Resolve the config file to use.
    ///
    /// An explicit path must exist. Otherwise `./paperharvest.toml`, then the
    /// platform config file, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from_path(&local);
        }

        match config_path() {
            Some(platform) if platform.exists() => Self::load_from_path(&platform),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(HarvestError::Config("No keywords configured".to_string()));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(HarvestError::Config("Keywords must not be blank".to_string()));
        }
        if self.max_results_per_keyword == 0 {
            return Err(HarvestError::Config(
                "max_results_per_keyword must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("dblp", &self.endpoints.dblp),
            ("semantic_scholar", &self.endpoints.semantic_scholar),
            ("google_drive", &self.endpoints.google_drive),
            ("google_sheets", &self.endpoints.google_sheets),
        ] {
            Url::parse(value).map_err(|e| {
                HarvestError::Config(format!("Invalid {} endpoint {:?}: {}", name, value, e))
            })?;
        }

        Ok(())
    }
}

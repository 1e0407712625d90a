use chrono::Local;
use directories::{BaseDirs, ProjectDirs, UserDirs};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::model::{PartyInfo, due_after};

const DEFAULT_SETTINGS_TEMPLATE: &str = include_str!("../assets/settings.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where exported PDFs land. May start with `~`.
    pub output_dir: String,
    pub currency: String,
    pub tax_percent: f64,
    #[serde(default = "default_payment_terms")]
    pub payment_terms_days: i64,
    #[serde(default)]
    pub notes: String,
    pub business: PartyInfo,
}

fn default_payment_terms() -> i64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        let output_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(|d| d.to_string_lossy().to_string()))
            .unwrap_or_else(|| "~/Downloads".to_string());
        Settings {
            output_dir,
            currency: "$".into(),
            tax_percent: 10.0,
            payment_terms_days: default_payment_terms(),
            notes: "Thank you for your business!".into(),
            business: PartyInfo::sample_business(),
        }
    }
}

impl Settings {
    /// Missing file means defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Rejects payment terms that push the due date off the calendar.
    pub fn validate(&self) -> Result<()> {
        let today = Local::now().date_naive();
        if due_after(today, self.payment_terms_days).is_none() {
            return Err(AppError::SettingsInvalid(format!(
                "payment_terms_days = {} is out of range",
                self.payment_terms_days
            )));
        }
        Ok(())
    }

    /// Loads the settings, writing the bundled template first if the file is absent.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            info!("Initializing default settings at {:?}", path);
            fs::write(path, DEFAULT_SETTINGS_TEMPLATE)?;
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.output_dir))
    }
}

pub fn default_settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "invoice-generator", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Optional `config.toml` plus environment overrides.

use crate::i18n::Language;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "BudgetIQ", "budgetiq"));

pub const DB_ENV: &str = "BUDGETIQ_DB";
pub const CONFIG_ENV: &str = "BUDGETIQ_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub base_currency: String,
    pub language: String,
    pub login_latency_ms: u64,
    pub receipt_latency_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: "warn".to_string(),
            base_currency: "USD".to_string(),
            language: "en".to_string(),
            login_latency_ms: 1500,
            receipt_latency_ms: 2000,
        }
    }
}

impl AppConfig {
    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from(APP.0, APP.1, APP.2)
            .context("Could not determine platform-specific data dir")
    }

    /// Reads `$BUDGETIQ_CONFIG` or `<config_dir>/config.toml`; a missing file
    /// yields defaults.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => Self::project_dirs()?.config_dir().join("config.toml"),
        };
        let mut cfg = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Read config {}", path.display()))?;
            Self::from_toml(&raw).with_context(|| format!("Parse config {}", path.display()))?
        } else {
            Self::default()
        };
        if let Some(db) = std::env::var_os(DB_ENV) {
            cfg.db_path = Some(PathBuf::from(db));
        }
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn default_language(&self) -> Language {
        self.language.parse().unwrap_or_default()
    }

    pub fn login_latency(&self) -> Duration {
        Duration::from_millis(self.login_latency_ms)
    }

    pub fn receipt_latency(&self) -> Duration {
        Duration::from_millis(self.receipt_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml("language = \"ml\"\nlogin_latency_ms = 0\n").unwrap();
        assert_eq!(cfg.default_language(), Language::Ml);
        assert_eq!(cfg.login_latency(), Duration::ZERO);
        assert_eq!(cfg.receipt_latency_ms, 2000);
        assert_eq!(cfg.base_currency, "USD");
    }

    #[test]
    fn bad_language_falls_back() {
        let cfg = AppConfig::from_toml("language = \"xx\"").unwrap();
        assert_eq!(cfg.default_language(), Language::En);
    }
}

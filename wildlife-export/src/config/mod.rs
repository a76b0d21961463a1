//! Configuration de l'export
//!
//! Sources, de la plus faible à la plus forte: valeurs par défaut, fichier
//! JSON, variables d'environnement (`.env` accepté), options de la CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::export::{ExportOptions, DEFAULT_ENCODING, DEFAULT_EPSG};

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Code EPSG de destination
    #[serde(default = "default_epsg")]
    pub epsg: u32,

    /// Code page des attributs (CP932, UTF-8...)
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Écrire les couches en parallèle
    #[serde(default)]
    pub parallel: bool,

    /// Répertoire des fichiers temporaires
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_epsg() -> u32 {
    DEFAULT_EPSG
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            epsg: default_epsg(),
            encoding: default_encoding(),
            parallel: false,
            scratch_dir: None,
        }
    }
}

impl ExportConfig {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Configuration par défaut complétée par l'environnement
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Applique `EXPORT_EPSG`, `EXPORT_ENCODING`, `EXPORT_PARALLEL` et `EXPORT_SCRATCH_DIR`
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(epsg) = var("EXPORT_EPSG") {
            self.epsg = epsg
                .trim()
                .parse()
                .with_context(|| format!("Invalid EXPORT_EPSG: {}", epsg))?;
        }
        if let Some(encoding) = var("EXPORT_ENCODING") {
            self.encoding = encoding;
        }
        if let Some(parallel) = var("EXPORT_PARALLEL") {
            self.parallel = parse_bool(&parallel)
                .with_context(|| format!("Invalid EXPORT_PARALLEL: {}", parallel))?;
        }
        if let Some(dir) = var("EXPORT_SCRATCH_DIR") {
            self.scratch_dir = Some(PathBuf::from(dir));
        }
        Ok(self)
    }

    /// Options d'export correspondantes
    pub fn to_options(&self) -> ExportOptions {
        let mut options = ExportOptions::new(self.epsg)
            .with_encoding(self.encoding.clone())
            .with_parallel(self.parallel);
        options.scratch_dir = self.scratch_dir.clone();
        options
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}

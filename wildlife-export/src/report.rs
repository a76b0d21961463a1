//! Rapport d'export
//!
//! Résumé renvoyé par les points d'entrée: couches écrites, observations
//! écartées par motif, empreinte de l'archive.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use shpwrite::LayerFiles;

/// Organisation des couches dans l'archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Une couche par (date, individu, type de géométrie)
    #[default]
    Grouped,
    /// Deux couches: `flightlines` et `observations`
    Simple,
}

/// Couche écrite dans l'archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    /// Nom de base (sans extension)
    pub name: String,
    /// Type de shape (Point, PolyLine, Polygon)
    pub shape_type: String,
    /// Nombre d'enregistrements (shapes = lignes attributaires)
    pub records: usize,
}

impl From<&LayerFiles> for LayerSummary {
    fn from(files: &LayerFiles) -> Self {
        Self {
            name: files.name.clone(),
            shape_type: files.shape_type.to_string(),
            records: files.records,
        }
    }
}

/// Observations non exportées, par motif
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    /// Individu absent du filtre
    pub filtered: usize,
    /// Géométrie illisible ou incohérente
    pub malformed: usize,
    /// Type de géométrie sans couche dans la disposition choisie
    pub excluded: usize,
}

impl SkipStats {
    pub fn total(&self) -> usize {
        self.filtered + self.malformed + self.excluded
    }
}

/// Résumé complet d'un export
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub layout: Layout,
    pub target_epsg: u32,
    /// Nom du CRS de destination
    pub target_crs: String,
    /// Code page des attributs
    pub encoding: String,
    pub layers: Vec<LayerSummary>,
    /// Entrées de l'archive, triées
    pub entries: Vec<String>,
    pub skipped: SkipStats,
    /// Taille de l'archive en octets
    pub archive_size: u64,
    /// Empreinte BLAKE3 (hex) de l'archive
    pub checksum: String,
    /// Chemin final (export vers un fichier uniquement)
    pub output: Option<String>,
    pub duration_secs: f64,
}

impl ExportSummary {
    /// Nombre total d'observations exportées
    pub fn exported_features(&self) -> usize {
        self.layers.iter().map(|l| l.records).sum()
    }

    /// Définit la durée de l'export
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXPORT REPORT - EPSG:{} ({})", self.target_epsg, self.target_crs);
        println!("{}", "=".repeat(60));

        println!("\nLayout: {:?}", self.layout);
        println!("Encoding: {}", self.encoding);
        println!("Duration: {:.2}s", self.duration_secs);
        if let Some(ref output) = self.output {
            println!("Archive: {}", output);
        }
        println!("Size: {} bytes, blake3 {}", self.archive_size, self.checksum);

        println!("\n--- SUMMARY ---");
        println!(
            "Observations: {} exported, {} skipped ({} filtered, {} malformed, {} excluded)",
            self.exported_features(),
            self.skipped.total(),
            self.skipped.filtered,
            self.skipped.malformed,
            self.skipped.excluded
        );

        if !self.layers.is_empty() {
            println!("\n--- LAYERS ({}) ---", self.layers.len());
            for layer in self.layers.iter().take(50) {
                println!("  {} [{}]: {} records", layer.name, layer.shape_type, layer.records);
            }
            if self.layers.len() > 50 {
                println!("  ... and {} more", self.layers.len() - 50);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "EPSG:{}: {} layers, {} observations, {} skipped",
            self.target_epsg,
            self.layers.len(),
            self.exported_features(),
            self.skipped.total()
        )
    }
}

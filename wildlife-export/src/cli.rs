//! Définition et implémentation des commandes CLI
//!
//! - `export`: une couche par (date, individu, type de géométrie)
//! - `simple`: deux couches `flightlines` / `observations`
//! - `crs`: systèmes de coordonnées de destination supportés

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use tracing::info;

use wildlife_export::crs::{lookup, supported_codes};
use wildlife_export::loader::{load_features, SurveyDates};
use wildlife_export::{export_to_path, ExportConfig, Layout};

#[derive(Subcommand)]
pub enum Commands {
    /// Export one shapefile layer per (survey date, individual, geometry type)
    Export(ExportArgs),

    /// Export two layers: flightlines (lines) and observations (points)
    Simple(ExportArgs),

    /// List supported destination EPSG codes, or print the WKT of one
    Crs {
        /// EPSG code whose WKT should be printed
        #[arg(long)]
        epsg: Option<u32>,
    },
}

#[derive(Args)]
pub struct ExportArgs {
    /// GeoJSON FeatureCollection of observations (EPSG:4326)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output ZIP archive
    #[arg(short, long)]
    pub output: PathBuf,

    /// Destination EPSG code (défaut : config / env EXPORT_EPSG / 6677)
    #[arg(long)]
    pub epsg: Option<u32>,

    /// Attribute code page, e.g. CP932 or UTF-8 (défaut : env EXPORT_ENCODING / CP932)
    #[arg(long)]
    pub encoding: Option<String>,

    /// Only export these individuals (repeatable)
    #[arg(long = "individual")]
    pub individuals: Vec<String>,

    /// Survey date as SURVEY_ID=YYYY-MM-DD (repeatable)
    #[arg(long = "survey-date", value_parser = parse_survey_date)]
    pub survey_dates: Vec<(i64, NaiveDate)>,

    /// Write layers in parallel
    #[arg(long)]
    pub parallel: bool,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for temporary files
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Write the export report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Exécute un export
pub fn cmd_export(args: ExportArgs, layout: Layout) -> Result<()> {
    // Défauts < fichier < environnement < CLI
    let config = match &args.config {
        Some(path) => ExportConfig::load(path)?.with_env()?,
        None => ExportConfig::from_env()?,
    };

    let mut options = config.to_options().with_layout(layout);
    if let Some(epsg) = args.epsg {
        options.target_epsg = epsg;
    }
    if let Some(encoding) = args.encoding {
        options.encoding = encoding;
    }
    if args.parallel {
        options.parallel = true;
    }
    if let Some(dir) = args.scratch_dir {
        options.scratch_dir = Some(dir);
    }
    if !args.individuals.is_empty() {
        options = options.with_individual_filter(args.individuals);
    }

    let survey_dates: SurveyDates = args.survey_dates.into_iter().collect();
    let features = load_features(&args.input, &survey_dates)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let summary = export_to_path(&features, &args.output, &options)
        .with_context(|| format!("Failed to export to {}", args.output.display()))?;

    info!("{}", summary.summary());
    summary.display();

    if let Some(report) = args.report {
        summary
            .save_to_file(&report)
            .with_context(|| format!("Failed to write report {}", report.display()))?;
        info!(report = %report.display(), "Report saved");
    }

    Ok(())
}

/// Liste les CRS supportés, ou affiche le WKT de l'un d'eux
pub fn cmd_crs(epsg: Option<u32>) -> Result<()> {
    match epsg {
        Some(code) => {
            let definition =
                lookup(code).with_context(|| format!("EPSG:{} is not supported", code))?;
            println!("{}", definition.wkt());
        }
        None => {
            for code in supported_codes() {
                if let Some(definition) = lookup(code) {
                    println!("{:>6}  {}", code, definition.name);
                }
            }
        }
    }
    Ok(())
}

/// Valide un couple `SURVEY_ID=YYYY-MM-DD`
fn parse_survey_date(value: &str) -> Result<(i64, NaiveDate), String> {
    let (id, date) = value
        .split_once('=')
        .ok_or_else(|| format!("Invalid survey date '{}'. Expected SURVEY_ID=YYYY-MM-DD", value))?;

    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| format!("Invalid survey id in '{}'", value))?;
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date in '{}'. Expected YYYY-MM-DD", value))?;

    Ok((id, date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_survey_date_valid() {
        assert_eq!(
            parse_survey_date("1=2025-09-08").unwrap(),
            (1, NaiveDate::from_ymd_opt(2025, 9, 8).unwrap())
        );
        assert_eq!(
            parse_survey_date(" 42 = 2024-02-29 ").unwrap(),
            (42, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_parse_survey_date_invalid() {
        assert!(parse_survey_date("2025-09-08").is_err());
        assert!(parse_survey_date("a=2025-09-08").is_err());
        assert!(parse_survey_date("1=2025-13-01").is_err());
        assert!(parse_survey_date("1=2023-02-29").is_err());
        assert!(parse_survey_date("1=20250908").is_err());
        assert!(parse_survey_date("").is_err());
    }

    #[test]
    fn test_cmd_crs() {
        assert!(cmd_crs(Some(6677)).is_ok());
        assert!(cmd_crs(Some(2154)).is_err());
    }
}

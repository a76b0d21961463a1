//! Pipeline d'export: regroupement, projection, écriture des couches, archive
//!
//! Les couches sont écrites dans un répertoire temporaire propre à l'appel,
//! l'archive est construite dans un fichier temporaire puis renommée vers sa
//! destination (ou relue en mémoire). Rien de partiel n'atteint la cible.

pub mod archive;
pub mod encode;
pub mod group;
pub mod layer;
pub mod simple;

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use shpwrite::{CodePage, LayerFiles};
use tracing::{debug, info};

use crate::crs::{CoordinateTransformer, SOURCE_EPSG};
use crate::error::ExportError;
use crate::model::ObservationFeature;
use crate::report::{ExportSummary, LayerSummary, Layout, SkipStats};

pub use group::{
    date_prefix, group_features, unique_layer_names, GroupKey, GroupedFeature, Grouping,
};
pub use layer::{grouped_fields, LayerContext};

/// EPSG par défaut: JGD2011 / Japan Plane Rectangular CS IX (Tokyo)
pub const DEFAULT_EPSG: u32 = 6677;
/// Code page par défaut des attributs
pub const DEFAULT_ENCODING: &str = "CP932";

/// Options d'un export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Code EPSG de destination
    pub target_epsg: u32,
    /// Libellé de la code page des attributs
    pub encoding: String,
    /// Individus à exporter (`None` = tous)
    pub individual_filter: Option<HashSet<String>>,
    /// Écrire les couches en parallèle (rayon)
    pub parallel: bool,
    /// Répertoire des fichiers temporaires (défaut: répertoire temporaire système)
    pub scratch_dir: Option<PathBuf>,
    pub layout: Layout,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            target_epsg: DEFAULT_EPSG,
            encoding: DEFAULT_ENCODING.to_string(),
            individual_filter: None,
            parallel: false,
            scratch_dir: None,
            layout: Layout::Grouped,
        }
    }
}

impl ExportOptions {
    pub fn new(target_epsg: u32) -> Self {
        Self {
            target_epsg,
            ..Default::default()
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_individual_filter<I, S>(mut self, individuals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.individual_filter = Some(individuals.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

/// CRS et encodage validés avant toute écriture
struct Prepared {
    transformer: CoordinateTransformer,
    code_page: CodePage,
}

fn prepare(options: &ExportOptions) -> Result<Prepared, ExportError> {
    let transformer = CoordinateTransformer::new(SOURCE_EPSG, options.target_epsg)?;
    let code_page = CodePage::from_label(&options.encoding)
        .map_err(|_| ExportError::UnsupportedEncoding(options.encoding.clone()))?;
    Ok(Prepared {
        transformer,
        code_page,
    })
}

/// Exporte vers une archive ZIP à `target_path`
///
/// L'archive est construite dans un fichier temporaire du même répertoire puis
/// renommée: en cas d'erreur, rien n'est créé à `target_path`.
pub fn export_to_path(
    features: &[ObservationFeature],
    target_path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let prepared = prepare(options)?;

    let parent = match target_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".wildlife-export-")
        .suffix(".zip.part")
        .tempfile_in(parent)?;

    let mut summary = build_archive(features, options, &prepared, staged.as_file_mut())?;
    summary.checksum = compute_file_checksum(staged.path())?;

    staged.persist(target_path).map_err(|e| ExportError::Io(e.error))?;
    summary.output = Some(target_path.display().to_string());

    info!(
        output = %target_path.display(),
        layers = summary.layers.len(),
        bytes = summary.archive_size,
        "Export complete"
    );

    Ok(summary)
}

/// Exporte et renvoie les octets de l'archive
pub fn export_to_bytes(
    features: &[ObservationFeature],
    options: &ExportOptions,
) -> Result<(Vec<u8>, ExportSummary), ExportError> {
    let prepared = prepare(options)?;

    let mut staged = match &options.scratch_dir {
        Some(dir) => tempfile::tempfile_in(dir)?,
        None => tempfile::tempfile()?,
    };
    let mut summary = build_archive(features, options, &prepared, &mut staged)?;

    staged.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::with_capacity(summary.archive_size as usize);
    staged.read_to_end(&mut bytes)?;
    summary.checksum = blake3::hash(&bytes).to_hex().to_string();

    info!(
        layers = summary.layers.len(),
        bytes = bytes.len(),
        "Export complete"
    );

    Ok((bytes, summary))
}

/// Écrit les couches dans un répertoire temporaire et les compresse dans `archive`
fn build_archive(
    features: &[ObservationFeature],
    options: &ExportOptions,
    prepared: &Prepared,
    archive: &mut File,
) -> Result<ExportSummary, ExportError> {
    let start = Instant::now();

    // Date unique pour tout l'export (dates de relevé inconnues, en-têtes dBASE)
    let today = chrono::Utc::now().date_naive();

    let mut builder = tempfile::Builder::new();
    builder.prefix("wildlife-export-");
    let scratch = match &options.scratch_dir {
        Some(dir) => builder.tempdir_in(dir)?,
        None => builder.tempdir()?,
    };
    debug!(scratch = %scratch.path().display(), "Scratch directory created");

    let ctx = LayerContext {
        transformer: &prepared.transformer,
        code_page: prepared.code_page,
        update_date: today,
    };

    info!(
        features = features.len(),
        epsg = options.target_epsg,
        layout = ?options.layout,
        parallel = options.parallel,
        "Exporting observations"
    );

    let (layers, skipped) = match options.layout {
        Layout::Grouped => write_grouped_layers(scratch.path(), features, options, &ctx)?,
        Layout::Simple => simple::write_simple_layers(
            scratch.path(),
            features,
            options.individual_filter.as_ref(),
            &ctx,
        )?,
    };

    let entries = archive::write_archive(scratch.path(), &mut *archive)?;
    archive.flush()?;
    let archive_size = archive.seek(SeekFrom::End(0))?;

    let mut summary = ExportSummary {
        layout: options.layout,
        target_epsg: prepared.transformer.target_epsg(),
        target_crs: prepared.transformer.target_name().to_string(),
        encoding: prepared.code_page.cpg_label().to_string(),
        layers: layers.iter().map(LayerSummary::from).collect(),
        entries,
        skipped,
        archive_size,
        checksum: String::new(),
        output: None,
        duration_secs: 0.0,
    };
    summary.set_duration(start.elapsed());

    Ok(summary)
}

/// Une couche par groupe, séquentiellement ou en parallèle
fn write_grouped_layers(
    dir: &Path,
    features: &[ObservationFeature],
    options: &ExportOptions,
    ctx: &LayerContext<'_>,
) -> Result<(Vec<LayerFiles>, SkipStats), ExportError> {
    let fallback_date = ctx.update_date;
    let grouping = group_features(features, options.individual_filter.as_ref(), fallback_date);

    // Noms fixés avant toute écriture: aucune couche n'écrase une autre
    let names = unique_layer_names(grouping.groups.keys());
    let jobs: Vec<_> = grouping.groups.iter().zip(&names).collect();

    let layers = if options.parallel {
        jobs.par_iter()
            .map(|((key, members), name)| layer::write_group(dir, name, key, members, ctx))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        jobs.iter()
            .map(|((key, members), name)| layer::write_group(dir, name, key, members, ctx))
            .collect::<Result<Vec<_>, _>>()?
    };

    let skipped = SkipStats {
        filtered: grouping.filtered,
        malformed: grouping.malformed,
        excluded: 0,
    };

    Ok((layers, skipped))
}

/// Calcule le checksum blake3 d'un fichier
fn compute_file_checksum(path: &Path) -> Result<String, ExportError> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

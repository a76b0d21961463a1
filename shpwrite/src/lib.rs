//! # shpwrite
//!
//! Écriture de couches ESRI Shapefile: géométrie (`.shp` + index `.shx`),
//! table attributaire dBASE III (`.dbf`), projection (`.prj`) et code page (`.cpg`).
//!
//! ## Features
//!
//! - Types Point, PolyLine et Polygon (enregistrements Null acceptés partout)
//! - Géométries `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//! - Code page configurable via `encoding_rs` (CP932 par défaut), textes tronqués à la largeur du champ
//! - Le nombre de shapes et d'enregistrements attributaires reste toujours identique
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shpwrite::{CodePage, FieldDef, LayerWriter, Shape, ShapeType};
//! use geo::Coord;
//!
//! let fields = vec![FieldDef::integer("obs_id", 18), FieldDef::character("species", 50)];
//! let mut layer = LayerWriter::new("out/", "20250908_A_point", ShapeType::Point, fields, CodePage::default())?;
//! layer.write(&Shape::Point(Coord { x: -5000.0, y: 12000.0 }), &[1.into(), "Hawk".into()])?;
//! let files = layer.finish(wkt)?;
//! ```

mod dbf;
pub mod encoding;
pub mod error;
mod shp;
pub mod types;

pub use encoding::CodePage;
pub use error::ShapefileError;
pub use shp::HEADER_LEN;
pub use types::{FieldDef, FieldType, FieldValue, LayerFiles, Shape, ShapeType};

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use dbf::DbfBuffer;
use shp::ShpBuffer;

/// Écrit une couche complète
///
/// Les shapes et les enregistrements sont accumulés en mémoire, les fichiers
/// sont écrits d'un coup par [`LayerWriter::finish`].
#[derive(Debug)]
pub struct LayerWriter {
    dir: PathBuf,
    name: String,
    shape_type: ShapeType,
    code_page: CodePage,
    updated: NaiveDate,
    shp: ShpBuffer,
    dbf: DbfBuffer,
}

impl LayerWriter {
    /// Prépare une couche `name` dans le répertoire `dir`
    ///
    /// # Errors
    ///
    /// `UnsupportedGeometry` si le type n'est pas Point, PolyLine ou Polygon,
    /// `InvalidField` si le schéma est invalide.
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        shape_type: ShapeType,
        fields: Vec<FieldDef>,
        code_page: CodePage,
    ) -> Result<Self, ShapefileError> {
        if !shape_type.is_writable() {
            return Err(ShapefileError::UnsupportedGeometry(shape_type));
        }

        Ok(Self {
            dir: dir.into(),
            name: name.into(),
            shape_type,
            code_page,
            updated: chrono::Utc::now().date_naive(),
            shp: ShpBuffer::new(shape_type),
            dbf: DbfBuffer::new(fields, code_page)?,
        })
    }

    /// Fixe la date de mise à jour écrite dans l'en-tête dBASE (aujourd'hui par défaut)
    pub fn with_update_date(mut self, date: NaiveDate) -> Self {
        self.updated = date;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> usize {
        self.shp.records()
    }

    /// Ajoute une shape et son enregistrement attributaire
    ///
    /// L'enregistrement est validé avant la shape: en cas d'erreur rien n'est ajouté.
    pub fn write(&mut self, shape: &Shape, values: &[FieldValue]) -> Result<(), ShapefileError> {
        let record = self.dbf.encode_record(values)?;
        self.shp.push(shape)?;
        self.dbf.append(&record);
        debug_assert_eq!(self.shp.records(), self.dbf.records());
        Ok(())
    }

    /// Écrit les fichiers .shp, .shx, .dbf, .prj et .cpg
    pub fn finish(self, wkt: &str) -> Result<LayerFiles, ShapefileError> {
        let records = self.shp.records();
        let (shp_bytes, shx_bytes) = self.shp.finish();
        let dbf_bytes = self.dbf.finish(self.updated);

        let files = LayerFiles {
            name: self.name.clone(),
            shape_type: self.shape_type,
            records,
            shp: layer_path(&self.dir, &self.name, "shp"),
            shx: layer_path(&self.dir, &self.name, "shx"),
            dbf: layer_path(&self.dir, &self.name, "dbf"),
            prj: layer_path(&self.dir, &self.name, "prj"),
            cpg: layer_path(&self.dir, &self.name, "cpg"),
        };

        std::fs::write(&files.shp, shp_bytes)?;
        std::fs::write(&files.shx, shx_bytes)?;
        std::fs::write(&files.dbf, dbf_bytes)?;
        std::fs::write(&files.prj, wkt)?;
        std::fs::write(&files.cpg, self.code_page.cpg_label())?;

        debug!(
            layer = %self.name,
            shape_type = %self.shape_type,
            records,
            "Layer written"
        );

        Ok(files)
    }
}

/// Chemin d'un fichier de la couche (le nom peut contenir des points)
fn layer_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, extension))
}

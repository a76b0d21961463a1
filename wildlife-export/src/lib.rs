//! # wildlife-export
//!
//! Export d'observations de faune géolocalisées vers des shapefiles
//! reprojetés, regroupés dans une archive ZIP.
//!
//! ## Features
//!
//! - Regroupement par (date du relevé, individu, type de géométrie)
//! - Reprojection EPSG:4326 vers les systèmes rectangulaires plans du Japon, UTM, Web Mercator
//! - Une couche `.shp/.shx/.dbf/.prj/.cpg` par groupe, attributs en CP932 par défaut
//! - Archive construite hors de la cible puis renommée (jamais d'archive partielle)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Export regroupé vers JGD2011 / zone IX
//! wildlife-export export --input features.geojson --output survey.zip --epsg 6677 \
//!     --survey-date 1=2025-09-08
//!
//! # Deux couches (flightlines / observations)
//! wildlife-export simple --input features.geojson --output survey.zip
//!
//! # Systèmes de coordonnées supportés
//! wildlife-export crs
//! ```

pub mod config;
pub mod crs;
pub mod error;
pub mod export;
pub mod loader;
pub mod model;
pub mod report;

pub use config::ExportConfig;
pub use crs::CoordinateTransformer;
pub use error::{ExportError, GeometryError};
pub use export::{export_to_bytes, export_to_path, ExportOptions, GroupKey};
pub use model::{Behavior, GeometryKind, ObservationFeature, ObservationProperties, ObservedGeometry};
pub use report::{ExportSummary, LayerSummary, Layout, SkipStats};

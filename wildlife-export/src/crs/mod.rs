//! Reprojection en Rust pur (sans libproj)
//!
//! Source: WGS84 géographique (EPSG:4326), longitude/latitude en degrés.
//!
//! Cibles supportées :
//! - JGD2011 / JGD2000 Japan Plane Rectangular CS I à XIX (EPSG:6669-6687, 2443-2461)
//! - JGD2011 / UTM 51N à 55N (EPSG:6688-6692)
//! - WGS 84 / UTM (EPSG:32601-32660, 32701-32760)
//! - Web Mercator (EPSG:3857)
//! - WGS84 (EPSG:4326, identité)
//!
//! JGD2011 et WGS84 sont traités comme identiques (écart < 1 m, sans grille).

mod ellipsoid;
mod mercator;
pub mod registry;
mod tmerc;

pub use ellipsoid::{Ellipsoid, GRS80, WGS84};
pub use registry::{lookup, supported_codes, CrsDefinition};
pub use tmerc::TransverseMercator;

use geo::{Coord, LineString};
use tracing::debug;

use crate::error::ExportError;

/// Code EPSG des coordonnées d'entrée
pub const SOURCE_EPSG: u32 = 4326;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection d'un CRS de destination
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Coordonnées géographiques conservées
    Identity,
    TransverseMercator(TransverseMercator),
    WebMercator,
}

/// Transformation EPSG:4326 vers un CRS de destination
///
/// Sans état après construction: partageable entre threads (`Send + Sync`).
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    definition: CrsDefinition,
    wkt: String,
}

impl CoordinateTransformer {
    /// Crée un transformer entre deux codes EPSG
    ///
    /// # Errors
    ///
    /// `InvalidCrs` si la source n'est pas 4326 ou si la destination est inconnue.
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, ExportError> {
        if source_epsg != SOURCE_EPSG {
            return Err(ExportError::invalid_crs(
                source_epsg,
                "only EPSG:4326 is supported as source",
            ));
        }
        Self::from_wgs84(target_epsg)
    }

    /// Crée un transformer depuis WGS84 géographique
    pub fn from_wgs84(target_epsg: u32) -> Result<Self, ExportError> {
        let definition = lookup(target_epsg)
            .ok_or_else(|| ExportError::invalid_crs(target_epsg, "unknown or unsupported EPSG code"))?;
        let wkt = definition.wkt();

        debug!(epsg = target_epsg, name = %definition.name, "Coordinate transformer ready");

        Ok(Self { definition, wkt })
    }

    pub fn target_epsg(&self) -> u32 {
        self.definition.epsg
    }

    pub fn target_name(&self) -> &str {
        &self.definition.name
    }

    /// WKT du CRS de destination, écrit tel quel dans les `.prj`
    pub fn destination_wkt(&self) -> &str {
        &self.wkt
    }

    /// (longitude, latitude) en degrés vers (x, y) dans le CRS de destination
    pub fn transform(&self, lon: f64, lat: f64) -> (f64, f64) {
        let geo = Geographic::from_degrees(lon, lat);
        match &self.definition.projection {
            Projection::Identity => (lon, lat),
            Projection::TransverseMercator(tm) => tm.forward(geo),
            Projection::WebMercator => mercator::geographic_to_web_mercator(geo),
        }
    }

    /// (x, y) dans le CRS de destination vers (longitude, latitude) en degrés
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        match &self.definition.projection {
            Projection::Identity => (x, y),
            Projection::TransverseMercator(tm) => tm.inverse(x, y).to_degrees(),
            Projection::WebMercator => mercator::web_mercator_to_geographic(x, y).to_degrees(),
        }
    }

    /// Transforme une coordonnée `geo` (x = longitude, y = latitude)
    pub fn transform_coord(&self, coord: Coord) -> Coord {
        let (x, y) = self.transform(coord.x, coord.y);
        Coord { x, y }
    }

    /// Transforme chaque sommet dans l'ordre
    pub fn transform_line(&self, line: &LineString) -> LineString {
        line.coords().map(|c| self.transform_coord(*c)).collect()
    }
}

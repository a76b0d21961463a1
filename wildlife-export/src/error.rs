//! Types d'erreurs pour le crate wildlife-export

use shpwrite::ShapefileError;
use thiserror::Error;

/// Erreurs fatales d'un export: l'appelant reçoit une archive complète ou une seule erreur
#[derive(Debug, Error)]
pub enum ExportError {
    /// Code EPSG inconnu ou non supporté
    #[error("Invalid CRS EPSG:{epsg}: {reason}")]
    InvalidCrs { epsg: u32, reason: String },

    /// Type de géométrie hors Point / LineString / Polygon
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// Code page des attributs non reconnu
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Erreur d'I/O pendant l'écriture des couches ou de l'archive
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur d'écriture d'une couche (schéma ou valeur invalide)
    #[error("Failed to write layer {layer}: {source}")]
    Layer {
        layer: String,
        #[source]
        source: ShapefileError,
    },

    /// Document d'entrée invalide
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ExportError {
    /// Crée une erreur de CRS invalide
    pub fn invalid_crs(epsg: u32, reason: impl Into<String>) -> Self {
        Self::InvalidCrs {
            epsg,
            reason: reason.into(),
        }
    }

    /// Rattache une erreur du writer à sa couche
    ///
    /// Les erreurs d'I/O, d'encodage et de type restent dans leur catégorie.
    pub fn layer(layer: impl Into<String>, err: ShapefileError) -> Self {
        match err {
            ShapefileError::Io(e) => Self::Io(e),
            ShapefileError::UnsupportedEncoding(label) => Self::UnsupportedEncoding(label),
            ShapefileError::UnsupportedGeometry(shape_type) => {
                Self::UnsupportedGeometry(shape_type.to_string())
            }
            source => Self::Layer {
                layer: layer.into(),
                source,
            },
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e),
            other => Self::Io(std::io::Error::new(std::io::ErrorKind::Other, other)),
        }
    }
}

/// Géométrie d'une observation inutilisable: l'observation est omise, l'export continue
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Payload GeoJSON illisible
    #[error("malformed geometry: {0}")]
    Malformed(String),

    /// Le type du payload ne correspond pas au type déclaré
    #[error("geometry is a {found}, expected {expected}")]
    KindMismatch { expected: String, found: String },

    /// Coordonnée non finie ou hors des bornes géographiques
    #[error("invalid coordinate ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// Anneau extérieur ouvert ou de moins de 4 positions
    #[error("polygon ring must be closed with at least 4 positions, got {positions} (closed: {closed})")]
    InvalidRing { positions: usize, closed: bool },

    /// LineString avec un seul sommet
    #[error("line string needs at least 2 positions, got {0}")]
    TooFewPositions(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use shpwrite::ShapeType;

    #[test]
    fn test_layer_error_keeps_io_category() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExportError::layer("20250908_A_point", ShapefileError::Io(io));
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_layer_error_wraps_value_errors() {
        let err = ExportError::layer(
            "20250908_A_point",
            ShapefileError::invalid_value("count", "too wide"),
        );
        match err {
            ExportError::Layer { layer, .. } => assert_eq!(layer, "20250908_A_point"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_layer_error_maps_geometry_type() {
        let err = ExportError::layer("x", ShapefileError::UnsupportedGeometry(ShapeType::MultiPatch));
        assert!(matches!(err, ExportError::UnsupportedGeometry(ref t) if t == "MultiPatch"));
    }

    #[test]
    fn test_display() {
        let err = ExportError::invalid_crs(1234, "unknown");
        assert_eq!(err.to_string(), "Invalid CRS EPSG:1234: unknown");
    }
}

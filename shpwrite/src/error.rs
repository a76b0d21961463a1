//! Types d'erreurs pour le crate shpwrite

use thiserror::Error;

use crate::types::ShapeType;

/// Erreurs pouvant survenir lors de l'écriture d'un shapefile
#[derive(Debug, Error)]
pub enum ShapefileError {
    /// Erreur d'I/O lors de l'écriture des fichiers
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Type de géométrie non supporté par le writer
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(ShapeType),

    /// Shape incompatible avec le type de la couche
    #[error("Shape of type {found} cannot be written to a {expected} layer")]
    ShapeMismatch {
        expected: ShapeType,
        found: ShapeType,
    },

    /// Définition de champ invalide (nom, largeur...)
    #[error("Invalid field definition {name}: {reason}")]
    InvalidField { name: String, reason: String },

    /// Nombre de valeurs différent du nombre de champs
    #[error("Record has {found} values but the schema defines {expected} fields")]
    RecordArity { expected: usize, found: usize },

    /// Valeur incompatible avec le champ
    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Encodage (code page) non reconnu
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Le fichier dépasse la taille adressable par le format (2 Go)
    #[error("Shapefile too large: {0}")]
    TooLarge(String),
}

impl ShapefileError {
    /// Crée une erreur de définition de champ
    pub fn invalid_field(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de valeur invalide
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

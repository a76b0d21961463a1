//! Types de données pour le crate shpwrite

use std::fmt;
use std::path::PathBuf;

use geo::{Coord, LineString};

/// Types de shapes du format ESRI
///
/// Seuls `Null`, `Point`, `PolyLine` et `Polygon` sont écrits par ce crate,
/// les autres variantes existent pour signaler proprement un type non supporté.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    /// Code numérique écrit dans les en-têtes et les enregistrements
    pub fn code(self) -> i32 {
        match self {
            Self::Null => 0,
            Self::Point => 1,
            Self::PolyLine => 3,
            Self::Polygon => 5,
            Self::MultiPoint => 8,
            Self::PointZ => 11,
            Self::PolyLineZ => 13,
            Self::PolygonZ => 15,
            Self::MultiPointZ => 18,
            Self::PointM => 21,
            Self::PolyLineM => 23,
            Self::PolygonM => 25,
            Self::MultiPointM => 28,
            Self::MultiPatch => 31,
        }
    }

    /// Types de couche que le writer sait produire
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Point | Self::PolyLine | Self::Polygon)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Une géométrie prête à être écrite (coordonnées déjà dans le CRS de sortie)
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Enregistrement vide (géométrie absente ou sans coordonnées)
    Null,
    Point(Coord),
    /// Une ou plusieurs parties
    PolyLine(Vec<LineString>),
    /// Anneaux: le premier est l'extérieur, les suivants sont des trous
    Polygon(Vec<LineString>),
}

impl Shape {
    /// Type ESRI correspondant
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Self::Null => ShapeType::Null,
            Self::Point(_) => ShapeType::Point,
            Self::PolyLine(_) => ShapeType::PolyLine,
            Self::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// Nombre total de sommets
    pub fn point_count(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Point(_) => 1,
            Self::PolyLine(parts) | Self::Polygon(parts) => parts.iter().map(|p| p.0.len()).sum(),
        }
    }

    /// Vrai si la shape sera écrite comme un enregistrement Null
    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}

/// Type de champ dBASE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Texte (C)
    Character,
    /// Numérique (N)
    Numeric,
    /// Flottant (F)
    Float,
    /// Booléen (L)
    Logical,
    /// Date AAAAMMJJ (D)
    Date,
}

impl FieldType {
    /// Octet de type dans le descripteur de champ
    pub fn tag(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
            Self::Float => b'F',
            Self::Logical => b'L',
            Self::Date => b'D',
        }
    }
}

/// Définition d'un champ de la table attributaire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Nom du champ (10 caractères ASCII max)
    pub name: String,
    pub field_type: FieldType,
    /// Largeur en octets
    pub width: u8,
    /// Nombre de décimales (champs N/F)
    pub decimals: u8,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType, width: u8, decimals: u8) -> Self {
        Self {
            name: name.into(),
            field_type,
            width,
            decimals,
        }
    }

    /// Champ texte
    pub fn character(name: impl Into<String>, width: u8) -> Self {
        Self::new(name, FieldType::Character, width, 0)
    }

    /// Champ numérique entier
    pub fn integer(name: impl Into<String>, width: u8) -> Self {
        Self::new(name, FieldType::Numeric, width, 0)
    }
}

/// Valeur d'un champ dans un enregistrement
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Double(f64),
    Text(String),
    Logical(bool),
    Date(chrono::NaiveDate),
    Null,
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Fichiers produits pour une couche
#[derive(Debug, Clone)]
pub struct LayerFiles {
    /// Nom de base de la couche (sans extension)
    pub name: String,
    pub shape_type: ShapeType,
    /// Nombre d'enregistrements (identique dans .shp et .dbf)
    pub records: usize,
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
    pub prj: PathBuf,
    pub cpg: PathBuf,
}

impl LayerFiles {
    /// Tous les chemins produits
    pub fn paths(&self) -> [&PathBuf; 5] {
        [&self.shp, &self.shx, &self.dbf, &self.prj, &self.cpg]
    }
}

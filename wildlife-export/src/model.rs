//! Modèle des observations en entrée

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};
use shpwrite::ShapeType;

use crate::error::{ExportError, GeometryError};

/// Type de géométrie d'une observation
///
/// L'ordre des variantes fixe l'ordre des couches dans l'archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    /// Suffixe du nom de couche
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::LineString => "line",
            Self::Polygon => "polygon",
        }
    }

    /// Type de shape écrit pour ce type
    pub fn shape_type(self) -> ShapeType {
        match self {
            Self::Point => ShapeType::Point,
            Self::LineString => ShapeType::PolyLine,
            Self::Polygon => ShapeType::Polygon,
        }
    }

    /// Nom du type GeoJSON
    pub fn geojson_type(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.geojson_type())
    }
}

impl FromStr for GeometryKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Point" => Ok(Self::Point),
            "LineString" => Ok(Self::LineString),
            "Polygon" => Ok(Self::Polygon),
            other => Err(ExportError::UnsupportedGeometry(other.to_string())),
        }
    }
}

/// Comportement observé
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Flight,
    Circle,
    Rest,
}

impl Behavior {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flight => "flight",
            Self::Circle => "circle",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributs d'une observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationProperties {
    pub observation_id: i64,
    #[serde(default)]
    pub survey_id: Option<i64>,
    pub species: String,
    pub count: u32,
    pub behavior: Behavior,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub ended_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: String,
    /// Toujours renseigné (`IND-<observation_id>` par défaut, appliqué au chargement)
    pub individual_id: String,
}

/// Une observation prête à exporter
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationFeature {
    pub geometry_kind: GeometryKind,
    /// Géométrie GeoJSON en EPSG:4326 (longitude, latitude)
    pub geometry: serde_json::Value,
    pub properties: ObservationProperties,
    /// Date du relevé associé, si connue
    pub survey_date: Option<NaiveDate>,
}

impl ObservationFeature {
    pub fn new(
        geometry_kind: GeometryKind,
        geometry: serde_json::Value,
        properties: ObservationProperties,
    ) -> Self {
        Self {
            geometry_kind,
            geometry,
            properties,
            survey_date: None,
        }
    }

    pub fn with_survey_date(mut self, date: Option<NaiveDate>) -> Self {
        self.survey_date = date;
        self
    }

    /// Décode la géométrie, `Err` signifie que l'observation doit être omise
    pub fn parse_geometry(&self) -> Result<ObservedGeometry, GeometryError> {
        let declared = self.geometry_kind;

        if has_empty_coordinates(&self.geometry, declared) {
            return Ok(ObservedGeometry::empty(declared));
        }

        let geometry = geojson::Geometry::from_json_value(self.geometry.clone())
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;

        let observed = match geometry.value {
            geojson::Value::Point(position) => ObservedGeometry::Point(Some(to_coord(&position)?)),
            geojson::Value::LineString(positions) => {
                if positions.len() == 1 {
                    return Err(GeometryError::TooFewPositions(1));
                }
                ObservedGeometry::LineString(to_line(&positions)?)
            }
            geojson::Value::Polygon(rings) => {
                let mut rings = rings.iter();
                let exterior = match rings.next() {
                    Some(ring) => to_ring(ring)?,
                    None => LineString::new(Vec::new()),
                };
                let interiors = rings.map(|r| to_line(r)).collect::<Result<Vec<_>, _>>()?;
                ObservedGeometry::Polygon {
                    exterior,
                    interiors,
                }
            }
            other => {
                return Err(GeometryError::KindMismatch {
                    expected: declared.to_string(),
                    found: value_type_name(&other).to_string(),
                })
            }
        };

        if observed.kind() != declared {
            return Err(GeometryError::KindMismatch {
                expected: declared.to_string(),
                found: observed.kind().to_string(),
            });
        }

        Ok(observed)
    }
}

/// Géométrie décodée, coordonnées en degrés (x = longitude, y = latitude)
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedGeometry {
    /// `None` pour un point sans coordonnées
    Point(Option<Coord>),
    /// Vide ou au moins 2 sommets
    LineString(LineString),
    Polygon {
        exterior: LineString,
        interiors: Vec<LineString>,
    },
}

impl ObservedGeometry {
    /// Géométrie vide du type donné
    pub fn empty(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Point => Self::Point(None),
            GeometryKind::LineString => Self::LineString(LineString::new(Vec::new())),
            GeometryKind::Polygon => Self::Polygon {
                exterior: LineString::new(Vec::new()),
                interiors: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon { .. } => GeometryKind::Polygon,
        }
    }
}

/// `coordinates` vide (`[]`, ou `[[]]` pour un polygone) pour le type déclaré
fn has_empty_coordinates(geometry: &serde_json::Value, kind: GeometryKind) -> bool {
    if geometry.get("type").and_then(|t| t.as_str()) != Some(kind.geojson_type()) {
        return false;
    }
    match geometry.get("coordinates").and_then(|c| c.as_array()) {
        Some(coords) if coords.is_empty() => true,
        Some(coords) if kind == GeometryKind::Polygon => coords[0]
            .as_array()
            .map_or(false, |exterior| exterior.is_empty()),
        _ => false,
    }
}

fn to_coord(position: &[f64]) -> Result<Coord, GeometryError> {
    if position.len() < 2 {
        return Err(GeometryError::Malformed(format!(
            "position needs 2 values, got {}",
            position.len()
        )));
    }
    let (lon, lat) = (position[0], position[1]);
    if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() > 90.0 {
        return Err(GeometryError::InvalidCoordinate { lon, lat });
    }
    Ok(Coord { x: lon, y: lat })
}

fn to_line(positions: &[Vec<f64>]) -> Result<LineString, GeometryError> {
    positions
        .iter()
        .map(|p| to_coord(p))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

/// Anneau de polygone: fermé, au moins 4 positions
fn to_ring(positions: &[Vec<f64>]) -> Result<LineString, GeometryError> {
    let ring = to_line(positions)?;
    let closed = ring.0.first() == ring.0.last();
    if ring.0.len() < 4 || !closed {
        return Err(GeometryError::InvalidRing {
            positions: ring.0.len(),
            closed,
        });
    }
    Ok(ring)
}

fn value_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn properties(observation_id: i64, individual_id: &str) -> ObservationProperties {
        ObservationProperties {
            observation_id,
            survey_id: Some(1),
            species: "Hawk".to_string(),
            count: 1,
            behavior: Behavior::Flight,
            started_at: None,
            ended_at: None,
            notes: String::new(),
            individual_id: individual_id.to_string(),
        }
    }

    fn feature(kind: GeometryKind, geometry: serde_json::Value) -> ObservationFeature {
        ObservationFeature::new(kind, geometry, properties(1, "A"))
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Point".parse::<GeometryKind>().unwrap(), GeometryKind::Point);
        assert_eq!(
            "LineString".parse::<GeometryKind>().unwrap(),
            GeometryKind::LineString
        );
        assert!(matches!(
            "MultiPolygon".parse::<GeometryKind>(),
            Err(ExportError::UnsupportedGeometry(ref t)) if t == "MultiPolygon"
        ));
    }

    #[test]
    fn test_kind_order_and_suffix() {
        assert!(GeometryKind::Point < GeometryKind::LineString);
        assert!(GeometryKind::LineString < GeometryKind::Polygon);
        assert_eq!(GeometryKind::LineString.suffix(), "line");
        assert_eq!(GeometryKind::Polygon.shape_type(), ShapeType::Polygon);
    }

    #[test]
    fn test_behavior_serde() {
        let b: Behavior = serde_json::from_value(json!("circle")).unwrap();
        assert_eq!(b, Behavior::Circle);
        assert_eq!(serde_json::to_value(Behavior::Rest).unwrap(), json!("rest"));
        assert!(serde_json::from_value::<Behavior>(json!("hover")).is_err());
    }

    #[test]
    fn test_parse_point() {
        let f = feature(
            GeometryKind::Point,
            json!({"type": "Point", "coordinates": [139.8, 35.7]}),
        );
        assert_eq!(
            f.parse_geometry().unwrap(),
            ObservedGeometry::Point(Some(Coord { x: 139.8, y: 35.7 }))
        );
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let f = feature(
            GeometryKind::Polygon,
            json!({"type": "Polygon", "coordinates": [
                [[139.0, 35.0], [140.0, 35.0], [140.0, 36.0], [139.0, 36.0], [139.0, 35.0]],
                [[139.4, 35.4], [139.6, 35.4], [139.6, 35.6], [139.4, 35.4]]
            ]}),
        );
        match f.parse_geometry().unwrap() {
            ObservedGeometry::Polygon {
                exterior,
                interiors,
            } => {
                assert_eq!(exterior.0.len(), 5);
                assert_eq!(interiors.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_coordinates() {
        let point = feature(GeometryKind::Point, json!({"type": "Point", "coordinates": []}));
        assert_eq!(point.parse_geometry().unwrap(), ObservedGeometry::Point(None));

        let line = feature(
            GeometryKind::LineString,
            json!({"type": "LineString", "coordinates": []}),
        );
        assert_eq!(
            line.parse_geometry().unwrap(),
            ObservedGeometry::empty(GeometryKind::LineString)
        );

        let polygon = feature(
            GeometryKind::Polygon,
            json!({"type": "Polygon", "coordinates": [[]]}),
        );
        assert_eq!(
            polygon.parse_geometry().unwrap(),
            ObservedGeometry::empty(GeometryKind::Polygon)
        );
    }

    #[test]
    fn test_open_or_short_exterior_is_rejected() {
        let open = feature(
            GeometryKind::Polygon,
            json!({"type": "Polygon", "coordinates": [
                [[139.0, 35.0], [140.0, 35.0], [140.0, 36.0], [139.0, 36.0]]
            ]}),
        );
        assert_eq!(
            open.parse_geometry(),
            Err(GeometryError::InvalidRing {
                positions: 4,
                closed: false
            })
        );

        let short = feature(
            GeometryKind::Polygon,
            json!({"type": "Polygon", "coordinates": [
                [[139.0, 35.0], [140.0, 35.0], [139.0, 35.0]]
            ]}),
        );
        assert_eq!(
            short.parse_geometry(),
            Err(GeometryError::InvalidRing {
                positions: 3,
                closed: true
            })
        );
    }

    #[test]
    fn test_single_position_line_is_rejected() {
        let f = feature(
            GeometryKind::LineString,
            json!({"type": "LineString", "coordinates": [[139.8, 35.7]]}),
        );
        assert_eq!(f.parse_geometry(), Err(GeometryError::TooFewPositions(1)));
    }

    #[test]
    fn test_kind_mismatch() {
        let f = feature(
            GeometryKind::Point,
            json!({"type": "LineString", "coordinates": [[139.8, 35.7], [139.9, 35.8]]}),
        );
        assert!(matches!(
            f.parse_geometry(),
            Err(GeometryError::KindMismatch { .. })
        ));

        let multi = feature(
            GeometryKind::Point,
            json!({"type": "MultiPoint", "coordinates": [[139.8, 35.7]]}),
        );
        assert!(matches!(
            multi.parse_geometry(),
            Err(GeometryError::KindMismatch { ref found, .. }) if found == "MultiPoint"
        ));
    }

    #[test]
    fn test_malformed_payloads() {
        let garbage = feature(GeometryKind::Point, json!({"type": "Point"}));
        assert!(matches!(
            garbage.parse_geometry(),
            Err(GeometryError::Malformed(_))
        ));

        let not_object = feature(GeometryKind::Point, json!("POINT(1 2)"));
        assert!(not_object.parse_geometry().is_err());

        let out_of_range = feature(
            GeometryKind::Point,
            json!({"type": "Point", "coordinates": [200.0, 35.7]}),
        );
        assert!(matches!(
            out_of_range.parse_geometry(),
            Err(GeometryError::InvalidCoordinate { .. })
        ));
    }
}

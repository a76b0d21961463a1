//! Conversion des géométries observées en shapes projetées

use shpwrite::Shape;

use crate::crs::CoordinateTransformer;
use crate::model::ObservedGeometry;

/// Projette une géométrie et construit la shape correspondante
///
/// Polygones: seul l'anneau extérieur est exporté, les trous sont ignorés.
/// Une géométrie sans coordonnées donne une shape vide (enregistrement Null).
pub fn encode_geometry(geometry: &ObservedGeometry, transformer: &CoordinateTransformer) -> Shape {
    match geometry {
        ObservedGeometry::Point(None) => Shape::Null,
        ObservedGeometry::Point(Some(coord)) => Shape::Point(transformer.transform_coord(*coord)),
        ObservedGeometry::LineString(line) if line.0.is_empty() => Shape::Null,
        ObservedGeometry::LineString(line) => Shape::PolyLine(vec![transformer.transform_line(line)]),
        ObservedGeometry::Polygon { exterior, .. } if exterior.0.is_empty() => Shape::Null,
        ObservedGeometry::Polygon { exterior, .. } => {
            Shape::Polygon(vec![transformer.transform_line(exterior)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeometryKind;
    use geo::{Coord, LineString};

    fn zone_ix() -> CoordinateTransformer {
        CoordinateTransformer::from_wgs84(6677).unwrap()
    }

    #[test]
    fn test_point() {
        let tf = zone_ix();
        let shape = encode_geometry(&ObservedGeometry::Point(Some(Coord { x: 139.80, y: 35.70 })), &tf);
        match shape {
            Shape::Point(c) => {
                assert!((c.x - (-3016.50)).abs() < 0.05, "x={}", c.x);
                assert!((c.y - (-33283.03)).abs() < 0.05, "y={}", c.y);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_line_keeps_vertices() {
        let tf = zone_ix();
        let line = LineString::from(vec![(139.7, 35.6), (139.7, 35.6), (139.8, 35.7)]);
        let shape = encode_geometry(&ObservedGeometry::LineString(line), &tf);
        assert_eq!(shape.point_count(), 3);
        match shape {
            Shape::PolyLine(parts) => {
                assert_eq!(parts.len(), 1);
                assert_eq!(parts[0].0[0], parts[0].0[1]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_polygon_drops_holes() {
        let tf = zone_ix();
        let exterior = LineString::from(vec![
            (139.0, 35.0),
            (140.0, 35.0),
            (140.0, 36.0),
            (139.0, 36.0),
            (139.0, 35.0),
        ]);
        let hole = LineString::from(vec![(139.4, 35.4), (139.6, 35.4), (139.6, 35.6), (139.4, 35.4)]);
        let shape = encode_geometry(
            &ObservedGeometry::Polygon {
                exterior,
                interiors: vec![hole],
            },
            &tf,
        );
        match shape {
            Shape::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].0.len(), 5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_geometries_are_null() {
        let tf = zone_ix();
        for kind in [GeometryKind::Point, GeometryKind::LineString, GeometryKind::Polygon] {
            assert_eq!(encode_geometry(&ObservedGeometry::empty(kind), &tf), Shape::Null);
        }
    }
}

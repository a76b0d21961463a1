//! Export non regroupé: une couche de lignes de vol et une couche de points
//!
//! Les polygones n'ont pas de couche dans cette disposition.

use std::collections::HashSet;
use std::path::Path;

use shpwrite::{FieldDef, FieldValue, LayerFiles, Shape, ShapeType};
use tracing::debug;

use super::encode::encode_geometry;
use super::layer::{write_layer, LayerContext};
use crate::error::ExportError;
use crate::model::{GeometryKind, ObservationFeature, ObservationProperties};
use crate::report::SkipStats;

pub const FLIGHTLINES_LAYER: &str = "flightlines";
pub const OBSERVATIONS_LAYER: &str = "observations";

pub fn flightline_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::integer("obs_id", 18),
        FieldDef::character("species", 50),
        FieldDef::integer("count", 10),
        FieldDef::character("behavior", 10),
    ]
}

pub fn observation_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::integer("obs_id", 18),
        FieldDef::character("species", 50),
        FieldDef::integer("count", 10),
    ]
}

fn flightline_record(props: &ObservationProperties) -> Vec<FieldValue> {
    vec![
        props.observation_id.into(),
        props.species.as_str().into(),
        props.count.into(),
        props.behavior.as_str().into(),
    ]
}

fn observation_record(props: &ObservationProperties) -> Vec<FieldValue> {
    vec![
        props.observation_id.into(),
        props.species.as_str().into(),
        props.count.into(),
    ]
}

/// Écrit les deux couches dans `dir` (toujours présentes, éventuellement vides)
pub fn write_simple_layers(
    dir: &Path,
    features: &[ObservationFeature],
    individual_filter: Option<&HashSet<String>>,
    ctx: &LayerContext<'_>,
) -> Result<(Vec<LayerFiles>, SkipStats), ExportError> {
    let mut skipped = SkipStats::default();
    let mut lines: Vec<(Shape, Vec<FieldValue>)> = Vec::new();
    let mut points: Vec<(Shape, Vec<FieldValue>)> = Vec::new();

    for feature in features {
        let props = &feature.properties;

        if individual_filter.map_or(false, |filter| !filter.contains(&props.individual_id)) {
            skipped.filtered += 1;
            continue;
        }
        if feature.geometry_kind == GeometryKind::Polygon {
            skipped.excluded += 1;
            continue;
        }

        let geometry = match feature.parse_geometry() {
            Ok(geometry) => geometry,
            Err(e) => {
                debug!(observation_id = props.observation_id, error = %e, "Skipping observation");
                skipped.malformed += 1;
                continue;
            }
        };

        let shape = encode_geometry(&geometry, ctx.transformer);
        match feature.geometry_kind {
            GeometryKind::LineString => lines.push((shape, flightline_record(props))),
            _ => points.push((shape, observation_record(props))),
        }
    }

    let layers = vec![
        write_layer(
            dir,
            FLIGHTLINES_LAYER,
            ShapeType::PolyLine,
            flightline_fields(),
            lines,
            ctx,
        )?,
        write_layer(
            dir,
            OBSERVATIONS_LAYER,
            ShapeType::Point,
            observation_fields(),
            points,
            ctx,
        )?,
    ];

    Ok((layers, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CoordinateTransformer;
    use crate::model::tests::properties;
    use chrono::NaiveDate;
    use serde_json::json;
    use shpwrite::CodePage;

    fn feature(id: i64, individual: &str, geometry: serde_json::Value) -> ObservationFeature {
        let kind = geometry["type"].as_str().unwrap().parse().unwrap();
        ObservationFeature::new(kind, geometry, properties(id, individual))
    }

    #[test]
    fn test_two_layers() {
        let dir = tempfile::tempdir().unwrap();
        let transformer = CoordinateTransformer::from_wgs84(6677).unwrap();
        let ctx = LayerContext {
            transformer: &transformer,
            code_page: CodePage::default(),
            update_date: NaiveDate::from_ymd_opt(2025, 9, 8).unwrap(),
        };

        let features = vec![
            feature(1, "A", json!({"type": "Point", "coordinates": [139.8, 35.7]})),
            feature(
                2,
                "A",
                json!({"type": "LineString", "coordinates": [[139.8, 35.7], [139.9, 35.8]]}),
            ),
            feature(
                3,
                "B",
                json!({"type": "Polygon", "coordinates": [[[139.0, 35.0], [140.0, 35.0], [140.0, 36.0], [139.0, 35.0]]]}),
            ),
            feature(4, "C", json!({"type": "Point", "coordinates": [139.8, 35.7]})),
            feature(5, "A", json!({"type": "LineString", "coordinates": [[139.8, 35.7]]})),
        ];
        let filter: HashSet<String> = ["A".to_string(), "B".to_string()].into();

        let (layers, skipped) =
            write_simple_layers(dir.path(), &features, Some(&filter), &ctx).unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].name, "flightlines");
        assert_eq!(layers[0].shape_type, ShapeType::PolyLine);
        assert_eq!(layers[0].records, 1);
        assert_eq!(layers[1].name, "observations");
        assert_eq!(layers[1].records, 1);
        assert_eq!(
            skipped,
            SkipStats {
                filtered: 1,
                malformed: 1,
                excluded: 1
            }
        );

        // Schéma de la couche de lignes: 4 champs
        let dbf = std::fs::read(&layers[0].dbf).unwrap();
        let header_len = u16::from_le_bytes([dbf[8], dbf[9]]) as usize;
        assert_eq!((header_len - 33) / 32, 4);
    }
}

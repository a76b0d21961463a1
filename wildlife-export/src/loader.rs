//! Chargement d'une FeatureCollection d'observations
//!
//! Format produit par le stockage des observations: une feature par forme
//! (point, ligne de vol, polygone) avec les attributs de l'observation.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::model::{Behavior, GeometryKind, ObservationFeature, ObservationProperties};

/// Dates des relevés, par identifiant de relevé
pub type SurveyDates = HashMap<i64, NaiveDate>;

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    geometry: serde_json::Value,
    properties: RawProperties,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(default)]
    feature_table: Option<String>,
    observation_id: i64,
    #[serde(default)]
    survey_id: Option<i64>,
    species: String,
    count: i64,
    behavior: Behavior,
    #[serde(default)]
    started_at: Option<String>,
    #[serde(default)]
    ended_at: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    individual_id: Option<String>,
}

/// Charge un fichier FeatureCollection
pub fn load_features(
    path: &Path,
    survey_dates: &SurveyDates,
) -> Result<Vec<ObservationFeature>, ExportError> {
    let content = std::fs::read_to_string(path)?;
    let features = parse_feature_collection(&content, survey_dates)?;

    info!(
        path = %path.display(),
        features = features.len(),
        "Loaded observations"
    );

    Ok(features)
}

/// Décode une FeatureCollection et résout les valeurs par défaut
///
/// # Errors
///
/// `InvalidInput` pour un document ou des attributs invalides,
/// `UnsupportedGeometry` pour un type de géométrie hors Point / LineString / Polygon.
pub fn parse_feature_collection(
    json: &str,
    survey_dates: &SurveyDates,
) -> Result<Vec<ObservationFeature>, ExportError> {
    let collection: RawCollection = serde_json::from_str(json)
        .map_err(|e| ExportError::InvalidInput(format!("not a feature collection: {}", e)))?;

    if collection.kind != "FeatureCollection" {
        return Err(ExportError::InvalidInput(format!(
            "expected a FeatureCollection, got {}",
            collection.kind
        )));
    }

    collection
        .features
        .into_iter()
        .map(|raw| resolve_feature(raw, survey_dates))
        .collect()
}

fn resolve_feature(
    raw: RawFeature,
    survey_dates: &SurveyDates,
) -> Result<ObservationFeature, ExportError> {
    let props = raw.properties;
    let id = props.observation_id;

    let geometry_kind = geometry_kind(&raw.geometry, props.feature_table.as_deref())?;

    if props.count < 0 {
        return Err(ExportError::InvalidInput(format!(
            "observation {}: negative count {}",
            id, props.count
        )));
    }
    let count = u32::try_from(props.count).map_err(|_| {
        ExportError::InvalidInput(format!("observation {}: count {} too large", id, props.count))
    })?;

    let started_at = props
        .started_at
        .as_deref()
        .map(|s| parse_timestamp(id, s))
        .transpose()?;
    let ended_at = props
        .ended_at
        .as_deref()
        .map(|s| parse_timestamp(id, s))
        .transpose()?;

    if let (Some(start), Some(end)) = (started_at, ended_at) {
        if end < start {
            return Err(ExportError::InvalidInput(format!(
                "observation {}: ended_at {} is before started_at {}",
                id, end, start
            )));
        }
    }

    let individual_id = match props.individual_id {
        Some(ind) if !ind.trim().is_empty() => ind,
        _ => default_individual_id(id),
    };

    let survey_date = props
        .survey_id
        .and_then(|survey| survey_dates.get(&survey).copied());
    if survey_date.is_none() {
        debug!(observation_id = id, survey_id = ?props.survey_id, "No survey date");
    }

    let properties = ObservationProperties {
        observation_id: id,
        survey_id: props.survey_id,
        species: props.species,
        count,
        behavior: props.behavior,
        started_at,
        ended_at,
        notes: props.notes.unwrap_or_default(),
        individual_id,
    };

    Ok(ObservationFeature::new(geometry_kind, raw.geometry, properties).with_survey_date(survey_date))
}

/// Identifiant d'individu par défaut
pub fn default_individual_id(observation_id: i64) -> String {
    format!("IND-{}", observation_id)
}

/// Type déclaré par la géométrie, ou à défaut par la table d'origine
fn geometry_kind(
    geometry: &serde_json::Value,
    feature_table: Option<&str>,
) -> Result<GeometryKind, ExportError> {
    if let Some(kind) = geometry.get("type").and_then(|t| t.as_str()) {
        return kind.parse();
    }

    match feature_table {
        Some("observation_points") => Ok(GeometryKind::Point),
        Some("flightlines") => Ok(GeometryKind::LineString),
        Some("observation_polygons") => Ok(GeometryKind::Polygon),
        other => Err(ExportError::UnsupportedGeometry(
            other.unwrap_or("missing geometry type").to_string(),
        )),
    }
}

/// Horodatage ISO 8601 sans fuseau ou RFC 3339 (heure locale conservée)
fn parse_timestamp(observation_id: i64, value: &str) -> Result<NaiveDateTime, ExportError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .map_err(|_| {
            ExportError::InvalidInput(format!(
                "observation {}: invalid timestamp '{}'",
                observation_id, value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(features: Vec<serde_json::Value>) -> String {
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    fn raw(geometry: serde_json::Value, extra: serde_json::Value) -> serde_json::Value {
        let mut properties = json!({
            "feature_table": "observation_points",
            "feature_id": 1,
            "observation_id": 7,
            "survey_id": 3,
            "species": "Hawk",
            "count": 2,
            "behavior": "circle",
            "started_at": "2025-09-08T09:00:00",
            "ended_at": "2025-09-08T09:15:30",
            "notes": "",
            "individual_id": "A"
        });
        if let (Some(props), Some(extra)) = (properties.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                props.insert(k.clone(), v.clone());
            }
        }
        json!({"type": "Feature", "geometry": geometry, "properties": properties})
    }

    fn point() -> serde_json::Value {
        json!({"type": "Point", "coordinates": [139.8, 35.7]})
    }

    fn dates() -> SurveyDates {
        HashMap::from([(3, NaiveDate::from_ymd_opt(2025, 9, 8).unwrap())])
    }

    #[test]
    fn test_parse_feature() {
        let features = parse_feature_collection(&collection(vec![raw(point(), json!({}))]), &dates()).unwrap();
        assert_eq!(features.len(), 1);

        let f = &features[0];
        assert_eq!(f.geometry_kind, GeometryKind::Point);
        assert_eq!(f.survey_date, NaiveDate::from_ymd_opt(2025, 9, 8));
        assert_eq!(f.properties.individual_id, "A");
        assert_eq!(f.properties.behavior, Behavior::Circle);
        assert_eq!(f.properties.count, 2);
        assert_eq!(
            f.properties.started_at.unwrap().to_string(),
            "2025-09-08 09:00:00"
        );
    }

    #[test]
    fn test_individual_default() {
        let json = collection(vec![
            raw(point(), json!({"individual_id": null})),
            raw(point(), json!({"observation_id": 8, "individual_id": "  "})),
        ]);
        let features = parse_feature_collection(&json, &dates()).unwrap();
        assert_eq!(features[0].properties.individual_id, "IND-7");
        assert_eq!(features[1].properties.individual_id, "IND-8");
    }

    #[test]
    fn test_unknown_survey_has_no_date() {
        let json = collection(vec![raw(point(), json!({"survey_id": 99}))]);
        let features = parse_feature_collection(&json, &dates()).unwrap();
        assert_eq!(features[0].survey_date, None);
    }

    #[test]
    fn test_ended_before_started_is_rejected() {
        let json = collection(vec![raw(
            point(),
            json!({"started_at": "2025-09-08T10:00:00", "ended_at": "2025-09-08T09:00:00"}),
        )]);
        assert!(matches!(
            parse_feature_collection(&json, &dates()),
            Err(ExportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rfc3339_timestamps() {
        let json = collection(vec![raw(
            point(),
            json!({"started_at": "2025-09-08T09:00:00+09:00", "ended_at": "2025-09-08 09:30:00.250"}),
        )]);
        let features = parse_feature_collection(&json, &dates()).unwrap();
        assert_eq!(
            features[0].properties.started_at.unwrap().to_string(),
            "2025-09-08 09:00:00"
        );
        assert!(features[0].properties.ended_at.is_some());
    }

    #[test]
    fn test_unsupported_geometry_is_fatal() {
        let json = collection(vec![raw(
            json!({"type": "MultiPoint", "coordinates": [[139.8, 35.7]]}),
            json!({}),
        )]);
        assert!(matches!(
            parse_feature_collection(&json, &dates()),
            Err(ExportError::UnsupportedGeometry(ref t)) if t == "MultiPoint"
        ));
    }

    #[test]
    fn test_null_geometry_uses_feature_table() {
        let json = collection(vec![raw(
            serde_json::Value::Null,
            json!({"feature_table": "flightlines"}),
        )]);
        let features = parse_feature_collection(&json, &dates()).unwrap();
        assert_eq!(features[0].geometry_kind, GeometryKind::LineString);
        assert!(features[0].parse_geometry().is_err());
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            parse_feature_collection("{}", &dates()),
            Err(ExportError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_feature_collection(r#"{"type": "Feature", "features": []}"#, &dates()),
            Err(ExportError::InvalidInput(_))
        ));
        let negative = collection(vec![raw(point(), json!({"count": -1}))]);
        assert!(matches!(
            parse_feature_collection(&negative, &dates()),
            Err(ExportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.geojson");
        std::fs::write(&path, collection(vec![raw(point(), json!({}))])).unwrap();

        let features = load_features(&path, &SurveyDates::new()).unwrap();
        assert_eq!(features.len(), 1);

        let missing = load_features(&dir.path().join("missing.geojson"), &SurveyDates::new());
        assert!(matches!(missing, Err(ExportError::Io(_))));
    }
}

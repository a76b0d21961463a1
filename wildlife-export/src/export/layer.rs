//! Schéma attributaire et écriture d'une couche

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use shpwrite::{CodePage, FieldDef, FieldValue, LayerFiles, LayerWriter, Shape, ShapeType};
use tracing::debug;

use super::encode::encode_geometry;
use super::group::{GroupKey, GroupedFeature};
use crate::crs::CoordinateTransformer;
use crate::error::ExportError;
use crate::model::ObservationProperties;

/// Format des horodatages dans les champs `started` / `ended`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Paramètres communs à toutes les couches d'un export
#[derive(Debug, Clone, Copy)]
pub struct LayerContext<'a> {
    pub transformer: &'a CoordinateTransformer,
    pub code_page: CodePage,
    /// Date écrite dans l'en-tête dBASE
    pub update_date: NaiveDate,
}

/// Champs des couches regroupées (noms courts, limite dBASE de 10 caractères)
pub fn grouped_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::integer("obs_id", 18),
        FieldDef::character("species", 50),
        FieldDef::integer("count", 10),
        FieldDef::character("behav", 10),
        FieldDef::character("indiv", 50),
        FieldDef::character("started", 25),
        FieldDef::character("ended", 25),
    ]
}

/// Valeurs d'une observation dans l'ordre de [`grouped_fields`]
pub fn grouped_record(props: &ObservationProperties) -> Vec<FieldValue> {
    vec![
        props.observation_id.into(),
        props.species.as_str().into(),
        props.count.into(),
        props.behavior.as_str().into(),
        props.individual_id.as_str().into(),
        timestamp(props.started_at),
        timestamp(props.ended_at),
    ]
}

fn timestamp(value: Option<NaiveDateTime>) -> FieldValue {
    value
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .into()
}

/// Écrit la couche d'un groupe dans `dir` sous le nom `name`
pub fn write_group(
    dir: &Path,
    name: &str,
    key: &GroupKey,
    members: &[GroupedFeature<'_>],
    ctx: &LayerContext<'_>,
) -> Result<LayerFiles, ExportError> {
    let rows = members.iter().map(|member| {
        (
            encode_geometry(&member.geometry, ctx.transformer),
            grouped_record(&member.feature.properties),
        )
    });

    write_layer(
        dir,
        name,
        key.geometry_kind.shape_type(),
        grouped_fields(),
        rows,
        ctx,
    )
}

/// Écrit une couche complète (shapes et enregistrements en parallèle, un pour un)
pub(crate) fn write_layer<I>(
    dir: &Path,
    name: &str,
    shape_type: ShapeType,
    fields: Vec<FieldDef>,
    rows: I,
    ctx: &LayerContext<'_>,
) -> Result<LayerFiles, ExportError>
where
    I: IntoIterator<Item = (Shape, Vec<FieldValue>)>,
{
    let mut writer = LayerWriter::new(dir, name, shape_type, fields, ctx.code_page)
        .map_err(|e| ExportError::layer(name, e))?
        .with_update_date(ctx.update_date);

    for (shape, values) in rows {
        writer
            .write(&shape, &values)
            .map_err(|e| ExportError::layer(name, e))?;
    }

    let files = writer
        .finish(ctx.transformer.destination_wkt())
        .map_err(|e| ExportError::layer(name, e))?;

    debug!(layer = %name, records = files.records, "Group layer ready");
    Ok(files)
}

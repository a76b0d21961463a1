//! Regroupement des observations par (date, individu, type de géométrie)

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::model::{GeometryKind, ObservationFeature, ObservedGeometry};

/// Clé d'une couche exportée
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    /// Date du relevé au format `YYYYMMDD`
    pub date_prefix: String,
    pub individual_id: String,
    pub geometry_kind: GeometryKind,
}

impl GroupKey {
    /// Nom de base de la couche: `{date}_{individu}_{suffixe}`
    ///
    /// Les séparateurs de chemin et caractères interdits dans un nom de
    /// fichier sont remplacés par `_` dans l'identifiant d'individu.
    pub fn layer_name(&self) -> String {
        self.compose_name(None)
    }

    /// Nom de base avec une étiquette après l'individu: `{date}_{individu}-{tag}_{suffixe}`
    fn tagged_layer_name(&self, tag: &str) -> String {
        self.compose_name(Some(tag))
    }

    fn compose_name(&self, tag: Option<&str>) -> String {
        let mut individual: String = self
            .individual_id
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        if let Some(tag) = tag {
            individual.push('-');
            individual.push_str(tag);
        }
        format!(
            "{}_{}_{}",
            self.date_prefix,
            individual,
            self.geometry_kind.suffix()
        )
    }
}

/// Noms de couche uniques, dans l'ordre des clés
///
/// Deux clés distinctes peuvent donner le même nom (caractères remplacés,
/// casse sur un système de fichiers insensible à la casse). La première
/// garde son nom, les suivantes reçoivent les 8 premiers caractères hex du
/// blake3 de l'identifiant d'individu brut.
pub fn unique_layer_names<'k, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'k GroupKey>,
{
    let mut used: HashSet<String> = HashSet::new();

    keys.into_iter()
        .map(|key| {
            let base = key.layer_name();
            if used.insert(base.to_lowercase()) {
                return base;
            }

            let hash = blake3::hash(key.individual_id.as_bytes()).to_hex();
            let tag = &hash.as_str()[..8];
            let mut name = key.tagged_layer_name(tag);
            let mut n = 2;
            while !used.insert(name.to_lowercase()) {
                name = key.tagged_layer_name(&format!("{}{}", tag, n));
                n += 1;
            }

            warn!(
                individual_id = %key.individual_id,
                layer = %base,
                renamed = %name,
                "Layer name collision, renamed"
            );
            name
        })
        .collect()
}

/// Observation retenue avec sa géométrie décodée
#[derive(Debug, Clone)]
pub struct GroupedFeature<'a> {
    pub feature: &'a ObservationFeature,
    pub geometry: ObservedGeometry,
}

/// Résultat du regroupement
#[derive(Debug, Default)]
pub struct Grouping<'a> {
    /// Groupes dans l'ordre des clés, observations dans l'ordre d'entrée
    pub groups: BTreeMap<GroupKey, Vec<GroupedFeature<'a>>>,
    /// Observations écartées par le filtre d'individus
    pub filtered: usize,
    /// Observations écartées pour géométrie illisible
    pub malformed: usize,
}

impl Grouping<'_> {
    /// Nombre d'observations retenues
    pub fn feature_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Préfixe `YYYYMMDD` d'une date
pub fn date_prefix(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Regroupe les observations
///
/// `fallback_date` remplace une date de relevé inconnue; elle est fixée une
/// seule fois par l'appelant pour tout l'export.
pub fn group_features<'a>(
    features: &'a [ObservationFeature],
    individual_filter: Option<&HashSet<String>>,
    fallback_date: NaiveDate,
) -> Grouping<'a> {
    let mut grouping = Grouping::default();
    let fallback_prefix = date_prefix(fallback_date);

    for feature in features {
        let props = &feature.properties;

        if let Some(filter) = individual_filter {
            if !filter.contains(&props.individual_id) {
                grouping.filtered += 1;
                continue;
            }
        }

        let geometry = match feature.parse_geometry() {
            Ok(geometry) => geometry,
            Err(e) => {
                debug!(observation_id = props.observation_id, error = %e, "Skipping observation");
                grouping.malformed += 1;
                continue;
            }
        };

        let key = GroupKey {
            date_prefix: feature
                .survey_date
                .map(date_prefix)
                .unwrap_or_else(|| fallback_prefix.clone()),
            individual_id: props.individual_id.clone(),
            geometry_kind: feature.geometry_kind,
        };

        grouping
            .groups
            .entry(key)
            .or_default()
            .push(GroupedFeature { feature, geometry });
    }

    if grouping.malformed > 0 {
        warn!(
            skipped = grouping.malformed,
            "Observations skipped for malformed geometry"
        );
    }

    debug!(
        groups = grouping.groups.len(),
        features = grouping.feature_count(),
        filtered = grouping.filtered,
        "Observations grouped"
    );

    grouping
}

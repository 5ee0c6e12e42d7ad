//! Référencement des entités sur l'axe
//!
//! Pour chaque entité: projection du point représentatif, abscisse formatée,
//! distance à l'axe, nom. Le filtrage par rayon et le tri par abscisse
//! rendent des copies indépendantes.

use rayon::prelude::*;
use tracing::debug;

use crate::chainage::format_chainage;
use crate::projection::project;
use crate::types::{Alignment, AnnotatedFeature, RawFeature, UNNAMED};

/// Référence une collection d'entités sur l'axe.
///
/// L'ordre de sortie est celui de l'entrée. Le nom est lu dans `name_field`;
/// un champ absent, nul ou vide donne `sin_nombre`.
pub fn annotate(
    features: &[RawFeature],
    alignment: &Alignment,
    name_field: &str,
) -> Vec<AnnotatedFeature> {
    let annotated: Vec<AnnotatedFeature> = features
        .iter()
        .enumerate()
        .map(|(index, feature)| annotate_one(index, feature, alignment, name_field))
        .collect();

    debug!(features = annotated.len(), "Annotated features");
    annotated
}

/// Variante parallèle (rayon) de [`annotate`], même résultat dans le même ordre
pub fn annotate_par(
    features: &[RawFeature],
    alignment: &Alignment,
    name_field: &str,
) -> Vec<AnnotatedFeature> {
    let annotated: Vec<AnnotatedFeature> = features
        .par_iter()
        .enumerate()
        .map(|(index, feature)| annotate_one(index, feature, alignment, name_field))
        .collect();

    debug!(features = annotated.len(), "Annotated features (parallel)");
    annotated
}

fn annotate_one(
    index: usize,
    feature: &RawFeature,
    alignment: &Alignment,
    name_field: &str,
) -> AnnotatedFeature {
    let point = feature.geometry.representative_point();
    let projection = project(point, alignment);

    let name = feature
        .attributes
        .name(name_field)
        .unwrap_or(UNNAMED)
        .to_string();

    AnnotatedFeature {
        source_index: index,
        name,
        offset_m: projection.offset_m,
        side_offset_m: projection.side_offset_m,
        chainage_m: projection.distance_along_m,
        chainage_label: format_chainage(projection.distance_along_m),
        x: point.x(),
        y: point.y(),
        x_axis: projection.point.x(),
        y_axis: projection.point.y(),
        geometry: feature.geometry.original(),
    }
}

/// Garde les entités à `radius_m` ou moins de l'axe (borne incluse)
pub fn filter_by_radius(annotated: &[AnnotatedFeature], radius_m: f64) -> Vec<AnnotatedFeature> {
    annotated
        .iter()
        .filter(|f| f.offset_m <= radius_m)
        .cloned()
        .collect()
}

/// Trie par abscisse croissante; tri stable, les égalités gardent l'ordre d'entrée
pub fn sort_by_chainage(annotated: &[AnnotatedFeature]) -> Vec<AnnotatedFeature> {
    let mut sorted = annotated.to_vec();
    sorted.sort_by(|a, b| a.chainage_m.total_cmp(&b.chainage_m));
    sorted
}

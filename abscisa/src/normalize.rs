//! Normalisation de l'axe en une seule polyligne
//!
//! Les exports KML fragmentent souvent l'axe en MultiLineString. Les parties
//! qui se touchent bout à bout sont fusionnées; sinon les sommets sont
//! concaténés dans l'ordre donné.

use geo::{Coord, Geometry, LineString};
use tracing::{debug, warn};

use crate::types::{geometry_kind, Alignment, RawFeature};
use crate::AbscisaError;

/// Tolérance de raccord entre extrémités (mètres)
const TOLERANCE: f64 = 1e-6;

/// Ramène une géométrie linéaire à une polyligne unique.
///
/// Une LineString est rendue telle quelle. Une MultiLineString dont les
/// parties se chaînent est fusionnée (la première partie fixe le sens); à
/// défaut, les sommets de toutes les parties sont concaténés dans l'ordre.
///
/// # Errors
///
/// `GeometryType` pour tout type non linéaire (point, polygone, ...).
pub fn normalize(geometry: &Geometry<f64>) -> Result<LineString<f64>, AbscisaError> {
    match geometry {
        Geometry::LineString(ls) => Ok(ls.clone()),
        Geometry::Line(l) => Ok(LineString::new(vec![l.start, l.end])),
        Geometry::MultiLineString(mls) => {
            let parts: Vec<&LineString<f64>> = mls.0.iter().filter(|ls| !ls.0.is_empty()).collect();

            match parts.len() {
                0 => return Ok(LineString::new(Vec::new())),
                1 => return Ok(parts[0].clone()),
                _ => {}
            }

            if let Some(merged) = merge_parts(&parts) {
                debug!(parts = parts.len(), vertices = merged.0.len(), "Merged line parts");
                return Ok(merged);
            }

            warn!(
                parts = parts.len(),
                "Line parts are not connected, concatenating vertices in given order"
            );
            let coords: Vec<Coord<f64>> = parts.iter().flat_map(|ls| ls.0.iter().copied()).collect();
            Ok(LineString::new(coords))
        }
        other => Err(AbscisaError::GeometryType {
            expected: "LineString or MultiLineString",
            found: geometry_kind(other),
        }),
    }
}

/// Chaîne les parties bout à bout; `None` si elles ne forment pas un seul chemin
fn merge_parts(parts: &[&LineString<f64>]) -> Option<LineString<f64>> {
    let (first, rest) = parts.split_first()?;
    let mut chain: Vec<Coord<f64>> = first.0.clone();
    let mut remaining: Vec<Vec<Coord<f64>>> = rest.iter().map(|ls| ls.0.clone()).collect();

    while !remaining.is_empty() {
        let chain_first = chain[0];
        let chain_last = chain[chain.len() - 1];
        let mut attached = false;

        for i in 0..remaining.len() {
            let part = &remaining[i];
            let part_first = part[0];
            let part_last = part[part.len() - 1];

            if coords_equal(chain_last, part_first) {
                // Cas 1: suite directe
                let part = remaining.remove(i);
                chain.extend(part.into_iter().skip(1));
            } else if coords_equal(chain_last, part_last) {
                // Cas 2: suite inversée
                let part = remaining.remove(i);
                chain.extend(part.into_iter().rev().skip(1));
            } else if coords_equal(chain_first, part_last) {
                // Cas 3: insertion au début
                let mut part = remaining.remove(i);
                part.pop();
                part.extend(chain);
                chain = part;
            } else if coords_equal(chain_first, part_first) {
                // Cas 4: insertion inversée au début
                let part = remaining.remove(i);
                let mut reversed: Vec<Coord<f64>> = part.into_iter().rev().collect();
                reversed.pop();
                reversed.extend(chain);
                chain = reversed;
            } else {
                continue;
            }
            attached = true;
            break;
        }

        if !attached {
            return None;
        }
    }

    Some(LineString::new(chain))
}

/// Compare deux coordonnées avec tolérance
fn coords_equal(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
}

/// Extrait l'axe de la première entité d'une collection.
///
/// La source d'axe contient normalement une seule ligne de référence par
/// tramo; les entités suivantes sont ignorées.
///
/// # Errors
///
/// `EmptyInput` si la collection est vide, `GeometryType` si la première
/// géométrie n'est pas linéaire, `DegenerateAlignment` si la ligne obtenue a
/// moins de 2 sommets.
pub fn extract_primary(features: &[RawFeature]) -> Result<Alignment, AbscisaError> {
    let first = features.first().ok_or_else(|| {
        AbscisaError::EmptyInput("alignment source has no features".to_string())
    })?;

    if features.len() > 1 {
        debug!(
            ignored = features.len() - 1,
            "Alignment source has several features, using the first one"
        );
    }

    let line = normalize(&first.geometry.original())?;
    Alignment::new(line)
}

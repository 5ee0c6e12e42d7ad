//! Projection plane d'un point sur l'axe
//!
//! Balayage segment par segment: paramètre scalaire projeté sur chaque
//! segment, borné à [0, 1], minimum global de distance. Les distances sont
//! euclidiennes dans l'unité du système projeté (mètres); aucune courbure
//! géodésique n'est prise en compte.

use geo::{Coord, Point};

use crate::chainage::{generate_markers, MarkerSeries};
use crate::types::{distance, Alignment, LineProjection};
use crate::AbscisaError;

/// Projette un point sur l'axe.
///
/// Un point dont la projection tomberait avant le début ou après la fin est
/// ramené à l'extrémité correspondante (abscisse 0 ou longueur totale). En cas
/// d'égalité entre deux segments, le premier dans le sens de l'axe l'emporte.
pub fn project(point: Point<f64>, alignment: &Alignment) -> LineProjection {
    let p = point.0;
    let vertices = alignment.vertices();
    let cumulative = alignment.cumulative_lengths();

    if alignment.length_m() == 0.0 {
        let start = vertices[0];
        let offset = distance(p, start);
        return LineProjection {
            point: Point(start),
            distance_along_m: 0.0,
            offset_m: offset,
            side_offset_m: 0.0,
            segment_index: 0,
        };
    }

    let mut best: Option<Candidate> = None;

    for (i, segment) in vertices.windows(2).enumerate() {
        let (a, b) = (segment[0], segment[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len2 = dx * dx + dy * dy;
        // Sommets dupliqués: le segment voisin couvre le même point
        if len2 == 0.0 {
            continue;
        }

        let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
        let q = Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        };
        let d2 = (p.x - q.x).powi(2) + (p.y - q.y).powi(2);

        if best.as_ref().map_or(true, |c| d2 < c.d2) {
            let cross = dx * (p.y - a.y) - dy * (p.x - a.x);
            best = Some(Candidate {
                d2,
                segment_index: i,
                t,
                point: q,
                cross,
            });
        }
    }

    // length_m > 0 garantit au moins un segment non dégénéré
    let Some(best) = best else {
        return LineProjection {
            point: Point(vertices[0]),
            distance_along_m: 0.0,
            offset_m: distance(p, vertices[0]),
            side_offset_m: 0.0,
            segment_index: 0,
        };
    };

    let i = best.segment_index;
    let segment_length = cumulative[i + 1] - cumulative[i];
    let distance_along_m =
        (cumulative[i] + best.t * segment_length).clamp(0.0, alignment.length_m());
    let offset_m = best.d2.sqrt();
    let side_offset_m = if best.cross > 0.0 {
        offset_m
    } else if best.cross < 0.0 {
        -offset_m
    } else {
        0.0
    };

    LineProjection {
        point: Point(best.point),
        distance_along_m,
        offset_m,
        side_offset_m,
        segment_index: i,
    }
}

struct Candidate {
    d2: f64,
    segment_index: usize,
    t: f64,
    point: Coord<f64>,
    cross: f64,
}

/// Distance perpendiculaire (non signée) entre le point et l'axe
pub fn perpendicular_distance(point: Point<f64>, alignment: &Alignment) -> f64 {
    project(point, alignment).offset_m
}

/// Distance signée: positive à gauche du sens de l'axe, négative à droite
pub fn signed_offset(point: Point<f64>, alignment: &Alignment) -> f64 {
    project(point, alignment).side_offset_m
}

/// Point de l'axe à une abscisse donnée (bornée à `[0, length_m]`)
pub fn interpolate(alignment: &Alignment, distance_m: f64) -> Point<f64> {
    let vertices = alignment.vertices();
    let cumulative = alignment.cumulative_lengths();
    let d = distance_m.clamp(0.0, alignment.length_m());

    // Premier sommet strictement au-delà de d
    let i = cumulative.partition_point(|&c| c <= d);
    if i == 0 {
        return Point(vertices[0]);
    }
    if i >= vertices.len() {
        return Point(vertices[vertices.len() - 1]);
    }

    let (a, b) = (vertices[i - 1], vertices[i]);
    let t = (d - cumulative[i - 1]) / (cumulative[i] - cumulative[i - 1]);
    Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
}

impl Alignment {
    /// Voir [`project`]
    pub fn project(&self, point: Point<f64>) -> LineProjection {
        project(point, self)
    }

    /// Voir [`perpendicular_distance`]
    pub fn perpendicular_distance(&self, point: Point<f64>) -> f64 {
        perpendicular_distance(point, self)
    }

    /// Voir [`signed_offset`]
    pub fn signed_offset(&self, point: Point<f64>) -> f64 {
        signed_offset(point, self)
    }

    /// Voir [`interpolate`]
    pub fn point_at(&self, distance_m: f64) -> Point<f64> {
        interpolate(self, distance_m)
    }

    /// Voir [`generate_markers`]
    pub fn markers(&self, interval_m: f64, start_m: f64) -> Result<MarkerSeries<'_>, AbscisaError> {
        generate_markers(self, interval_m, start_m)
    }
}

//! Types de données pour le crate abscisa

use std::collections::BTreeMap;

use geo::{Centroid, Coord, Geometry, LineString, Point};

use crate::AbscisaError;

/// Nom attribué aux entités sans nom exploitable
pub const UNNAMED: &str = "sin_nombre";

/// Axe du corridor: polyligne ouverte en coordonnées projetées (mètres).
///
/// L'ordre des sommets définit le sens des abscisses. L'axe est immuable une
/// fois construit; les longueurs cumulées par sommet sont calculées une seule
/// fois pour la projection et l'interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    line: LineString<f64>,
    /// Abscisse de chaque sommet (même longueur que `line.0`)
    cumulative: Vec<f64>,
}

impl Alignment {
    /// Construit un axe à partir d'une polyligne
    ///
    /// # Errors
    ///
    /// `DegenerateAlignment` si la ligne a moins de 2 sommets ou des
    /// coordonnées non finies.
    pub fn new(line: LineString<f64>) -> Result<Self, AbscisaError> {
        if line.0.len() < 2 {
            return Err(AbscisaError::DegenerateAlignment(format!(
                "expected at least 2 vertices, got {}",
                line.0.len()
            )));
        }
        if let Some(bad) = line.0.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(AbscisaError::DegenerateAlignment(format!(
                "non-finite vertex ({}, {})",
                bad.x, bad.y
            )));
        }

        let mut cumulative = Vec::with_capacity(line.0.len());
        let mut total = 0.0;
        cumulative.push(total);
        for segment in line.0.windows(2) {
            total += distance(segment[0], segment[1]);
            cumulative.push(total);
        }

        Ok(Self { line, cumulative })
    }

    /// Longueur totale de l'axe en mètres
    pub fn length_m(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Polyligne sous-jacente
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Sommets dans l'ordre des abscisses
    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Abscisse de chaque sommet
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative
    }

    /// Premier sommet (abscisse 0)
    pub fn start(&self) -> Point<f64> {
        Point(self.line.0[0])
    }

    /// Dernier sommet (abscisse `length_m`)
    pub fn end(&self) -> Point<f64> {
        Point(self.line.0[self.line.0.len() - 1])
    }

    /// Consomme l'axe et rend la polyligne
    pub fn into_line(self) -> LineString<f64> {
        self.line
    }
}

/// Distance euclidienne plane entre deux coordonnées
pub(crate) fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Géométrie d'une entité à référencer.
///
/// Les lignes et polygones sont ramenés à leur centroïde pour la projection;
/// la géométrie d'origine est conservée pour les exports.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// Point (sondage, ouvrage ponctuel)
    Point(Point<f64>),
    /// LineString ou MultiLineString
    Line {
        original: Geometry<f64>,
        centroid: Point<f64>,
    },
    /// Polygon ou MultiPolygon (sources de matériaux, zones de dépôt)
    Polygon {
        original: Geometry<f64>,
        centroid: Point<f64>,
    },
}

impl FeatureGeometry {
    /// Classe une géométrie `geo` et calcule son centroïde si nécessaire
    ///
    /// # Errors
    ///
    /// `GeometryType` pour les MultiPoint et GeometryCollection,
    /// `EmptyInput` si la géométrie n'a pas de centroïde (vide).
    pub fn from_geometry(geometry: Geometry<f64>) -> Result<Self, AbscisaError> {
        let geometry = match geometry {
            Geometry::Point(p) => return Ok(Self::Point(p)),
            Geometry::Line(l) => Geometry::LineString(LineString::new(vec![l.start, l.end])),
            Geometry::Rect(r) => Geometry::Polygon(r.to_polygon()),
            Geometry::Triangle(t) => Geometry::Polygon(t.to_polygon()),
            other => other,
        };

        let centroid = |g: &Geometry<f64>| {
            g.centroid().ok_or_else(|| {
                AbscisaError::EmptyInput(format!("{} without centroid", geometry_kind(g)))
            })
        };

        match geometry {
            Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                let centroid = centroid(&geometry)?;
                Ok(Self::Line {
                    original: geometry,
                    centroid,
                })
            }
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
                let centroid = centroid(&geometry)?;
                Ok(Self::Polygon {
                    original: geometry,
                    centroid,
                })
            }
            other => Err(AbscisaError::GeometryType {
                expected: "Point, LineString or Polygon",
                found: geometry_kind(&other),
            }),
        }
    }

    /// Point représentatif utilisé pour la projection
    pub fn representative_point(&self) -> Point<f64> {
        match self {
            Self::Point(p) => *p,
            Self::Line { centroid, .. } | Self::Polygon { centroid, .. } => *centroid,
        }
    }

    /// Géométrie d'origine
    pub fn original(&self) -> Geometry<f64> {
        match self {
            Self::Point(p) => Geometry::Point(*p),
            Self::Line { original, .. } | Self::Polygon { original, .. } => original.clone(),
        }
    }

    /// Nom du type ("Point", "Line", "Polygon")
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::Line { .. } => "Line",
            Self::Polygon { .. } => "Polygon",
        }
    }
}

/// Nom lisible du type d'une géométrie `geo`
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Attributs d'une entité: clé -> valeur optionnelle (null, NaN, cellule vide)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<String, Option<String>>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insère ou remplace une valeur
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// Valeur d'un champ, `None` si absent ou nul
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Nom exploitable, tel quel; `None` si absent, nul ou uniquement blanc
    pub fn name(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|s| !s.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Une entité brute: géométrie + attributs
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub geometry: FeatureGeometry,
    pub attributes: Attributes,
}

impl RawFeature {
    pub fn new(geometry: FeatureGeometry, attributes: Attributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Entité ponctuelle nommée (raccourci pratique pour les tests et les CSV)
    pub fn point(x: f64, y: f64, name_field: &str, name: Option<&str>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(name_field, name.map(str::to_string));
        Self::new(FeatureGeometry::Point(Point::new(x, y)), attributes)
    }
}

/// Résultat de la projection d'un point sur l'axe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// Point de l'axe le plus proche
    pub point: Point<f64>,
    /// Abscisse du point projeté, dans `[0, length_m]`
    pub distance_along_m: f64,
    /// Distance perpendiculaire (toujours >= 0)
    pub offset_m: f64,
    /// Distance signée: positive à gauche du sens de l'axe, négative à droite
    pub side_offset_m: f64,
    /// Index du segment portant la projection
    pub segment_index: usize,
}

/// Une entité référencée sur l'axe
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedFeature {
    /// Position de l'entité dans la collection d'entrée
    pub source_index: usize,
    /// Nom (jamais vide, `sin_nombre` par défaut)
    pub name: String,
    /// Distance perpendiculaire à l'axe
    pub offset_m: f64,
    /// Distance signée (gauche > 0, droite < 0)
    pub side_offset_m: f64,
    /// Abscisse en mètres, dans `[0, length_m]`
    pub chainage_m: f64,
    /// Abscisse au format `K{km}+{m:03}`
    pub chainage_label: String,
    /// Coordonnées du point représentatif
    pub x: f64,
    pub y: f64,
    /// Coordonnées du point projeté sur l'axe
    pub x_axis: f64,
    pub y_axis: f64,
    /// Géométrie d'origine (polygone, ligne ou point)
    pub geometry: Geometry<f64>,
}

impl AnnotatedFeature {
    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }

    pub fn axis_point(&self) -> Point<f64> {
        Point::new(self.x_axis, self.y_axis)
    }
}

/// Repère d'abscisse le long de l'axe
#[derive(Debug, Clone, PartialEq)]
pub struct ChainageMarker {
    pub point: Point<f64>,
    pub distance_m: f64,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, Polygon};

    #[test]
    fn test_alignment_length() {
        let axis = Alignment::new(LineString::from(vec![(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]))
            .unwrap();
        assert_eq!(axis.length_m(), 11.0);
        assert_eq!(axis.cumulative_lengths(), &[0.0, 5.0, 11.0]);
    }

    #[test]
    fn test_alignment_too_short() {
        let result = Alignment::new(LineString::from(vec![(0.0, 0.0)]));
        assert!(matches!(result, Err(AbscisaError::DegenerateAlignment(_))));
    }

    #[test]
    fn test_alignment_non_finite() {
        let result = Alignment::new(LineString::from(vec![(0.0, 0.0), (f64::NAN, 1.0)]));
        assert!(result.is_err());
    }

    #[test]
    fn test_polygon_uses_centroid() {
        let square: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let geometry = FeatureGeometry::from_geometry(Geometry::Polygon(square.clone())).unwrap();

        assert_eq!(geometry.kind(), "Polygon");
        let centroid = geometry.representative_point();
        assert_relative_eq!(centroid.x(), 50.0);
        assert_relative_eq!(centroid.y(), 50.0);
        assert_eq!(geometry.original(), Geometry::Polygon(square));
    }

    #[test]
    fn test_multipoint_rejected() {
        let mp = geo::MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        let result = FeatureGeometry::from_geometry(Geometry::MultiPoint(mp));
        assert!(matches!(
            result,
            Err(AbscisaError::GeometryType {
                found: "MultiPoint",
                ..
            })
        ));
    }

    #[test]
    fn test_attribute_name_fallbacks() {
        let attributes: Attributes = [
            ("Name", None),
            ("blank", Some("   ".to_string())),
            ("label", Some(" Fuente 3 ".to_string())),
        ]
        .into_iter()
        .collect();

        assert_eq!(attributes.name("Name"), None);
        assert_eq!(attributes.name("missing"), None);
        assert_eq!(attributes.name("blank"), None);
        // nom non vide conservé tel quel
        assert_eq!(attributes.name("label"), Some(" Fuente 3 "));
    }
}

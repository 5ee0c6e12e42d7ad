//! Export DXF R12 (ASCII) pour la DAO
//!
//! Un fichier par calque: axe `EJE_<TRAMO>`, `FUENTES`, `ZONAS_DISPOSICION`,
//! `SONDEOS`, `ABSCISAS`. Polygones en polylignes fermées (un anneau par
//! polyligne), lignes en polylignes ouvertes, points en POINT.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString};
use tracing::debug;

use abscisa::{Alignment, ChainageMarker, RawFeature};

use super::layer_name;

/// Calque des sources de matériaux
pub const SOURCES_LAYER: &str = "FUENTES";
/// Calque des zones de dépôt
pub const DISPOSAL_LAYER: &str = "ZONAS_DISPOSICION";
/// Calque des sondages
pub const BOREHOLES_LAYER: &str = "SONDEOS";
/// Calque des repères d'abscisse
pub const MARKERS_LAYER: &str = "ABSCISAS";

/// Hauteur des étiquettes d'abscisse (unités du dessin, mètres)
pub const LABEL_HEIGHT: f64 = 5.0;

/// Entité DXF
#[derive(Debug, Clone, PartialEq)]
pub enum DxfEntity {
    Polyline { points: Vec<Coord<f64>>, closed: bool },
    Point(Coord<f64>),
    Text {
        at: Coord<f64>,
        height: f64,
        value: String,
    },
}

/// Document DXF mono-calque
#[derive(Debug, Clone)]
pub struct DxfDocument {
    layer: String,
    entities: Vec<DxfEntity>,
}

impl DxfDocument {
    pub fn new(layer: &str) -> Self {
        Self {
            layer: layer_name(layer),
            entities: Vec::new(),
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[DxfEntity] {
        &self.entities
    }

    pub fn add_polyline(&mut self, line: &LineString<f64>, closed: bool) {
        let mut points = line.0.clone();
        // la fermeture est portée par le drapeau 70
        if closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() >= 2 {
            self.entities.push(DxfEntity::Polyline { points, closed });
        }
    }

    pub fn add_point(&mut self, at: Coord<f64>) {
        self.entities.push(DxfEntity::Point(at));
    }

    pub fn add_text(&mut self, at: Coord<f64>, height: f64, value: &str) {
        self.entities.push(DxfEntity::Text {
            at,
            height,
            value: value.to_string(),
        });
    }

    /// Ajoute une géométrie `geo` quelconque
    pub fn add_geometry(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.add_point(p.0),
            Geometry::Line(l) => self.add_polyline(&LineString::new(vec![l.start, l.end]), false),
            Geometry::LineString(ls) => self.add_polyline(ls, false),
            Geometry::Polygon(p) => {
                self.add_polyline(p.exterior(), true);
                for ring in p.interiors() {
                    self.add_polyline(ring, true);
                }
            }
            Geometry::MultiPoint(mp) => mp.iter().for_each(|p| self.add_point(p.0)),
            Geometry::MultiLineString(mls) => mls.iter().for_each(|ls| self.add_polyline(ls, false)),
            Geometry::MultiPolygon(mp) => mp
                .iter()
                .for_each(|p| self.add_geometry(&Geometry::Polygon(p.clone()))),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| self.add_geometry(g)),
            Geometry::Rect(r) => self.add_geometry(&Geometry::Polygon(r.to_polygon())),
            Geometry::Triangle(t) => self.add_geometry(&Geometry::Polygon(t.to_polygon())),
        }
    }

    /// Écrit le document dans un fichier
    pub fn export(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .with_context(|| format!("Failed to write DXF: {}", path.display()))?;
        writer.flush()?;
        debug!(path = %path.display(), entities = self.len(), "DXF written");
        Ok(())
    }

    /// Sérialise en DXF R12: couples code de groupe / valeur, une ligne chacun
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        pair(w, 0, "SECTION")?;
        pair(w, 2, "HEADER")?;
        pair(w, 9, "$ACADVER")?;
        pair(w, 1, "AC1009")?;
        pair(w, 0, "ENDSEC")?;

        pair(w, 0, "SECTION")?;
        pair(w, 2, "TABLES")?;
        pair(w, 0, "TABLE")?;
        pair(w, 2, "LAYER")?;
        pair(w, 70, "1")?;
        pair(w, 0, "LAYER")?;
        pair(w, 2, &self.layer)?;
        pair(w, 70, "0")?;
        pair(w, 62, "7")?;
        pair(w, 6, "CONTINUOUS")?;
        pair(w, 0, "ENDTAB")?;
        pair(w, 0, "ENDSEC")?;

        pair(w, 0, "SECTION")?;
        pair(w, 2, "ENTITIES")?;
        for entity in &self.entities {
            self.write_entity(w, entity)?;
        }
        pair(w, 0, "ENDSEC")?;
        pair(w, 0, "EOF")
    }

    fn write_entity<W: Write>(&self, w: &mut W, entity: &DxfEntity) -> std::io::Result<()> {
        match entity {
            DxfEntity::Polyline { points, closed } => {
                pair(w, 0, "POLYLINE")?;
                pair(w, 8, &self.layer)?;
                pair(w, 66, "1")?;
                coord(w, Coord { x: 0.0, y: 0.0 })?;
                pair(w, 70, if *closed { "1" } else { "0" })?;
                for p in points {
                    pair(w, 0, "VERTEX")?;
                    pair(w, 8, &self.layer)?;
                    coord(w, *p)?;
                }
                pair(w, 0, "SEQEND")?;
                pair(w, 8, &self.layer)
            }
            DxfEntity::Point(p) => {
                pair(w, 0, "POINT")?;
                pair(w, 8, &self.layer)?;
                coord(w, *p)
            }
            DxfEntity::Text { at, height, value } => {
                pair(w, 0, "TEXT")?;
                pair(w, 8, &self.layer)?;
                coord(w, *at)?;
                pair(w, 40, &format!("{:.3}", height))?;
                pair(w, 1, value)
            }
        }
    }
}

fn pair<W: Write>(w: &mut W, code: u16, value: &str) -> std::io::Result<()> {
    writeln!(w, "{:>3}", code)?;
    writeln!(w, "{}", value)
}

fn coord<W: Write>(w: &mut W, c: Coord<f64>) -> std::io::Result<()> {
    pair(w, 10, &format!("{:.4}", c.x))?;
    pair(w, 20, &format!("{:.4}", c.y))?;
    pair(w, 30, "0.0")
}

/// Axe du tramo: `EJE_<TRAMO>.dxf`
pub fn export_axis(alignment: &Alignment, tramo: &str, dir: &Path) -> Result<PathBuf> {
    let mut doc = DxfDocument::new(&format!("EJE_{}", tramo));
    doc.add_polyline(alignment.line(), false);

    let path = dir.join(format!("{}.dxf", doc.layer()));
    doc.export(&path)?;
    Ok(path)
}

/// Géométries d'origine de toute la couche chargée, sans filtre de rayon;
/// `None` si la couche est vide
pub fn export_features(features: &[RawFeature], layer: &str, dir: &Path) -> Result<Option<PathBuf>> {
    if features.is_empty() {
        return Ok(None);
    }

    let mut doc = DxfDocument::new(layer);
    for feature in features {
        doc.add_geometry(&feature.geometry.original());
    }

    let path = dir.join(format!("{}.dxf", doc.layer()));
    doc.export(&path)?;
    Ok(Some(path))
}

/// Repères d'abscisse: un POINT et une étiquette TEXT par repère
pub fn export_markers(markers: &[ChainageMarker], dir: &Path) -> Result<Option<PathBuf>> {
    if markers.is_empty() {
        return Ok(None);
    }

    let mut doc = DxfDocument::new(MARKERS_LAYER);
    for marker in markers {
        doc.add_point(marker.point.0);
        doc.add_text(marker.point.0, LABEL_HEIGHT, &marker.label);
    }

    let path = dir.join(format!("{}.dxf", doc.layer()));
    doc.export(&path)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Point};

    fn render(doc: &DxfDocument) -> String {
        let mut buf = Vec::new();
        doc.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_polygon_ring_closed() {
        let mut doc = DxfDocument::new("fuentes");
        doc.add_geometry(&Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]));

        assert_eq!(doc.layer(), "FUENTES");
        let DxfEntity::Polyline { points, closed } = &doc.entities()[0] else {
            panic!("Expected polyline");
        };
        assert!(closed);
        // sommet de fermeture retiré
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_document_structure() {
        let mut doc = DxfDocument::new("ABSCISAS");
        doc.add_point(Coord { x: 1.0, y: 2.0 });
        doc.add_text(Coord { x: 1.0, y: 2.0 }, LABEL_HEIGHT, "K0+000");
        doc.add_polyline(&LineString::from(vec![(0.0, 0.0), (5.0, 5.0)]), false);

        let dxf = render(&doc);
        assert!(dxf.contains("$ACADVER\n  1\nAC1009"));
        assert!(dxf.contains("  0\nPOINT\n  8\nABSCISAS\n 10\n1.0000\n 20\n2.0000"));
        assert!(dxf.contains("  0\nTEXT"));
        assert!(dxf.contains("  1\nK0+000"));
        assert_eq!(dxf.matches("VERTEX").count(), 2);
        assert!(dxf.contains("SEQEND"));
        assert!(dxf.ends_with("  0\nEOF\n"));
    }

    #[test]
    fn test_degenerate_polyline_ignored() {
        let mut doc = DxfDocument::new("EJE");
        doc.add_polyline(&LineString::from(vec![(0.0, 0.0)]), false);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_export_bundle_files() {
        let dir = std::env::temp_dir().join("vv_test_dxf");
        std::fs::create_dir_all(&dir).unwrap();

        let axis = Alignment::new(LineString::from(vec![(0.0, 0.0), (1000.0, 0.0)])).unwrap();
        let path = export_axis(&axis, "t6", &dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "EJE_T6.dxf");

        assert!(export_features(&[], SOURCES_LAYER, &dir).unwrap().is_none());
        let sources = vec![
            RawFeature::point(100.0, 50.0, "Name", Some("Cerca")),
            RawFeature::point(100.0, 90_000.0, "Name", Some("Lejos")),
        ];
        let path = export_features(&sources, SOURCES_LAYER, &dir).unwrap().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("POINT").count(), 2);
        assert!(content.contains("90000.0000"));

        let markers = vec![ChainageMarker {
            point: Point::new(500.0, 0.0),
            distance_m: 500.0,
            label: "K0+500".to_string(),
        }];
        let path = export_markers(&markers, &dir).unwrap().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("K0+500"));

        std::fs::remove_dir_all(dir).ok();
    }
}

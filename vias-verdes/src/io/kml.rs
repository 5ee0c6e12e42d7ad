//! Lecture KML / KMZ (exports Google Earth)
//!
//! Chaque `Placemark` devient une entité: `name` -> attribut `Name`,
//! `description` -> `Description`, plus les champs `ExtendedData`
//! (`Data`/`value` et `SchemaData`/`SimpleData`). Les coordonnées KML sont
//! toujours en WGS84 (EPSG:4326).

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use roxmltree::Node;
use tracing::{debug, warn};

use abscisa::{Attributes, FeatureGeometry, RawFeature};

use super::Layer;

/// EPSG des coordonnées KML
pub const KML_EPSG: u32 = 4326;

/// Charge un fichier KML
pub fn load(path: &Path) -> Result<Layer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_str(&content).with_context(|| format!("Invalid KML: {}", path.display()))
}

/// Charge un KMZ: `doc.kml` s'il existe, sinon le premier `.kml` de l'archive
pub fn load_kmz(path: &Path) -> Result<Layer> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Invalid KMZ archive: {}", path.display()))?;

    let Some(name) = kml_entry_name(&mut archive)? else {
        bail!("No .kml document in {}", path.display());
    };
    debug!(path = %path.display(), entry = %name, "Reading KMZ entry");

    let mut content = String::new();
    archive
        .by_name(&name)?
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read {} in {}", name, path.display()))?;

    parse_str(&content).with_context(|| format!("Invalid KML in {}", path.display()))
}

fn kml_entry_name<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Option<String>> {
    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        names.push(archive.by_index(i)?.name().to_string());
    }

    let doc = names.iter().find(|n| n.eq_ignore_ascii_case("doc.kml"));
    let first = names
        .iter()
        .find(|n| n.to_ascii_lowercase().ends_with(".kml"));
    Ok(doc.or(first).cloned())
}

/// Parse un document KML
pub fn parse_str(content: &str) -> Result<Layer> {
    let doc = roxmltree::Document::parse(content)?;
    ensure_closed(content, &doc)?;

    let mut layer = Layer {
        epsg: Some(KML_EPSG),
        ..Default::default()
    };

    for placemark in doc.descendants().filter(|n| is(n, "Placemark")) {
        let name = child_text(placemark, "name");

        let geometry = match placemark_geometry(placemark) {
            Ok(Some(geometry)) => geometry,
            Ok(None) => {
                debug!(name = ?name, "Placemark without geometry, skipped");
                layer.skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(name = ?name, error = %e, "Invalid placemark geometry, skipped");
                layer.skipped += 1;
                continue;
            }
        };

        let geometry = match FeatureGeometry::from_geometry(geometry) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(name = ?name, error = %e, "Unsupported placemark geometry, skipped");
                layer.skipped += 1;
                continue;
            }
        };

        let mut attributes = Attributes::new();
        attributes.insert("Name", name);
        attributes.insert("Description", child_text(placemark, "description"));
        extended_data(placemark, &mut attributes);

        layer.features.push(RawFeature::new(geometry, attributes));
    }

    Ok(layer)
}

/// Rejette les documents tronqués: l'élément racine doit être fermé
/// (`</kml>` final ou racine auto-fermante)
fn ensure_closed(content: &str, doc: &roxmltree::Document) -> Result<()> {
    let root = doc.root_element();
    let tail = content.trim_end();
    if !root.has_children() && tail.ends_with("/>") {
        return Ok(());
    }
    let closing = tail
        .strip_suffix('>')
        .and_then(|rest| rest.rfind("</").map(|i| &rest[i + 2..]))
        .map(str::trim_end);
    let local = closing.map(|name| name.rsplit(':').next().unwrap_or(name));
    if local != Some(root.tag_name().name()) {
        bail!(
            "Truncated KML document: root element <{}> is not closed",
            root.tag_name().name()
        );
    }
    Ok(())
}

fn is(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is(c, name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn extended_data(placemark: Node, attributes: &mut Attributes) {
    let Some(data) = child(placemark, "ExtendedData") else {
        return;
    };

    for node in data.descendants() {
        let Some(key) = node.attribute("name") else {
            continue;
        };
        let value = if is(&node, "Data") {
            child_text(node, "value")
        } else if is(&node, "SimpleData") {
            node.text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        } else {
            continue;
        };
        attributes.insert(key, value);
    }
}

const GEOMETRY_TAGS: [&str; 5] = ["Point", "LineString", "LinearRing", "Polygon", "MultiGeometry"];

fn placemark_geometry(placemark: Node) -> Result<Option<Geometry<f64>>> {
    match placemark
        .children()
        .find(|c| c.is_element() && GEOMETRY_TAGS.contains(&c.tag_name().name()))
    {
        Some(node) => parse_geometry(node),
        None => Ok(None),
    }
}

fn parse_geometry(node: Node) -> Result<Option<Geometry<f64>>> {
    let geometry = match node.tag_name().name() {
        "Point" => {
            let coords = coordinates(node)?;
            match coords.first() {
                Some(c) => Geometry::Point(Point(*c)),
                None => return Ok(None),
            }
        }
        "LineString" | "LinearRing" => Geometry::LineString(LineString::new(coordinates(node)?)),
        "Polygon" => Geometry::Polygon(parse_polygon(node)?),
        "MultiGeometry" => {
            let mut members = Vec::new();
            for c in node.children().filter(|c| c.is_element()) {
                if let Some(g) = parse_geometry(c)? {
                    members.push(g);
                }
            }
            match combine(members) {
                Some(g) => g,
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(geometry))
}

fn parse_polygon(node: Node) -> Result<Polygon<f64>> {
    let ring = |boundary: Node| -> Result<LineString<f64>> {
        match child(boundary, "LinearRing") {
            Some(ring) => Ok(LineString::new(coordinates(ring)?)),
            None => bail!("Polygon boundary without LinearRing"),
        }
    };

    let Some(outer) = child(node, "outerBoundaryIs") else {
        bail!("Polygon without outerBoundaryIs");
    };
    let exterior = ring(outer)?;
    let interiors = node
        .children()
        .filter(|c| is(c, "innerBoundaryIs"))
        .map(ring)
        .collect::<Result<Vec<_>>>()?;

    // Polygon::new ferme les anneaux
    Ok(Polygon::new(exterior, interiors))
}

/// Regroupe les membres d'une MultiGeometry par type homogène
fn combine(members: Vec<Geometry<f64>>) -> Option<Geometry<f64>> {
    if members.len() <= 1 {
        return members.into_iter().next();
    }

    if members.iter().all(|g| matches!(g, Geometry::LineString(_))) {
        let lines = members
            .into_iter()
            .filter_map(|g| match g {
                Geometry::LineString(ls) => Some(ls),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiLineString(MultiLineString::new(lines)));
    }
    if members.iter().all(|g| matches!(g, Geometry::Polygon(_))) {
        let polygons = members
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Polygon(p) => Some(p),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiPolygon(MultiPolygon::new(polygons)));
    }
    if members.iter().all(|g| matches!(g, Geometry::Point(_))) {
        let points = members
            .into_iter()
            .filter_map(|g| match g {
                Geometry::Point(p) => Some(p),
                _ => None,
            })
            .collect();
        return Some(Geometry::MultiPoint(MultiPoint::new(points)));
    }

    Some(Geometry::GeometryCollection(GeometryCollection::new_from(
        members,
    )))
}

/// Parse `lon,lat[,alt]` séparés par des blancs
fn coordinates(node: Node) -> Result<Vec<Coord<f64>>> {
    let Some(text) = child(node, "coordinates").and_then(|c| c.text()) else {
        return Ok(Vec::new());
    };

    text.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',');
            match (
                parts.next().map(str::parse::<f64>),
                parts.next().map(str::parse::<f64>),
            ) {
                (Some(Ok(x)), Some(Ok(y))) => Ok(Coord { x, y }),
                _ => bail!("Malformed coordinates: {}", tuple),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Folder>
      <Placemark>
        <name>Eje Tramo 6</name>
        <LineString>
          <coordinates>
            -74.10,4.60,0 -74.05,4.62,0
            -74.00,4.65,0
          </coordinates>
        </LineString>
      </Placemark>
      <Placemark>
        <name> Cantera La Esperanza </name>
        <description>Fuente de materiales</description>
        <ExtendedData>
          <Data name="tipo"><value>Cantera</value></Data>
          <SchemaData schemaUrl="#s"><SimpleData name="codigo">F-01</SimpleData></SchemaData>
        </ExtendedData>
        <Polygon>
          <outerBoundaryIs><LinearRing><coordinates>
            -74.0,4.5 -73.9,4.5 -73.9,4.6 -74.0,4.6 -74.0,4.5
          </coordinates></LinearRing></outerBoundaryIs>
        </Polygon>
      </Placemark>
      <Placemark>
        <name>Sin geometria</name>
      </Placemark>
      <Placemark>
        <MultiGeometry>
          <LineString><coordinates>0,0 1,0</coordinates></LineString>
          <LineString><coordinates>1,0 2,0</coordinates></LineString>
        </MultiGeometry>
      </Placemark>
    </Folder>
  </Document>
</kml>"##;

    #[test]
    fn test_parse_placemarks() {
        let layer = parse_str(DOC).unwrap();

        assert_eq!(layer.epsg, Some(4326));
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.skipped, 1);

        let axis = &layer.features[0];
        assert_eq!(axis.attributes.name("Name"), Some("Eje Tramo 6"));
        let Geometry::LineString(line) = axis.geometry.original() else {
            panic!("Expected LineString geometry");
        };
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[2], Coord { x: -74.0, y: 4.65 });
    }

    #[test]
    fn test_attributes() {
        let layer = parse_str(DOC).unwrap();
        let source = &layer.features[1];

        assert_eq!(source.geometry.kind(), "Polygon");
        assert_eq!(source.attributes.name("Name"), Some("Cantera La Esperanza"));
        assert_eq!(
            source.attributes.get("Description"),
            Some("Fuente de materiales")
        );
        assert_eq!(source.attributes.get("tipo"), Some("Cantera"));
        assert_eq!(source.attributes.get("codigo"), Some("F-01"));
    }

    #[test]
    fn test_multigeometry_lines() {
        let layer = parse_str(DOC).unwrap();
        let multi = &layer.features[2];

        assert!(matches!(
            multi.geometry.original(),
            Geometry::MultiLineString(ref mls) if mls.0.len() == 2
        ));
        assert_eq!(multi.attributes.name("Name"), None);
    }

    #[test]
    fn test_malformed_coordinates_skipped() {
        let doc = r#"<kml><Placemark><Point><coordinates>abc</coordinates></Point></Placemark></kml>"#;
        let layer = parse_str(doc).unwrap();
        assert!(layer.is_empty());
        assert_eq!(layer.skipped, 1);
    }

    #[test]
    fn test_invalid_xml() {
        assert!(parse_str("<kml><Placemark>").is_err());
        assert!(parse_str("<kml><Placemark><name>A</name></Placemark>").is_err());
        assert!(parse_str("<kml/>").unwrap().is_empty());
        assert!(parse_str("<kml:kml xmlns:kml=\"http://www.opengis.net/kml/2.2\"></kml:kml>\n").is_ok());
    }

    #[test]
    fn test_load_kmz() {
        let path = std::env::temp_dir().join("vv_test_eje.kmz");
        {
            let file = File::create(&path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("files/readme.txt", zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(b"not a kml").unwrap();
            zip.start_file("doc.kml", zip::write::FileOptions::default())
                .unwrap();
            zip.write_all(DOC.as_bytes()).unwrap();
            zip.finish().unwrap();
        }

        let layer = load_kmz(&path).unwrap();
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.epsg, Some(4326));

        std::fs::remove_file(path).ok();
    }
}

//! Export GeoJSON avec geozero (écriture en flux)
//!
//! Le CRS est déclaré dans le membre `crs` (GeoJSON 2008), les géométries
//! restent dans le CRS de calcul.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use abscisa::{Alignment, AnnotatedFeature, ChainageMarker};

/// Valeur de propriété
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Text(String),
    Number(f64),
}

/// Entité prête à écrire
#[derive(Debug, Clone)]
pub struct OutputFeature {
    pub id: String,
    pub geometry: Geometry<f64>,
    pub properties: Vec<(&'static str, Property)>,
}

impl From<&AnnotatedFeature> for OutputFeature {
    fn from(f: &AnnotatedFeature) -> Self {
        Self {
            id: f.source_index.to_string(),
            geometry: f.geometry.clone(),
            properties: vec![
                ("nombre", Property::Text(f.name.clone())),
                ("dist_m", Property::Number(f.offset_m)),
                ("lado_m", Property::Number(f.side_offset_m)),
                ("abscisa_m", Property::Number(f.chainage_m)),
                ("abscisa_lbl", Property::Text(f.chainage_label.clone())),
            ],
        }
    }
}

impl From<&ChainageMarker> for OutputFeature {
    fn from(m: &ChainageMarker) -> Self {
        Self {
            id: m.label.clone(),
            geometry: Geometry::Point(m.point),
            properties: vec![
                ("abscisa", Property::Text(m.label.clone())),
                ("distancia_m", Property::Number(m.distance_m)),
            ],
        }
    }
}

/// Exporte les entités référencées (géométrie d'origine + propriétés d'abscisse)
pub fn export_annotated(features: &[AnnotatedFeature], epsg: u32, path: &Path) -> Result<()> {
    export_to_geojson(features.iter().map(OutputFeature::from), epsg, path)
}

/// Exporte les repères d'abscisse (points)
pub fn export_markers(markers: &[ChainageMarker], epsg: u32, path: &Path) -> Result<()> {
    export_to_geojson(markers.iter().map(OutputFeature::from), epsg, path)
}

/// Exporte l'axe (une LineString)
pub fn export_alignment(alignment: &Alignment, name: &str, epsg: u32, path: &Path) -> Result<()> {
    let axis = OutputFeature {
        id: name.to_string(),
        geometry: Geometry::LineString(alignment.line().clone()),
        properties: vec![
            ("nombre", Property::Text(name.to_string())),
            ("longitud_m", Property::Number(alignment.length_m())),
            ("abscisa_fin", Property::Text(abscisa::format_chainage(alignment.length_m()))),
        ],
    };
    export_to_geojson(std::iter::once(axis), epsg, path)
}

/// Écrit une FeatureCollection entité par entité
pub fn export_to_geojson(
    features: impl IntoIterator<Item = OutputFeature>,
    epsg: u32,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        epsg
    )?;

    for (i, feature) in features.into_iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, &feature)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, feature: &OutputFeature) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&feature.id)
    )?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":{{"#)?;
    for (i, (key, value)) in feature.properties.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write!(writer, r#""{}":"#, escape_json(key))?;
        match value {
            Property::Text(s) => write!(writer, r#""{}""#, escape_json(s))?,
            Property::Number(n) if n.is_finite() => write!(writer, "{}", n)?,
            // NaN/inf n'existent pas en JSON
            Property::Number(_) => write!(writer, "null")?,
        }
    }
    write!(writer, "}}}}")?;

    Ok(())
}

fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

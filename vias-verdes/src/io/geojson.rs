//! Lecture GeoJSON (FeatureCollection, Feature ou géométrie seule)
//!
//! Le membre `crs` hérité (GeoJSON 2008) est lu s'il est présent; sinon la
//! couche n'a pas de CRS déclaré (RFC 7946 implique WGS84, résolu plus tard
//! par `crs::ensure_crs`).

use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use tracing::warn;

use abscisa::{Attributes, FeatureGeometry, RawFeature};

use super::Layer;

/// Charge un fichier GeoJSON
pub fn load(path: &Path) -> Result<Layer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_str(&content).with_context(|| format!("Invalid GeoJSON: {}", path.display()))
}

/// Parse un document GeoJSON
pub fn parse_str(content: &str) -> Result<Layer> {
    let geojson: GeoJson = content.parse()?;

    let mut layer = Layer::default();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            layer.epsg = fc.foreign_members.as_ref().and_then(crs_member);
            for feature in fc.features {
                push_feature(&mut layer, feature);
            }
        }
        GeoJson::Feature(feature) => {
            layer.epsg = feature.foreign_members.as_ref().and_then(crs_member);
            push_feature(&mut layer, feature);
        }
        GeoJson::Geometry(geometry) => {
            layer.epsg = geometry.foreign_members.as_ref().and_then(crs_member);
            push_feature(&mut layer, Feature::from(geometry));
        }
    }

    Ok(layer)
}

fn push_feature(layer: &mut Layer, feature: Feature) {
    let index = layer.features.len() + layer.skipped;
    let Some(geometry) = feature.geometry else {
        warn!(index, "GeoJSON feature without geometry, skipped");
        layer.skipped += 1;
        return;
    };

    let geometry = match geo::Geometry::<f64>::try_from(geometry)
        .map_err(anyhow::Error::from)
        .and_then(|g| FeatureGeometry::from_geometry(g).map_err(anyhow::Error::from))
    {
        Ok(geometry) => geometry,
        Err(e) => {
            warn!(index, error = %e, "Unsupported GeoJSON geometry, skipped");
            layer.skipped += 1;
            return;
        }
    };

    let attributes = feature
        .properties
        .map(|props| properties_to_attributes(&props))
        .unwrap_or_default();

    layer.features.push(RawFeature::new(geometry, attributes));
}

/// Valeurs scalaires en texte; `null` -> manquant
fn properties_to_attributes(props: &JsonObject) -> Attributes {
    props
        .iter()
        .map(|(key, value)| {
            let value = match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Lit l'EPSG du membre `crs`: `{"type":"name","properties":{"name":"..."}}`
fn crs_member(members: &JsonObject) -> Option<u32> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    parse_crs_name(name)
}

/// `urn:ogc:def:crs:EPSG::9377`, `EPSG:9377`, `urn:ogc:def:crs:OGC:1.3:CRS84`
pub fn parse_crs_name(name: &str) -> Option<u32> {
    let name = name.trim();
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    let upper = name.to_ascii_uppercase();
    let code = upper.rsplit(':').next()?;
    if !upper.contains("EPSG") {
        return None;
    }
    code.parse().ok()
}

//! Systèmes de coordonnées des couches
//!
//! Toute couche est ramenée au CRS de calcul (projeté, en mètres) avant le
//! référencement: distances et abscisses n'ont de sens qu'en mètres.

use anyhow::{Context, Result};
use tracing::{debug, info};

use abscisa::{FeatureGeometry, RawFeature};

use crate::io::Layer;
use crate::reproject::SmartReprojector;

/// Description lisible d'un EPSG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsInfo {
    pub epsg: u32,
    pub name: String,
    pub units: &'static str,
}

/// Nom et unités d'un EPSG connu
pub fn crs_info(epsg: u32) -> CrsInfo {
    let (name, units) = match epsg {
        4326 => ("WGS84 (GPS)", "degrees"),
        9377 => ("MAGNA-SIRGAS Colombia", "meters"),
        32618 => ("UTM Zone 18N", "meters"),
        3857 => ("Web Mercator", "meters"),
        _ => {
            return CrsInfo {
                epsg,
                name: format!("EPSG:{}", epsg),
                units: "unknown",
            }
        }
    };
    CrsInfo {
        epsg,
        name: name.to_string(),
        units,
    }
}

/// `true` si l'EPSG est connu et exprimé en mètres
pub fn is_projected(epsg: u32) -> bool {
    crs_info(epsg).units == "meters"
}

/// Ramène une couche au CRS `target`.
///
/// Une couche sans CRS déclaré est supposée en `assume`. Les centroïdes des
/// lignes et polygones sont recalculés dans le CRS cible.
pub fn ensure_crs(layer: Layer, target: u32, assume: u32) -> Result<Layer> {
    let source = match layer.epsg {
        Some(epsg) => epsg,
        None => {
            debug!(assume, "Layer without CRS, assuming EPSG:{}", assume);
            assume
        }
    };

    if source == target {
        return Ok(Layer {
            epsg: Some(target),
            ..layer
        });
    }

    let reprojector = SmartReprojector::new(source, target)?;
    info!(
        from = source,
        to = target,
        engine = reprojector.description(),
        features = layer.len(),
        "Reprojecting layer"
    );

    let features = layer
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let transformed = reprojector
                .transform_geometry(&feature.geometry.original())
                .with_context(|| format!("Feature #{} cannot be reprojected", index))?;
            let geometry = FeatureGeometry::from_geometry(transformed)
                .with_context(|| format!("Feature #{} is invalid after reprojection", index))?;
            Ok(RawFeature::new(geometry, feature.attributes))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Layer {
        features,
        epsg: Some(target),
        skipped: layer.skipped,
    })
}

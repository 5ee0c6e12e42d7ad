//! Chargement des couches d'entrée (axe, sources, zones de dépôt, sondages)
//!
//! Le format est déduit de l'extension. Les entités dont la géométrie est
//! absente ou non gérée sont ignorées et comptées dans `Layer::skipped`.

pub mod csv;
pub mod geojson;
pub mod kml;

use std::path::Path;

use anyhow::{bail, Result};
use tracing::{debug, info};

use abscisa::RawFeature;

use crate::config::Config;

/// Une couche chargée: entités + EPSG déclaré par la source
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub features: Vec<RawFeature>,
    /// `None` si la source ne déclare pas de CRS
    pub epsg: Option<u32>,
    /// Entités ignorées (géométrie absente ou non gérée)
    pub skipped: usize,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Formats d'entrée reconnus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFormat {
    GeoJson,
    Kml,
    Kmz,
    Csv,
}

impl LayerFormat {
    /// Déduit le format de l'extension du fichier
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "geojson" | "json" => Ok(Self::GeoJson),
            "kml" => Ok(Self::Kml),
            "kmz" => Ok(Self::Kmz),
            "csv" => Ok(Self::Csv),
            "gpkg" | "shp" => bail!(
                "Unsupported format '.{}' for {}: convert to GeoJSON or KML first",
                ext,
                path.display()
            ),
            _ => bail!(
                "Unsupported format for {} (expected .geojson, .json, .kml, .kmz or .csv)",
                path.display()
            ),
        }
    }
}

/// Charge une couche selon son extension
pub fn load_layer(path: &Path, config: &Config) -> Result<Layer> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let format = LayerFormat::from_path(path)?;
    debug!(path = %path.display(), format = ?format, "Loading layer");

    let layer = match format {
        LayerFormat::GeoJson => geojson::load(path)?,
        LayerFormat::Kml => kml::load(path)?,
        LayerFormat::Kmz => kml::load_kmz(path)?,
        LayerFormat::Csv => csv::load(path, config.crs.calc_epsg)?,
    };

    info!(
        path = %path.display(),
        features = layer.len(),
        skipped = layer.skipped,
        epsg = ?layer.epsg,
        "Loaded layer"
    );
    Ok(layer)
}

//! Configuration du traitement d'un corridor
//!
//! Fichier JSON optionnel; chaque champ absent prend sa valeur par défaut.
//! Les options de la CLI surchargent ensuite les valeurs lues.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crs: CrsConfig,
    pub chainage: ChainageConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,

    /// Champ d'attribut portant le nom des entités
    pub name_field: String,
}

/// Systèmes de coordonnées
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrsConfig {
    /// EPSG de calcul (projeté, mètres): MAGNA-SIRGAS Origen Nacional
    pub calc_epsg: u32,

    /// EPSG supposé pour une couche sans CRS déclaré (WGS84/GPS)
    pub input_epsg: u32,
}

/// Abscisses régulières
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainageConfig {
    /// Intervalle entre repères (mètres)
    pub interval_m: f64,

    /// Abscisse du premier repère (mètres)
    pub start_m: f64,
}

/// Filtrage spatial
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Rayon de recherche autour de l'axe (mètres, borne incluse)
    pub radius_m: f64,
}

/// Sorties
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Répertoire racine; chaque tramo écrit dans `salidas_<tramo>/`
    pub output_dir: PathBuf,
}

impl Default for CrsConfig {
    fn default() -> Self {
        Self {
            calc_epsg: 9377,
            input_epsg: 4326,
        }
    }
}

impl Default for ChainageConfig {
    fn default() -> Self {
        Self {
            interval_m: 500.0,
            start_m: 0.0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { radius_m: 70000.0 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .context(format!("Failed to parse config JSON: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Charge le fichier s'il est fourni, sinon la configuration par défaut
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        if !(self.chainage.interval_m.is_finite() && self.chainage.interval_m > 0.0) {
            anyhow::bail!(
                "chainage.interval_m must be positive, got {}",
                self.chainage.interval_m
            );
        }
        if !(self.chainage.start_m.is_finite() && self.chainage.start_m >= 0.0) {
            anyhow::bail!(
                "chainage.start_m must be non-negative, got {}",
                self.chainage.start_m
            );
        }
        if self.filter.radius_m.is_nan() || self.filter.radius_m < 0.0 {
            anyhow::bail!(
                "filter.radius_m must be non-negative, got {}",
                self.filter.radius_m
            );
        }
        if self.name_field.trim().is_empty() {
            anyhow::bail!("name_field must not be empty");
        }
        Ok(())
    }

    /// Répertoire de sortie d'un tramo
    pub fn tramo_dir(&self, tramo: &str) -> PathBuf {
        self.output.output_dir.join(format!("salidas_{}", tramo))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crs: CrsConfig::default(),
            chainage: ChainageConfig::default(),
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
            name_field: "Name".to_string(),
        }
    }
}

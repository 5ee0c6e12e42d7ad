//! Exports d'un tramo (CSV, GeoJSON, DXF)
//!
//! Tout est écrit sous `<output_dir>/salidas_<tramo>/`.

pub mod csv;
pub mod dxf;
pub mod geojson;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Résumé des sources de matériaux
pub const SOURCES_CSV: &str = "fuentes_resumen.csv";
/// Résumé des zones de dépôt
pub const DISPOSAL_CSV: &str = "dispos_resumen.csv";
/// Résumé des sondages
pub const BOREHOLES_CSV: &str = "sondeos_resumen.csv";
/// Effectifs par classe SUCS
pub const SUCS_CSV: &str = "sondeos_sucs.csv";
/// Statistiques N_SPT par classe SUCS
pub const SPT_CSV: &str = "sondeos_spt.csv";
/// Profondeurs des sondages référencés
pub const DEPTH_CSV: &str = "sondeos_profundidad.csv";
/// Table des abscisses régulières
pub const CHAINAGE_CSV: &str = "abscisas.csv";
/// Rapport d'exécution
pub const REPORT_JSON: &str = "resumen.json";

/// Crée le répertoire de sortie s'il n'existe pas
pub fn prepare_dir(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Ok(dir.to_path_buf())
}

/// Nom de calque / fichier: majuscules, caractères hors `[A-Z0-9_-]` remplacés par `_`
pub fn layer_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_uppercase();
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

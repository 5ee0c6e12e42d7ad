//! Rapport d'exécution d'un tramo
//!
//! Collecte les comptes par couche et les fichiers produits, puis s'affiche
//! sur la console et s'écrit en JSON (`resumen.json`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

/// Statut global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Toutes les entités ont été traitées
    Success,
    /// Des entités ont été ignorées ou des avertissements émis
    WithWarnings,
}

/// Statistiques d'une couche
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStats {
    /// Entités chargées
    pub loaded: usize,
    /// Entités ignorées au chargement
    pub skipped: usize,
    /// Entités dans le rayon de recherche
    pub within_radius: usize,
}

/// Rapport complet d'un tramo
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tramo: String,
    pub duration_secs: f64,
    pub status: RunStatus,

    /// EPSG de calcul
    pub epsg: u32,
    pub axis_length_m: f64,
    /// Abscisse de fin d'axe (`K{km}+{m}`)
    pub axis_label: String,
    pub markers: usize,
    pub radius_m: f64,

    /// Statistiques par couche (sources, zones de dépôt, sondages)
    pub layers: BTreeMap<String, LayerStats>,
    /// Fichiers écrits, dans l'ordre
    pub outputs: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(tramo: &str, epsg: u32, radius_m: f64) -> Self {
        Self {
            tramo: tramo.to_string(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            epsg,
            axis_length_m: 0.0,
            axis_label: String::new(),
            markers: 0,
            radius_m,
            layers: BTreeMap::new(),
            outputs: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Enregistre l'axe
    pub fn record_axis(&mut self, length_m: f64) {
        self.axis_length_m = length_m;
        self.axis_label = abscisa::format_chainage(length_m);
    }

    /// Enregistre une couche; les entités ignorées deviennent un avertissement
    pub fn record_layer(&mut self, name: &str, stats: LayerStats) {
        if stats.skipped > 0 {
            self.warnings.push(format!(
                "{}: {} feature(s) skipped (missing or unsupported geometry)",
                name, stats.skipped
            ));
        }
        self.layers.insert(name.to_string(), stats);
    }

    pub fn record_output(&mut self, path: impl Into<PathBuf>) {
        self.outputs.push(path.into());
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.warnings.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::WithWarnings
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CORRIDOR REPORT - Tramo {}", self.tramo);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- AXIS ---");
        println!(
            "Length: {:.2} m ({:.3} km, {})",
            self.axis_length_m,
            self.axis_length_m / 1000.0,
            self.axis_label
        );
        println!("CRS: EPSG:{}", self.epsg);
        println!("Markers: {}", self.markers);

        if !self.layers.is_empty() {
            println!("\n--- LAYERS (radius {} m) ---", self.radius_m);
            for (name, stats) in &self.layers {
                println!(
                    "  {}: {} loaded, {} within radius, {} skipped",
                    name, stats.loaded, stats.within_radius, stats.skipped
                );
            }
        }

        if !self.outputs.is_empty() {
            println!("\n--- OUTPUTS ({}) ---", self.outputs.len());
            for path in &self.outputs {
                println!("  {}", path.display());
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  {}", w);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        let within: usize = self.layers.values().map(|s| s.within_radius).sum();
        format!(
            "{}: axis {} ({:.0} m), {} markers, {} features within {} m, {} files",
            self.tramo,
            self.axis_label,
            self.axis_length_m,
            self.markers,
            within,
            self.radius_m,
            self.outputs.len()
        )
    }
}

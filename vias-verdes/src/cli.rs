//! Définition et implémentation des commandes CLI
//!
//! - `run`: traitement complet d'un tramo (CSV, GeoJSON, DXF, rapport)
//! - `chainage`: table des abscisses d'un axe
//! - `export-dxf`: DXF seul
//! - `info`: longueur, CRS et emprise d'un axe

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use geo::BoundingRect;
use tracing::info;

use crate::config::Config;
use crate::crs::crs_info;
use crate::export::csv as csv_export;
use crate::io::load_layer;
use crate::pipeline::{self, RunOptions};

#[derive(Subcommand)]
pub enum Commands {
    /// Full corridor run: chainage, referenced layers, CSV/GeoJSON/DXF outputs
    Run {
        /// Section identifier (output goes to <out>/salidas_<tramo>/)
        #[arg(short, long)]
        tramo: String,

        /// Axis layer (GeoJSON, KML, KMZ)
        #[arg(short, long)]
        axis: PathBuf,

        /// Material sources layer
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Disposal zones layer
        #[arg(long)]
        disposal: Option<PathBuf>,

        /// Boreholes table (CSV with X/Y columns) or layer
        #[arg(long)]
        boreholes: Option<PathBuf>,

        /// Output root directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Search radius around the axis (meters)
        #[arg(long)]
        radius: Option<f64>,

        /// Chainage marker interval (meters)
        #[arg(long)]
        interval: Option<f64>,

        /// Attribute holding feature names
        #[arg(long)]
        name_field: Option<String>,

        /// Worker threads for referencing (1 = sequential)
        #[arg(long, alias = "threads")]
        jobs: Option<usize>,
    },

    /// Print (and optionally save) the chainage table of an axis
    Chainage {
        /// Axis layer
        #[arg(short, long)]
        axis: PathBuf,

        /// Marker interval (meters)
        #[arg(long)]
        interval: Option<f64>,

        /// Chainage of the first marker (meters)
        #[arg(long)]
        start: Option<f64>,

        /// Write the table to this CSV file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export CAD files only (one DXF per layer)
    ExportDxf {
        /// Section identifier
        #[arg(short, long)]
        tramo: String,

        /// Axis layer
        #[arg(short, long)]
        axis: PathBuf,

        /// Material sources layer
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Disposal zones layer
        #[arg(long)]
        disposal: Option<PathBuf>,

        /// Output root directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Chainage marker interval (meters)
        #[arg(long)]
        interval: Option<f64>,
    },

    /// Show axis length, CRS and bounds
    Info {
        /// Axis layer
        #[arg(short, long)]
        axis: PathBuf,
    },

    /// Print version information
    Version,
}

/// Surcharges de la configuration depuis la ligne de commande
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub out: Option<PathBuf>,
    pub radius: Option<f64>,
    pub interval: Option<f64>,
    pub start: Option<f64>,
    pub name_field: Option<String>,
}

impl Overrides {
    /// Applique les options présentes puis revalide
    pub fn apply(self, mut config: Config) -> Result<Config> {
        if let Some(out) = self.out {
            config.output.output_dir = out;
        }
        if let Some(radius) = self.radius {
            config.filter.radius_m = radius;
        }
        if let Some(interval) = self.interval {
            config.chainage.interval_m = interval;
        }
        if let Some(start) = self.start {
            config.chainage.start_m = start;
        }
        if let Some(name_field) = self.name_field {
            config.name_field = name_field;
        }
        config.validate().context("Invalid command-line options")?;
        Ok(config)
    }
}

/// Exécute la commande run
pub fn cmd_run(options: RunOptions, config: &Config, jobs: Option<usize>) -> Result<()> {
    let jobs = jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    });
    if jobs == 0 {
        bail!("--jobs must be at least 1");
    }
    let options = RunOptions {
        parallel: jobs > 1,
        ..options
    };

    println!("=== Tramo {} ===", options.tramo);
    println!("Axis: {}", options.axis.display());
    for (label, path) in [
        ("Sources", &options.sources),
        ("Disposal", &options.disposal),
        ("Boreholes", &options.boreholes),
    ] {
        if let Some(path) = path {
            println!("{}: {}", label, path.display());
        }
    }
    println!("CRS: EPSG:{}", config.crs.calc_epsg);
    println!("Radius: {} m", config.filter.radius_m);
    println!("Interval: {} m", config.chainage.interval_m);
    println!("Jobs: {}", jobs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build worker pool")?;
    let report = pool.install(|| pipeline::run_corridor(&options, config))?;

    report.display();
    Ok(())
}

/// Exécute la commande chainage
pub fn cmd_chainage(axis: &Path, config: &Config, out: Option<&Path>) -> Result<()> {
    let alignment = pipeline::load_alignment(axis, config)?;
    let markers = pipeline::markers(&alignment, config)?;

    println!(
        "Axis: {:.2} m ({}), interval {} m",
        alignment.length_m(),
        abscisa::format_chainage(alignment.length_m()),
        config.chainage.interval_m
    );
    println!("{:<12} {:>12} {:>16} {:>16}", "abscisa", "distancia_m", "x", "y");
    for m in &markers {
        println!(
            "{:<12} {:>12.2} {:>16.3} {:>16.3}",
            m.label,
            m.distance_m,
            m.point.x(),
            m.point.y()
        );
    }

    if let Some(out) = out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let rows = csv_export::export_chainage(&markers, config.crs.calc_epsg, out)?;
        info!(path = %out.display(), rows, "Chainage table written");
        println!("\nSaved {} markers to {}", rows, out.display());
    }
    Ok(())
}

/// Exécute la commande export-dxf
pub fn cmd_export_dxf(options: RunOptions, config: &Config) -> Result<()> {
    let written = pipeline::export_dxf_only(&options, config)?;

    println!("=== DXF tramo {} ===", options.tramo);
    for path in &written {
        println!("  {}", path.display());
    }
    println!("{} file(s) written", written.len());
    Ok(())
}

/// Exécute la commande info
pub fn cmd_info(axis: &Path, config: &Config) -> Result<()> {
    let layer = load_layer(axis, config)?;
    let source_epsg = layer.epsg.unwrap_or(config.crs.input_epsg);
    let source = crs_info(source_epsg);
    let calc = crs_info(config.crs.calc_epsg);

    let alignment = pipeline::load_alignment(axis, config)?;
    let length = alignment.length_m();

    println!("File: {}", axis.display());
    println!(
        "Source CRS: EPSG:{} - {} ({}){}",
        source.epsg,
        source.name,
        source.units,
        if layer.epsg.is_none() { " [assumed]" } else { "" }
    );
    println!("Calc CRS: EPSG:{} - {} ({})", calc.epsg, calc.name, calc.units);
    println!("Features: {} ({} skipped)", layer.len(), layer.skipped);
    println!("Vertices: {}", alignment.vertices().len());
    println!(
        "Length: {:.2} m ({:.3} km, {})",
        length,
        length / 1000.0,
        abscisa::format_chainage(length)
    );
    if let Some(rect) = alignment.line().bounding_rect() {
        println!("Bounds X: {:.3} .. {:.3}", rect.min().x, rect.max().x);
        println!("Bounds Y: {:.3} .. {:.3}", rect.min().y, rect.max().y);
    }
    Ok(())
}

/// Exécute la commande version
pub fn cmd_version() {
    println!("vv {}", env!("CARGO_PKG_VERSION"));
    println!("abscisa {}", abscisa::VERSION);
    println!(
        "Reprojection: built-in (4326, 9377, 32618, 3857){}",
        if crate::reproject::proj_available() {
            " + PROJ"
        } else {
            ""
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let config = Overrides {
            out: Some(PathBuf::from("/tmp/vv")),
            radius: Some(5000.0),
            interval: Some(100.0),
            start: None,
            name_field: Some("NOMBRE".to_string()),
        }
        .apply(Config::default())
        .unwrap();

        assert_eq!(config.output.output_dir, PathBuf::from("/tmp/vv"));
        assert_eq!(config.filter.radius_m, 5000.0);
        assert_eq!(config.chainage.interval_m, 100.0);
        assert_eq!(config.chainage.start_m, 0.0);
        assert_eq!(config.name_field, "NOMBRE");
    }

    #[test]
    fn test_overrides_rejects_bad_values() {
        let bad_interval = Overrides {
            interval: Some(0.0),
            ..Default::default()
        };
        assert!(bad_interval.apply(Config::default()).is_err());

        let negative_start = Overrides {
            start: Some(-10.0),
            ..Default::default()
        };
        assert!(negative_start.apply(Config::default()).is_err());
    }

    #[test]
    fn test_run_rejects_zero_jobs() {
        let options = RunOptions {
            tramo: "t1".to_string(),
            axis: PathBuf::from("eje.geojson"),
            ..Default::default()
        };
        let err = cmd_run(options, &Config::default(), Some(0)).unwrap_err();
        assert!(err.to_string().contains("--jobs"));
    }
}

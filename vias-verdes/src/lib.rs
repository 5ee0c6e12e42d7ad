//! # vias-verdes
//!
//! Cartographie de corridors routiers autour de la bibliothèque `abscisa`:
//! abscisses `K{km}+{m}`, distances à l'axe et exports pour la DAO.
//!
//! ## Features
//!
//! - Lecture GeoJSON, KML, KMZ et CSV de points
//! - Reprojection en Rust pur vers MAGNA-SIRGAS Origen Nacional (EPSG:9377),
//!   PROJ en option (feature `reproject`)
//! - Résumés CSV, GeoJSON, DXF R12 par calque, rapport JSON
//! - Classification SUCS des sondages
//!
//! ## Usage CLI
//!
//! ```bash
//! # Traitement complet d'un tramo
//! vv run --tramo t6 --axis eje.kmz --sources fuentes.kml --disposal dispos.geojson
//!
//! # Table des abscisses tous les 100 m
//! vv chainage --axis eje.kmz --interval 100 --out abscisas.csv
//! ```

pub mod cli;
pub mod config;
pub mod crs;
pub mod export;
pub mod geology;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod reproject;

pub use config::Config;
pub use io::{load_layer, Layer};
pub use pipeline::{run_corridor, RunOptions};
pub use report::{RunReport, RunStatus};

//! Traitement complet d'un tramo
//!
//! axe -> CRS de calcul -> ligne principale -> repères d'abscisse, puis pour
//! chaque couche optionnelle: chargement, référencement, filtre par rayon,
//! tri, exports. Le rapport récapitule le tout.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use abscisa::{
    annotate, annotate_par, extract_primary, filter_by_radius, sort_by_chainage, Alignment,
    AnnotatedFeature, ChainageMarker,
};

use crate::config::Config;
use crate::crs::ensure_crs;
use crate::export::{self, csv as csv_export, dxf, geojson as geojson_export};
use crate::geology::{
    borehole_depths, has_column, summarize_by_sucs, summarize_spt_by_sucs, DEPTH_FIELD, SPT_FIELD,
    SUCS_FIELD,
};
use crate::io::{load_layer, Layer};
use crate::report::{LayerStats, RunReport};

/// Couches optionnelles d'un corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Sources de matériaux (canteras)
    Sources,
    /// Zones de dépôt
    Disposal,
    /// Sondages
    Boreholes,
}

impl LayerKind {
    /// Nom dans le rapport et base des fichiers GeoJSON
    pub fn name(self) -> &'static str {
        match self {
            Self::Sources => "fuentes",
            Self::Disposal => "dispos",
            Self::Boreholes => "sondeos",
        }
    }

    fn summary_csv(self) -> &'static str {
        match self {
            Self::Sources => export::SOURCES_CSV,
            Self::Disposal => export::DISPOSAL_CSV,
            Self::Boreholes => export::BOREHOLES_CSV,
        }
    }

    fn dxf_layer(self) -> &'static str {
        match self {
            Self::Sources => dxf::SOURCES_LAYER,
            Self::Disposal => dxf::DISPOSAL_LAYER,
            Self::Boreholes => dxf::BOREHOLES_LAYER,
        }
    }
}

/// Entrées d'un traitement
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Identifiant du tramo (nom du répertoire de sortie et du calque d'axe)
    pub tramo: String,
    pub axis: PathBuf,
    pub sources: Option<PathBuf>,
    pub disposal: Option<PathBuf>,
    pub boreholes: Option<PathBuf>,
    /// Référencement parallèle (rayon)
    pub parallel: bool,
}

impl RunOptions {
    fn layers(&self) -> Vec<(LayerKind, &Path)> {
        [
            (LayerKind::Sources, self.sources.as_deref()),
            (LayerKind::Disposal, self.disposal.as_deref()),
            (LayerKind::Boreholes, self.boreholes.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|p| (kind, p)))
        .collect()
    }
}

/// Une couche référencée et filtrée
#[derive(Debug, Clone)]
pub struct ProcessedLayer {
    pub kind: LayerKind,
    /// Couche dans le CRS de calcul
    pub layer: Layer,
    /// Entités dans le rayon, triées par abscisse
    pub features: Vec<AnnotatedFeature>,
}

/// Charge l'axe et le ramène au CRS de calcul
pub fn load_alignment(path: &Path, config: &Config) -> Result<Alignment> {
    let layer = load_layer(path, config)?;
    let layer = ensure_crs(layer, config.crs.calc_epsg, config.crs.input_epsg)?;
    let alignment = extract_primary(&layer.features)
        .with_context(|| format!("No usable axis line in {}", path.display()))?;

    info!(
        path = %path.display(),
        length_m = alignment.length_m(),
        vertices = alignment.vertices().len(),
        "Axis loaded"
    );
    Ok(alignment)
}

/// Repères d'abscisse selon la configuration
pub fn markers(alignment: &Alignment, config: &Config) -> Result<Vec<ChainageMarker>> {
    let series = alignment.markers(config.chainage.interval_m, config.chainage.start_m)?;
    Ok(series.iter().collect())
}

/// Charge, référence, filtre et trie une couche
pub fn process_layer(
    kind: LayerKind,
    path: &Path,
    alignment: &Alignment,
    config: &Config,
    parallel: bool,
) -> Result<ProcessedLayer> {
    let layer = load_layer(path, config)?;
    let layer = ensure_crs(layer, config.crs.calc_epsg, config.crs.input_epsg)?;

    let annotated = if parallel {
        annotate_par(&layer.features, alignment, &config.name_field)
    } else {
        annotate(&layer.features, alignment, &config.name_field)
    };
    let within = filter_by_radius(&annotated, config.filter.radius_m);
    let features = sort_by_chainage(&within);

    info!(
        layer = kind.name(),
        loaded = layer.len(),
        within_radius = features.len(),
        radius_m = config.filter.radius_m,
        "Layer referenced"
    );

    Ok(ProcessedLayer {
        kind,
        layer,
        features,
    })
}

/// Écrit un DXF par calque; retourne les fichiers produits.
///
/// Les calques de couches reprennent toutes les entités chargées, le rayon ne
/// filtre que les résumés.
pub fn export_dxf_bundle(
    dir: &Path,
    tramo: &str,
    alignment: &Alignment,
    markers: &[ChainageMarker],
    layers: &[ProcessedLayer],
) -> Result<Vec<PathBuf>> {
    let mut written = vec![dxf::export_axis(alignment, tramo, dir)?];

    for processed in layers {
        let features = &processed.layer.features;
        if let Some(path) = dxf::export_features(features, processed.kind.dxf_layer(), dir)? {
            written.push(path);
        }
    }
    if let Some(path) = dxf::export_markers(markers, dir)? {
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), "DXF exported");
    Ok(written)
}

/// Tables propres aux sondages: classes SUCS et N_SPT sur toute la couche,
/// profondeurs des sondages dans le rayon. Une colonne absente est signalée
/// dans le rapport.
fn export_borehole_tables(
    dir: &Path,
    processed: &ProcessedLayer,
    report: &mut RunReport,
) -> Result<Vec<PathBuf>> {
    let features = &processed.layer.features;
    let mut written = Vec::new();

    if !has_column(features, SUCS_FIELD) {
        report.record_warning(format!("sondeos: no '{}' column", SUCS_FIELD));
    } else {
        let sucs_path = dir.join(export::SUCS_CSV);
        csv_export::export_sucs(&summarize_by_sucs(features, SUCS_FIELD), &sucs_path)?;
        written.push(sucs_path);

        if has_column(features, SPT_FIELD) {
            let spt = summarize_spt_by_sucs(features, SUCS_FIELD, SPT_FIELD);
            let spt_path = dir.join(export::SPT_CSV);
            csv_export::export_spt(&spt, &spt_path)?;
            written.push(spt_path);
        }
    }

    if has_column(features, DEPTH_FIELD) {
        let depths = borehole_depths(&processed.features, features, DEPTH_FIELD, SUCS_FIELD);
        let depth_path = dir.join(export::DEPTH_CSV);
        csv_export::export_depths(&depths, &depth_path)?;
        written.push(depth_path);
    }

    Ok(written)
}

/// Exécute le traitement complet d'un tramo
pub fn run_corridor(options: &RunOptions, config: &Config) -> Result<RunReport> {
    let started_at = Instant::now();
    let epsg = config.crs.calc_epsg;
    let mut report = RunReport::new(&options.tramo, epsg, config.filter.radius_m);

    let dir = export::prepare_dir(&config.tramo_dir(&options.tramo))?;
    info!(tramo = %options.tramo, dir = %dir.display(), "Starting corridor run");

    let alignment = load_alignment(&options.axis, config)?;
    report.record_axis(alignment.length_m());

    let axis_path = dir.join(format!("eje_{}.geojson", options.tramo));
    geojson_export::export_alignment(&alignment, &options.tramo, epsg, &axis_path)?;
    report.record_output(axis_path);

    let markers = markers(&alignment, config)?;
    report.markers = markers.len();

    let chainage_csv = dir.join(export::CHAINAGE_CSV);
    csv_export::export_chainage(&markers, epsg, &chainage_csv)?;
    report.record_output(chainage_csv);

    let markers_geojson = dir.join("abscisas.geojson");
    geojson_export::export_markers(&markers, epsg, &markers_geojson)?;
    report.record_output(markers_geojson);

    let mut processed_layers = Vec::new();
    for (kind, path) in options.layers() {
        let processed = process_layer(kind, path, &alignment, config, options.parallel)?;

        if processed.features.is_empty() {
            warn!(layer = kind.name(), "No features within radius");
            report.record_warning(format!(
                "{}: no features within {} m of the axis",
                kind.name(),
                config.filter.radius_m
            ));
        }

        let summary_path = dir.join(kind.summary_csv());
        csv_export::export_summary(&processed.features, &summary_path)?;
        report.record_output(summary_path);

        let geojson_path = dir.join(format!("{}.geojson", kind.name()));
        geojson_export::export_annotated(&processed.features, epsg, &geojson_path)?;
        report.record_output(geojson_path);

        if kind == LayerKind::Boreholes {
            for path in export_borehole_tables(&dir, &processed, &mut report)? {
                report.record_output(path);
            }
        }

        report.record_layer(
            kind.name(),
            LayerStats {
                loaded: processed.layer.len(),
                skipped: processed.layer.skipped,
                within_radius: processed.features.len(),
            },
        );
        processed_layers.push(processed);
    }

    for path in export_dxf_bundle(&dir, &options.tramo, &alignment, &markers, &processed_layers)? {
        report.record_output(path);
    }

    report.set_duration(started_at.elapsed());
    report.finalize();

    let report_path = dir.join(export::REPORT_JSON);
    report.save_to_file(&report_path)?;
    report.record_output(report_path);

    info!(summary = %report.summary(), "Corridor run complete");
    Ok(report)
}

/// DXF seul: axe, couches référencées et repères
pub fn export_dxf_only(options: &RunOptions, config: &Config) -> Result<Vec<PathBuf>> {
    let dir = export::prepare_dir(&config.tramo_dir(&options.tramo))?;
    let alignment = load_alignment(&options.axis, config)?;
    let markers = markers(&alignment, config)?;

    let layers = options
        .layers()
        .into_iter()
        .map(|(kind, path)| process_layer(kind, path, &alignment, config, options.parallel))
        .collect::<Result<Vec<_>>>()?;

    export_dxf_bundle(&dir, &options.tramo, &alignment, &markers, &layers)
}

//! Traitement complet d'un tramo sur des données synthétiques

use std::path::{Path, PathBuf};

use vias_verdes::config::{ChainageConfig, FilterConfig, OutputConfig};
use vias_verdes::{run_corridor, Config, RunOptions, RunStatus};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn workspace(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// Axe de 10 km en deux morceaux, le second saisi à l'envers
const AXIS: &str = r#"{"type": "FeatureCollection",
    "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::9377"}},
    "features": [
        {"type": "Feature", "properties": {"Name": "Eje T6"},
         "geometry": {"type": "MultiLineString", "coordinates": [
            [[4880000, 2066000], [4885000, 2066000]],
            [[4890000, 2066000], [4885000, 2066000]]
         ]}}
    ]}"#;

const SOURCES: &str = r#"{"type": "FeatureCollection",
    "crs": {"type": "name", "properties": {"name": "EPSG:9377"}},
    "features": [
        {"type": "Feature", "properties": {"Name": "Cantera Sur"},
         "geometry": {"type": "Polygon", "coordinates": [[
            [4887900, 2065700], [4888100, 2065700], [4888100, 2065900],
            [4887900, 2065900], [4887900, 2065700]]]}},
        {"type": "Feature", "properties": {"Name": null},
         "geometry": {"type": "Point", "coordinates": [4881000, 2066300]}},
        {"type": "Feature", "properties": {"Name": "Muy lejos"},
         "geometry": {"type": "Point", "coordinates": [4885000, 2090000]}},
        {"type": "Feature", "properties": {"Name": "Sin geometria"}, "geometry": null}
    ]}"#;

const BOREHOLES: &str = "id;X;Y;SUCS;Profundidad;N_SPT\n\
S1;4882000;2066010;CH;1,00 - 1,50;12\n\
S2;4883000;2065990;SC;0,50-1,00;8\n\
S3;4884000;2066020;CH;2;20\n";

fn config(out: &Path) -> Config {
    Config {
        chainage: ChainageConfig {
            interval_m: 1000.0,
            start_m: 0.0,
        },
        filter: FilterConfig { radius_m: 5000.0 },
        output: OutputConfig {
            output_dir: out.to_path_buf(),
        },
        ..Default::default()
    }
}

#[test]
fn test_run_corridor_outputs() {
    let dir = workspace("vv_it_run");
    let options = RunOptions {
        tramo: "t6".to_string(),
        axis: write(&dir, "eje.geojson", AXIS),
        sources: Some(write(&dir, "fuentes.geojson", SOURCES)),
        disposal: None,
        boreholes: Some(write(&dir, "sondeos.csv", BOREHOLES)),
        parallel: true,
    };
    let out = dir.join("outputs");

    let report = run_corridor(&options, &config(&out)).unwrap();

    assert_eq!(report.axis_length_m, 10_000.0);
    assert_eq!(report.axis_label, "K10+000");
    assert_eq!(report.markers, 11);

    let sources = &report.layers["fuentes"];
    assert_eq!(sources.loaded, 3);
    assert_eq!(sources.skipped, 1);
    assert_eq!(sources.within_radius, 2);
    assert_eq!(report.layers["sondeos"].within_radius, 3);
    // entité sans géométrie
    assert_eq!(report.status, RunStatus::WithWarnings);

    let tramo_dir = out.join("salidas_t6");
    for name in [
        "abscisas.csv",
        "abscisas.geojson",
        "eje_t6.geojson",
        "fuentes_resumen.csv",
        "fuentes.geojson",
        "sondeos_resumen.csv",
        "sondeos_sucs.csv",
        "sondeos_spt.csv",
        "sondeos_profundidad.csv",
        "EJE_T6.dxf",
        "FUENTES.dxf",
        "SONDEOS.dxf",
        "ABSCISAS.dxf",
        "resumen.json",
    ] {
        assert!(tramo_dir.join(name).is_file(), "missing {}", name);
    }
    assert!(!tramo_dir.join("ZONAS_DISPOSICION.dxf").exists());

    // le DXF reprend toute la couche chargée, hors rayon compris
    let sources_dxf = std::fs::read_to_string(tramo_dir.join("FUENTES.dxf")).unwrap();
    assert!(sources_dxf.contains("2090000.0000"));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_sources_summary_sorted_by_chainage() {
    let dir = workspace("vv_it_summary");
    let options = RunOptions {
        tramo: "t6".to_string(),
        axis: write(&dir, "eje.geojson", AXIS),
        sources: Some(write(&dir, "fuentes.geojson", SOURCES)),
        ..Default::default()
    };
    let out = dir.join("outputs");
    run_corridor(&options, &config(&out)).unwrap();

    let mut reader =
        csv::Reader::from_path(out.join("salidas_t6").join("fuentes_resumen.csv")).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

    assert_eq!(rows.len(), 2);
    // point nommé nul -> sin_nombre, à K1+000
    assert_eq!(&rows[0][0], "sin_nombre");
    assert_eq!(&rows[0][4], "K1+000");
    assert!((rows[0][1].parse::<f64>().unwrap() - 300.0).abs() < 1e-6);
    // polygone: centroïde à 8 km, 200 m à droite de l'axe
    assert_eq!(&rows[1][0], "Cantera Sur");
    assert_eq!(&rows[1][4], "K8+000");
    assert!((rows[1][2].parse::<f64>().unwrap() + 200.0).abs() < 1e-6);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_sucs_summary() {
    let dir = workspace("vv_it_sucs");
    let options = RunOptions {
        tramo: "t6".to_string(),
        axis: write(&dir, "eje.geojson", AXIS),
        boreholes: Some(write(&dir, "sondeos.csv", BOREHOLES)),
        ..Default::default()
    };
    let out = dir.join("outputs");
    run_corridor(&options, &config(&out)).unwrap();

    let content =
        std::fs::read_to_string(out.join("salidas_t6").join("sondeos_sucs.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "SUCS,Conteo,Porcentaje,Descripcion");
    assert_eq!(lines[1], "CH,2,66.7,Arcilla de alta plasticidad");
    assert_eq!(lines[2], "SC,1,33.3,Arena arcillosa");

    let spt = std::fs::read_to_string(out.join("salidas_t6").join("sondeos_spt.csv")).unwrap();
    let lines: Vec<&str> = spt.lines().collect();
    assert_eq!(lines[0], "SUCS,n,N_SPT_medio,N_SPT_std,N_SPT_min,N_SPT_max,Descripcion");
    assert_eq!(lines[1], "CH,2,16.0,5.66,12.0,20.0,Arcilla de alta plasticidad");
    assert_eq!(lines[2], "SC,1,8.0,,8.0,8.0,Arena arcillosa");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_borehole_depths() {
    let dir = workspace("vv_it_depths");
    let options = RunOptions {
        tramo: "t6".to_string(),
        axis: write(&dir, "eje.geojson", AXIS),
        boreholes: Some(write(&dir, "sondeos.csv", BOREHOLES)),
        ..Default::default()
    };
    let out = dir.join("outputs");
    let mut config = config(&out);
    config.name_field = "id".to_string();
    run_corridor(&options, &config).unwrap();

    let content =
        std::fs::read_to_string(out.join("salidas_t6").join("sondeos_profundidad.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "nombre,abscisa_lbl,prof_min,prof_max,prof_med,SUCS");
    assert_eq!(lines[1], "S1,K2+000,1.0,1.5,1.25,CH");
    assert_eq!(lines[2], "S2,K3+000,0.5,1.0,0.75,SC");
    assert_eq!(lines[3], "S3,K4+000,2.0,2.0,2.0,CH");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_wgs84_axis_is_reprojected() {
    let dir = workspace("vv_it_wgs84");
    // pas de membre crs: WGS84 supposé
    let axis = write(
        &dir,
        "eje.geojson",
        r#"{"type": "LineString", "coordinates": [[-74.0, 4.5], [-73.9, 4.5]]}"#,
    );
    let options = RunOptions {
        tramo: "gps".to_string(),
        axis,
        ..Default::default()
    };
    let out = dir.join("outputs");
    let report = run_corridor(&options, &config(&out)).unwrap();

    // 0,1° de longitude à 4,5° N ≈ 11,09 km
    assert!((report.axis_length_m - 11_090.0).abs() < 30.0, "{}", report.axis_length_m);
    assert_eq!(report.epsg, 9377);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_missing_axis_file() {
    let dir = workspace("vv_it_missing");
    let options = RunOptions {
        tramo: "t6".to_string(),
        axis: dir.join("nope.geojson"),
        ..Default::default()
    };
    let err = run_corridor(&options, &config(&dir)).unwrap_err();
    assert!(format!("{:#}", err).contains("File not found"));

    std::fs::remove_dir_all(dir).ok();
}

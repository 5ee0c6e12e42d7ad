//! Tables CSV (résumés par couche, abscisses, sondages)

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use abscisa::{AnnotatedFeature, ChainageMarker};

use crate::geology::{DepthRow, SptSummary, SucsSummary};

/// Ligne du résumé d'une couche référencée, valeurs en pleine précision
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    nombre: &'a str,
    dist_m: f64,
    lado_m: f64,
    abscisa_m: f64,
    abscisa_lbl: &'a str,
    x: f64,
    y: f64,
    x_axis: f64,
    y_axis: f64,
}

impl<'a> From<&'a AnnotatedFeature> for SummaryRow<'a> {
    fn from(f: &'a AnnotatedFeature) -> Self {
        Self {
            nombre: &f.name,
            dist_m: f.offset_m,
            lado_m: f.side_offset_m,
            abscisa_m: f.chainage_m,
            abscisa_lbl: &f.chainage_label,
            x: f.x,
            y: f.y,
            x_axis: f.x_axis,
            y_axis: f.y_axis,
        }
    }
}

/// Ligne de la table des abscisses
#[derive(Debug, Serialize)]
struct ChainageRow<'a> {
    abscisa: &'a str,
    distancia_m: f64,
    x: f64,
    y: f64,
    crs: String,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    let mut count = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Écrit le résumé des entités référencées; retourne le nombre de lignes
pub fn export_summary(features: &[AnnotatedFeature], path: &Path) -> Result<usize> {
    write_rows(path, features.iter().map(SummaryRow::from))
}

/// Écrit la table `abscisa, distancia_m, x, y, crs`
pub fn export_chainage(markers: &[ChainageMarker], epsg: u32, path: &Path) -> Result<usize> {
    let crs = format!("EPSG:{}", epsg);
    write_rows(
        path,
        markers.iter().map(|m| ChainageRow {
            abscisa: &m.label,
            distancia_m: m.distance_m,
            x: m.point.x(),
            y: m.point.y(),
            crs: crs.clone(),
        }),
    )
}

/// Écrit les effectifs par classe SUCS
pub fn export_sucs(summary: &[SucsSummary], path: &Path) -> Result<usize> {
    write_rows(path, summary)
}

/// Écrit les statistiques N_SPT; cellule vide pour une statistique absente
pub fn export_spt(summary: &[SptSummary], path: &Path) -> Result<usize> {
    write_rows(path, summary)
}

pub fn export_depths(rows: &[DepthRow], path: &Path) -> Result<usize> {
    write_rows(path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};

    fn feature(name: &str, chainage_m: f64) -> AnnotatedFeature {
        AnnotatedFeature {
            source_index: 0,
            name: name.to_string(),
            offset_m: 120.456,
            side_offset_m: -120.456,
            chainage_m,
            chainage_label: abscisa::format_chainage(chainage_m),
            x: 4_880_000.12345,
            y: 2_066_000.0,
            x_axis: 4_880_000.0,
            y_axis: 2_066_120.0,
            geometry: Geometry::Point(Point::new(4_880_000.12345, 2_066_000.0)),
        }
    }

    #[test]
    fn test_export_summary() {
        let path = std::env::temp_dir().join("vv_test_fuentes_resumen.csv");
        let count = export_summary(&[feature("Cantera, Norte", 4100.0)], &path).unwrap();
        assert_eq!(count, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("nombre,dist_m,lado_m,abscisa_m,abscisa_lbl,x,y,x_axis,y_axis")
        );
        let row = lines.next().unwrap();
        // pas d'arrondi à l'écriture
        assert_eq!(
            row,
            "\"Cantera, Norte\",120.456,-120.456,4100.0,K4+100,4880000.12345,2066000.0,4880000.0,2066120.0"
        );

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_chainage() {
        let markers = vec![
            ChainageMarker {
                point: Point::new(0.0, 0.0),
                distance_m: 0.0,
                label: "K0+000".to_string(),
            },
            ChainageMarker {
                point: Point::new(500.0, 0.0),
                distance_m: 500.0,
                label: "K0+500".to_string(),
            },
        ];
        let path = std::env::temp_dir().join("vv_test_abscisas.csv");
        assert_eq!(export_chainage(&markers, 9377, &path).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("abscisa,distancia_m,x,y,crs\n"));
        assert!(content.contains("K0+500,500.0,500.0,0.0,EPSG:9377"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_sucs() {
        let summary = vec![SucsSummary {
            sucs: "CH".to_string(),
            count: 3,
            percentage: 60.0,
            description: "Arcilla de alta plasticidad".to_string(),
        }];
        let path = std::env::temp_dir().join("vv_test_sucs.csv");
        export_sucs(&summary, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("SUCS,Conteo,Porcentaje,Descripcion\n"));
        assert!(content.contains("CH,3,60.0,Arcilla de alta plasticidad"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_spt() {
        let summary = vec![SptSummary {
            sucs: "SC".to_string(),
            n: 1,
            mean: Some(30.5),
            std: None,
            min: Some(30.5),
            max: Some(30.5),
            description: "Arena arcillosa".to_string(),
        }];
        let path = std::env::temp_dir().join("vv_test_spt.csv");
        export_spt(&summary, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("SUCS,n,N_SPT_medio,N_SPT_std,N_SPT_min,N_SPT_max,Descripcion")
        );
        assert_eq!(lines.next(), Some("SC,1,30.5,,30.5,30.5,Arena arcillosa"));

        std::fs::remove_file(path).ok();
    }
}

//! Tables de points (sondages, relevés) au format CSV
//!
//! Colonnes `X`/`Y` (casse indifférente) en coordonnées déjà projetées; toutes
//! les autres colonnes deviennent des attributs. Séparateur `,` ou `;`
//! (détecté sur l'en-tête), décimales `.` ou `,`. Les marqueurs de valeur
//! manquante (`NaN`, `NA`, `N/A`, `NULL`, cellule vide) donnent un attribut nul.

use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::warn;

use abscisa::{Attributes, FeatureGeometry, RawFeature};
use geo::Point;

use super::Layer;

/// Charge un CSV de points; la couche reçoit l'EPSG donné
pub fn load(path: &Path, epsg: u32) -> Result<Layer> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_str(&content, epsg).with_context(|| format!("Invalid CSV: {}", path.display()))
}

/// Parse le contenu d'un CSV de points
pub fn parse_str(content: &str, epsg: u32) -> Result<Layer> {
    let delimiter = sniff_delimiter(content);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Missing CSV header")?.clone();
    let x_idx = find_column(&headers, "x")?;
    let y_idx = find_column(&headers, "y")?;

    let mut layer = Layer {
        epsg: Some(epsg),
        ..Default::default()
    };

    for (row, record) in reader.records().enumerate() {
        // ligne 1 = en-tête
        let line = row + 2;
        let record = record.with_context(|| format!("Malformed CSV record at line {}", line))?;

        let (Some(x), Some(y)) = (
            parse_number(record.get(x_idx), "X", line)?,
            parse_number(record.get(y_idx), "Y", line)?,
        ) else {
            warn!(line, "CSV row without coordinates, skipped");
            layer.skipped += 1;
            continue;
        };

        let attributes: Attributes = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx)
            .map(|(_, (key, value))| {
                let value = (!is_missing(value)).then(|| value.to_string());
                (key.to_string(), value)
            })
            .collect();

        layer.features.push(RawFeature::new(
            FeatureGeometry::Point(Point::new(x, y)),
            attributes,
        ));
    }

    Ok(layer)
}

/// Marqueurs de cellule manquante, casse indifférente
const MISSING_TOKENS: [&str; 4] = ["nan", "na", "n/a", "null"];

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || MISSING_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// `;` si l'en-tête en contient et ne contient pas de `,`
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    if header.contains(';') && !header.contains(',') {
        b';'
    } else {
        b','
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    match headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
    {
        Some(idx) => Ok(idx),
        None => bail!(
            "Missing '{}' column (found: {})",
            name.to_ascii_uppercase(),
            headers.iter().collect::<Vec<_>>().join(", ")
        ),
    }
}

/// `None` pour une cellule manquante, erreur si la valeur n'est pas numérique
fn parse_number(field: Option<&str>, column: &str, line: usize) -> Result<Option<f64>> {
    let Some(raw) = field.map(str::trim).filter(|s| !is_missing(s)) else {
        return Ok(None);
    };

    let value: f64 = raw
        .replace(',', ".")
        .parse()
        .with_context(|| format!("Invalid {} value '{}' at line {}", column, raw, line))?;
    if !value.is_finite() {
        bail!("Non-finite {} value '{}' at line {}", column, raw, line);
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let content = "id,X,Y,SUCS\nS1,4880000.5,2066000,CH\nS2,4881000,2066500,\n";
        let layer = parse_str(content, 9377).unwrap();

        assert_eq!(layer.epsg, Some(9377));
        assert_eq!(layer.len(), 2);
        assert_eq!(
            layer.features[0].geometry,
            FeatureGeometry::Point(Point::new(4880000.5, 2066000.0))
        );
        assert_eq!(layer.features[0].attributes.get("id"), Some("S1"));
        assert_eq!(layer.features[0].attributes.get("SUCS"), Some("CH"));
        // cellule vide -> valeur manquante
        assert_eq!(layer.features[1].attributes.get("SUCS"), None);
        // X/Y ne sont pas des attributs
        assert_eq!(layer.features[0].attributes.get("X"), None);
    }

    #[test]
    fn test_semicolon_and_decimal_comma() {
        let content = "Nombre;x;y\nP1;4880000,25;2066000,75\n";
        let layer = parse_str(content, 9377).unwrap();

        assert_eq!(
            layer.features[0].geometry,
            FeatureGeometry::Point(Point::new(4880000.25, 2066000.75))
        );
        assert_eq!(layer.features[0].attributes.name("Nombre"), Some("P1"));
    }

    #[test]
    fn test_missing_coordinates_skipped() {
        let content = "id,X,Y\nS1,1,2\nS2,,\n";
        let layer = parse_str(content, 9377).unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.skipped, 1);
    }

    #[test]
    fn test_missing_tokens_are_null() {
        let content = "Name,X,Y,SUCS\n,100,10,NA\nNaN,200,10,null\nValid,300,10,CL\nN/A,NaN,10,\n";
        let layer = parse_str(content, 9377).unwrap();

        // X = NaN: ligne sans coordonnées
        assert_eq!(layer.len(), 3);
        assert_eq!(layer.skipped, 1);
        assert_eq!(layer.features[1].attributes.get("Name"), None);
        assert_eq!(layer.features[0].attributes.get("SUCS"), None);
        assert_eq!(layer.features[1].attributes.get("SUCS"), None);

        let axis = abscisa::Alignment::new(geo::LineString::from(vec![(0.0, 0.0), (1000.0, 0.0)]))
            .unwrap();
        let names: Vec<String> = abscisa::annotate(&layer.features, &axis, "Name")
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["sin_nombre", "sin_nombre", "Valid"]);
    }

    #[test]
    fn test_missing_column() {
        let err = parse_str("id,Lon,Lat\nS1,1,2\n", 9377).unwrap_err();
        assert!(err.to_string().contains("'X'"));
    }

    #[test]
    fn test_invalid_number() {
        let err = parse_str("X,Y\nabc,2\n", 9377).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}

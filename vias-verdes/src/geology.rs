//! Sondages: classification SUCS et profondeurs

use std::collections::BTreeMap;

use serde::Serialize;

use abscisa::{AnnotatedFeature, RawFeature};

/// Colonne SUCS par défaut des tables de sondages
pub const SUCS_FIELD: &str = "SUCS";
/// Colonne des essais SPT (nombre de coups N)
pub const SPT_FIELD: &str = "N_SPT";
/// Colonne des intervalles de profondeur
pub const DEPTH_FIELD: &str = "Profundidad";

const SUCS_CODES: [(&str, &str); 15] = [
    ("GW", "Grava bien gradada"),
    ("GP", "Grava mal gradada"),
    ("GM", "Grava limosa"),
    ("GC", "Grava arcillosa"),
    ("SW", "Arena bien gradada"),
    ("SP", "Arena mal gradada"),
    ("SM", "Arena limosa"),
    ("SC", "Arena arcillosa"),
    ("ML", "Limo de baja plasticidad"),
    ("CL", "Arcilla de baja plasticidad"),
    ("OL", "Suelo orgánico de baja plasticidad"),
    ("MH", "Limo de alta plasticidad"),
    ("CH", "Arcilla de alta plasticidad"),
    ("OH", "Suelo orgánico de alta plasticidad"),
    ("PT", "Turba"),
];

/// Description d'un code SUCS (casse et blancs ignorés)
pub fn sucs_description(code: &str) -> String {
    let key = code.trim().to_ascii_uppercase();
    SUCS_CODES
        .iter()
        .find(|(c, _)| *c == key)
        .map(|(_, desc)| desc.to_string())
        .unwrap_or_else(|| format!("Unknown ({})", code))
}

/// Intervalle de profondeur `(min, max, milieu)`.
///
/// Accepte `"1,00 - 1,50"`, `"1.00-1.50"`, `"1 a 2"` ou une valeur seule.
/// Texte illisible: `(0, 0, 0)`.
pub fn parse_depth_range(text: &str) -> (f64, f64, f64) {
    let text = text.replace(',', ".");

    if let Some(sep) = [" - ", "-", " a "].into_iter().find(|s| text.contains(s)) {
        let parts: Vec<&str> = text.split(sep).collect();
        if let [min, max] = parts.as_slice() {
            if let (Ok(min), Ok(max)) = (min.trim().parse::<f64>(), max.trim().parse::<f64>()) {
                return (min, max, (min + max) / 2.0);
            }
        }
    }

    match text.trim().parse::<f64>() {
        Ok(value) => (value, value, value),
        Err(_) => (0.0, 0.0, 0.0),
    }
}

/// Ligne du résumé par classe SUCS
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SucsSummary {
    #[serde(rename = "SUCS")]
    pub sucs: String,
    #[serde(rename = "Conteo")]
    pub count: usize,
    /// Arrondi à une décimale
    #[serde(rename = "Porcentaje")]
    pub percentage: f64,
    #[serde(rename = "Descripcion")]
    pub description: String,
}

/// Effectifs par code SUCS, du plus fréquent au moins fréquent (puis par code).
///
/// Les entités sans valeur dans `field` ne sont pas comptées.
pub fn summarize_by_sucs(features: &[RawFeature], field: &str) -> Vec<SucsSummary> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for code in features
        .iter()
        .filter_map(|f| f.attributes.name(field))
        .map(str::trim)
    {
        *counts.entry(code.to_string()).or_default() += 1;
    }

    let total: usize = counts.values().sum();
    let mut summary: Vec<SucsSummary> = counts
        .into_iter()
        .map(|(sucs, count)| SucsSummary {
            description: sucs_description(&sucs),
            percentage: (count as f64 / total as f64 * 1000.0).round() / 10.0,
            sucs,
            count,
        })
        .collect();

    // tri stable: l'ordre alphabétique départage les égalités
    summary.sort_by(|a, b| b.count.cmp(&a.count));
    summary
}

/// Statistiques N_SPT d'une classe SUCS
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SptSummary {
    #[serde(rename = "SUCS")]
    pub sucs: String,
    /// Essais avec une valeur numérique
    pub n: usize,
    #[serde(rename = "N_SPT_medio")]
    pub mean: Option<f64>,
    /// Écart-type d'échantillon, absent sous deux essais
    #[serde(rename = "N_SPT_std")]
    pub std: Option<f64>,
    #[serde(rename = "N_SPT_min")]
    pub min: Option<f64>,
    #[serde(rename = "N_SPT_max")]
    pub max: Option<f64>,
    #[serde(rename = "Descripcion")]
    pub description: String,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Valeur numérique d'un attribut (décimale `,` acceptée), `None` sinon
fn numeric(feature: &RawFeature, field: &str) -> Option<f64> {
    feature
        .attributes
        .get(field)
        .and_then(|v| v.trim().replace(',', ".").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Statistiques N_SPT par code SUCS, statistiques arrondies à 2 décimales.
///
/// Les valeurs non numériques sont ignorées; une classe sans essai valide
/// reste listée avec `n = 0`. Tri par `n` décroissant, puis par code.
pub fn summarize_spt_by_sucs(
    features: &[RawFeature],
    sucs_field: &str,
    spt_field: &str,
) -> Vec<SptSummary> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for feature in features {
        let Some(code) = feature.attributes.name(sucs_field) else {
            continue;
        };
        let values = groups.entry(code.trim().to_string()).or_default();
        values.extend(numeric(feature, spt_field));
    }

    let mut summary: Vec<SptSummary> = groups
        .into_iter()
        .map(|(sucs, values)| {
            let n = values.len();
            let mean = (n > 0).then(|| values.iter().sum::<f64>() / n as f64);
            let std = mean.filter(|_| n > 1).map(|mean| {
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
                var.sqrt()
            });
            let min = values.iter().copied().reduce(f64::min);
            let max = values.iter().copied().reduce(f64::max);
            SptSummary {
                description: sucs_description(&sucs),
                sucs,
                n,
                mean: mean.map(round2),
                std: std.map(round2),
                min: min.map(round2),
                max: max.map(round2),
            }
        })
        .collect();

    summary.sort_by(|a, b| b.n.cmp(&a.n));
    summary
}

/// Ligne de la table des profondeurs de sondage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthRow {
    pub nombre: String,
    pub abscisa_lbl: String,
    pub prof_min: f64,
    pub prof_max: f64,
    pub prof_med: f64,
    #[serde(rename = "SUCS")]
    pub sucs: Option<String>,
}

/// Profondeurs des sondages référencés, dans l'ordre des abscisses.
///
/// `layer` est la couche chargée: `source_index` y retrouve les attributs.
pub fn borehole_depths(
    annotated: &[AnnotatedFeature],
    layer: &[RawFeature],
    depth_field: &str,
    sucs_field: &str,
) -> Vec<DepthRow> {
    annotated
        .iter()
        .filter_map(|f| layer.get(f.source_index).map(|raw| (f, raw)))
        .map(|(f, raw)| {
            let (prof_min, prof_max, prof_med) =
                parse_depth_range(raw.attributes.get(depth_field).unwrap_or_default());
            DepthRow {
                nombre: f.name.clone(),
                abscisa_lbl: f.chainage_label.clone(),
                prof_min,
                prof_max,
                prof_med,
                sucs: raw.attributes.name(sucs_field).map(|s| s.trim().to_string()),
            }
        })
        .collect()
}

/// `true` si au moins une entité porte la colonne `field`
pub fn has_column(features: &[RawFeature], field: &str) -> bool {
    features
        .iter()
        .any(|f| f.attributes.iter().any(|(key, _)| key == field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn borehole(code: Option<&str>) -> RawFeature {
        RawFeature::point(0.0, 0.0, SUCS_FIELD, code)
    }

    #[test]
    fn test_sucs_description() {
        assert_eq!(sucs_description("CH"), "Arcilla de alta plasticidad");
        assert_eq!(sucs_description(" sc "), "Arena arcillosa");
        assert_eq!(sucs_description("PT"), "Turba");
        assert_eq!(sucs_description("XX"), "Unknown (XX)");
    }

    #[test]
    fn test_parse_depth_range() {
        assert_eq!(parse_depth_range("1,00 - 1,50"), (1.0, 1.5, 1.25));
        assert_eq!(parse_depth_range("1.00-1.50"), (1.0, 1.5, 1.25));
        assert_eq!(parse_depth_range("1 a 2"), (1.0, 2.0, 1.5));
        assert_eq!(parse_depth_range("3,5"), (3.5, 3.5, 3.5));
        assert_eq!(parse_depth_range("sin dato"), (0.0, 0.0, 0.0));
        assert_eq!(parse_depth_range(""), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_summarize_by_sucs() {
        let features = vec![
            borehole(Some("CH")),
            borehole(Some("SC")),
            borehole(Some("CH")),
            borehole(None),
            borehole(Some("ML")),
            borehole(Some("CH")),
        ];
        let summary = summarize_by_sucs(&features, SUCS_FIELD);

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].sucs, "CH");
        assert_eq!(summary[0].count, 3);
        assert_eq!(summary[0].percentage, 60.0);
        assert_eq!(summary[0].description, "Arcilla de alta plasticidad");
        // égalité 1-1: ordre alphabétique
        assert_eq!(summary[1].sucs, "ML");
        assert_eq!(summary[2].sucs, "SC");
        assert_eq!(summary[2].percentage, 20.0);
    }

    #[test]
    fn test_percentage_rounding() {
        let features = vec![borehole(Some("GW")), borehole(Some("GP")), borehole(Some("GP"))];
        let summary = summarize_by_sucs(&features, SUCS_FIELD);
        assert_eq!(summary[0].percentage, 66.7);
        assert_eq!(summary[1].percentage, 33.3);
    }

    #[test]
    fn test_has_column() {
        assert!(has_column(&[borehole(None)], SUCS_FIELD));
        assert!(!has_column(&[RawFeature::point(0.0, 0.0, "id", Some("S1"))], SUCS_FIELD));
    }

    fn spt(code: Option<&str>, n: Option<&str>) -> RawFeature {
        let mut feature = borehole(code);
        feature.attributes.insert(SPT_FIELD, n.map(str::to_string));
        feature
    }

    #[test]
    fn test_summarize_spt_by_sucs() {
        let features = vec![
            spt(Some("CH"), Some("10")),
            spt(Some("CH"), Some("15")),
            spt(Some("CH"), Some("rechazo")),
            spt(Some("CH"), Some("21")),
            spt(Some("SC"), Some("30,5")),
            spt(Some("ML"), None),
            spt(None, Some("50")),
        ];
        let summary = summarize_spt_by_sucs(&features, SUCS_FIELD, SPT_FIELD);

        assert_eq!(summary.len(), 3);
        let ch = &summary[0];
        assert_eq!((ch.sucs.as_str(), ch.n), ("CH", 3));
        assert_eq!(ch.mean, Some(15.33));
        assert_eq!(ch.std, Some(5.51));
        assert_eq!((ch.min, ch.max), (Some(10.0), Some(21.0)));
        assert_eq!(ch.description, "Arcilla de alta plasticidad");

        // un seul essai: pas d'écart-type
        let sc = &summary[1];
        assert_eq!((sc.sucs.as_str(), sc.n), ("SC", 1));
        assert_eq!(sc.mean, Some(30.5));
        assert_eq!(sc.std, None);

        let ml = &summary[2];
        assert_eq!(ml.n, 0);
        assert_eq!(ml.mean, None);
    }

    #[test]
    fn test_borehole_depths() {
        let mut layer = vec![borehole(Some("CH")), borehole(Some("SC"))];
        layer[0].attributes.insert(DEPTH_FIELD, Some("1,00 - 1,50".to_string()));
        layer[1].attributes.insert(DEPTH_FIELD, None);

        let axis = abscisa::Alignment::new(geo::LineString::from(vec![(-10.0, 0.0), (10.0, 0.0)]))
            .unwrap();
        let mut annotated = abscisa::annotate(&layer, &axis, "id");
        annotated.reverse();

        let rows = borehole_depths(&annotated, &layer, DEPTH_FIELD, SUCS_FIELD);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sucs.as_deref(), Some("SC"));
        assert_eq!((rows[0].prof_min, rows[0].prof_max), (0.0, 0.0));
        assert_eq!(rows[1].sucs.as_deref(), Some("CH"));
        assert_eq!((rows[1].prof_min, rows[1].prof_max, rows[1].prof_med), (1.0, 1.5, 1.25));
        assert_eq!(rows[1].nombre, "sin_nombre");
        assert_eq!(rows[1].abscisa_lbl, "K0+010");
    }
}

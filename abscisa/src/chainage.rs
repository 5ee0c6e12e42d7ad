//! Abscisses au format K+ (`K5+250` = 5 km + 250 m depuis l'origine)
//!
//! Conversion distance <-> étiquette et génération de repères réguliers le
//! long de l'axe. Toutes les distances sont en mètres.

use std::fmt;
use std::str::FromStr;

use crate::types::{Alignment, ChainageMarker};
use crate::AbscisaError;

/// Abscisse en mètres, affichée au format `K{km}+{m:03}`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Chainage(pub f64);

impl Chainage {
    pub fn meters(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Chainage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_assert!(
            !(self.0 < 0.0),
            "chainage must be non-negative, got {}",
            self.0
        );
        // round() arrondit les demis vers l'infini: 5250.5 -> 5251
        let rounded = self.0.round() as i64;
        let km = rounded.div_euclid(1000);
        let rest = rounded.rem_euclid(1000);
        write!(f, "K{}+{:03}", km, rest)
    }
}

impl FromStr for Chainage {
    type Err = AbscisaError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let trimmed = label.trim();
        let body = trimmed
            .strip_prefix('K')
            .or_else(|| trimmed.strip_prefix('k'))
            .ok_or_else(|| AbscisaError::format(label, "missing K prefix"))?;

        let parts: Vec<&str> = body.split('+').collect();
        if parts.len() != 2 {
            return Err(AbscisaError::format(
                label,
                format!("expected exactly one '+', got {} parts", parts.len()),
            ));
        }

        let km = parse_digits(label, parts[0], "kilometers")?;
        let rest = parse_digits(label, parts[1], "meters")?;

        let meters = km
            .checked_mul(1000)
            .and_then(|m| m.checked_add(rest))
            .ok_or_else(|| AbscisaError::format(label, "value out of range"))?;

        Ok(Self(meters as f64))
    }
}

fn parse_digits(label: &str, part: &str, what: &str) -> Result<u64, AbscisaError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AbscisaError::format(
            label,
            format!("{} part {:?} is not numeric", what, part),
        ));
    }
    part.parse()
        .map_err(|e| AbscisaError::format(label, format!("{} part: {}", what, e)))
}

/// Formate une distance en étiquette K+.
///
/// La distance est arrondie au mètre le plus proche (les demis vers le haut).
/// Précondition: `distance_m >= 0`; une valeur négative n'est pas un cas
/// supporté et n'est pas ramenée à zéro.
///
/// ```
/// assert_eq!(abscisa::format_chainage(5250.4), "K5+250");
/// assert_eq!(abscisa::format_chainage(150000.0), "K150+000");
/// ```
pub fn format_chainage(distance_m: f64) -> String {
    Chainage(distance_m).to_string()
}

/// Relit une étiquette K+ (insensible à la casse) en mètres
///
/// # Errors
///
/// `Format` si le préfixe `K` ou le séparateur `+` manque, ou si une des deux
/// parties n'est pas un entier.
pub fn parse_chainage(label: &str) -> Result<f64, AbscisaError> {
    label.parse::<Chainage>().map(Chainage::meters)
}

/// Suite d'abscisses régulières `start, start + i, start + 2i, ...` tant que
/// la valeur reste `<= total`.
///
/// La série est une valeur: chaque appel à [`StationSeries::iter`] repart du
/// début.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationSeries {
    total_length_m: f64,
    interval_m: f64,
    start_m: f64,
}

impl StationSeries {
    pub fn total_length_m(&self) -> f64 {
        self.total_length_m
    }

    pub fn interval_m(&self) -> f64 {
        self.interval_m
    }

    pub fn start_m(&self) -> f64 {
        self.start_m
    }

    /// Itère les couples `(distance_m, label)`
    pub fn iter(&self) -> Stations {
        Stations {
            series: *self,
            step: 0,
        }
    }
}

impl IntoIterator for &StationSeries {
    type Item = (f64, String);
    type IntoIter = Stations;

    fn into_iter(self) -> Stations {
        self.iter()
    }
}

/// Itérateur paresseux sur une [`StationSeries`]
#[derive(Debug, Clone)]
pub struct Stations {
    series: StationSeries,
    step: u64,
}

impl Iterator for Stations {
    type Item = (f64, String);

    fn next(&mut self) -> Option<Self::Item> {
        // start + k*interval plutôt qu'une accumulation (pas de dérive)
        let distance = self.series.start_m + self.step as f64 * self.series.interval_m;
        if distance > self.series.total_length_m {
            return None;
        }
        self.step += 1;
        Some((distance, format_chainage(distance)))
    }
}

/// Prépare les abscisses régulières sur une longueur totale
///
/// # Errors
///
/// `InvalidParameter` si l'intervalle n'est pas strictement positif et fini,
/// ou si l'abscisse de départ est négative ou non finie.
pub fn chainage_stations(
    total_length_m: f64,
    interval_m: f64,
    start_m: f64,
) -> Result<StationSeries, AbscisaError> {
    if !(interval_m.is_finite() && interval_m > 0.0) {
        return Err(AbscisaError::invalid_parameter(
            "interval_m",
            format!("must be a positive finite number, got {}", interval_m),
        ));
    }
    if !(start_m.is_finite() && start_m >= 0.0) {
        return Err(AbscisaError::invalid_parameter(
            "start_m",
            format!("must be a non-negative finite number, got {}", start_m),
        ));
    }
    if !total_length_m.is_finite() {
        return Err(AbscisaError::invalid_parameter(
            "total_length_m",
            format!("must be finite, got {}", total_length_m),
        ));
    }

    Ok(StationSeries {
        total_length_m,
        interval_m,
        start_m,
    })
}

/// Repères d'abscisse le long d'un axe (point, distance, étiquette)
#[derive(Debug, Clone, Copy)]
pub struct MarkerSeries<'a> {
    alignment: &'a Alignment,
    stations: StationSeries,
}

impl<'a> MarkerSeries<'a> {
    pub fn stations(&self) -> StationSeries {
        self.stations
    }

    pub fn iter(&self) -> Markers<'a> {
        Markers {
            alignment: self.alignment,
            stations: self.stations.iter(),
        }
    }
}

impl<'a> IntoIterator for &MarkerSeries<'a> {
    type Item = ChainageMarker;
    type IntoIter = Markers<'a>;

    fn into_iter(self) -> Markers<'a> {
        self.iter()
    }
}

/// Itérateur paresseux sur une [`MarkerSeries`]
#[derive(Debug, Clone)]
pub struct Markers<'a> {
    alignment: &'a Alignment,
    stations: Stations,
}

impl Iterator for Markers<'_> {
    type Item = ChainageMarker;

    fn next(&mut self) -> Option<ChainageMarker> {
        let (distance_m, label) = self.stations.next()?;
        Some(ChainageMarker {
            point: self.alignment.point_at(distance_m),
            distance_m,
            label,
        })
    }
}

/// Génère les repères d'abscisse tous les `interval_m` depuis `start_m`
///
/// Le dernier repère tombe exactement sur la fin de l'axe seulement si la
/// longueur est un multiple de l'intervalle; aucun repère final n'est forcé.
///
/// # Errors
///
/// Voir [`chainage_stations`].
pub fn generate_markers(
    alignment: &Alignment,
    interval_m: f64,
    start_m: f64,
) -> Result<MarkerSeries<'_>, AbscisaError> {
    let stations = chainage_stations(alignment.length_m(), interval_m, start_m)?;
    Ok(MarkerSeries {
        alignment,
        stations,
    })
}

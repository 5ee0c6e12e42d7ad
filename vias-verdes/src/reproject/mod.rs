//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Systèmes supportés, dans les deux sens:
//! - WGS84 (EPSG:4326) - GPS, KML
//! - MAGNA-SIRGAS Origen Nacional (EPSG:9377) - calculs
//! - UTM zone 18N (EPSG:32618)
//! - Web Mercator (EPSG:3857) - fonds de carte
//!
//! Le passage se fait par les coordonnées géographiques. MAGNA-SIRGAS est
//! assimilé à WGS84 (écart sub-métrique), comme le fait PROJ sans grille.

mod ellipsoid;
mod mercator;
#[cfg(feature = "reproject")]
mod proj;
mod smart;
mod tmerc;

pub use smart::SmartReprojector;
pub use tmerc::{TransverseMercator, ORIGEN_NACIONAL};

use anyhow::{bail, Result};
use geo::{Coord, Geometry, MapCoords};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Système de coordonnées géré par [`ReprojectorLite`]
#[derive(Debug, Clone, Copy, PartialEq)]
enum LiteCrs {
    Wgs84,
    Projected(TransverseMercator),
    WebMercator,
}

impl LiteCrs {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Wgs84),
            9377 => Some(Self::Projected(ORIGEN_NACIONAL)),
            32618 => Some(Self::Projected(tmerc::utm(18, false))),
            3857 => Some(Self::WebMercator),
            _ => None,
        }
    }

    fn to_geographic(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Wgs84 => Geographic::from_degrees(x, y),
            Self::Projected(tm) => tm.inverse(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
        }
    }

    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Wgs84 => geo.to_degrees(),
            Self::Projected(tm) => tm.forward(geo),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
        }
    }
}

/// Reprojection légère entre les systèmes usuels des corridors colombiens
#[derive(Debug, Clone)]
pub struct ReprojectorLite {
    source_epsg: u32,
    target_epsg: u32,
    source: LiteCrs,
    target: LiteCrs,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let Some(source) = LiteCrs::from_epsg(source_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 9377, 32618, 3857",
                source_epsg
            );
        };
        let Some(target) = LiteCrs::from_epsg(target_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 9377, 32618, 3857",
                target_epsg
            );
        };

        Ok(Self {
            source_epsg,
            target_epsg,
            source,
            target,
        })
    }

    /// Vérifie si l'EPSG est supporté
    pub fn is_supported_epsg(epsg: u32) -> bool {
        LiteCrs::from_epsg(epsg).is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let geo = self.source.to_geographic(x, y);
        let (tx, ty) = self.target.project(geo);

        if !tx.is_finite() || !ty.is_finite() {
            bail!(
                "Coordinate ({}, {}) cannot be transformed from EPSG:{} to EPSG:{}",
                x,
                y,
                self.source_epsg,
                self.target_epsg
            );
        }
        Ok((tx, ty))
    }

    /// Transforme une géométrie (tous types, coordonnée par coordonnée)
    pub fn transform_geometry(&self, geom: &Geometry<f64>) -> Result<Geometry<f64>> {
        geom.try_map_coords(|c| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

/// Vérifie si la reprojection PROJ est disponible
pub fn proj_available() -> bool {
    cfg!(feature = "reproject")
}

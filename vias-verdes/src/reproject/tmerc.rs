//! Projection Transverse Mercator (formules de Snyder)
//!
//! Utilisée par:
//! - MAGNA-SIRGAS Origen Nacional (EPSG:9377), origine unique pour la Colombie
//! - UTM zone 18N (EPSG:32618)

use super::ellipsoid::{Ellipsoid, GRS80, WGS84};
use super::Geographic;

/// Paramètres d'une projection Transverse Mercator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Méridien central (degrés)
    pub lon0: f64,
    /// Latitude d'origine (degrés)
    pub lat0: f64,
    /// Facteur d'échelle sur le méridien central
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// MAGNA-SIRGAS / Origen-Nacional (EPSG:9377)
pub const ORIGEN_NACIONAL: TransverseMercator = TransverseMercator {
    ellipsoid: GRS80,
    lon0: -73.0,
    lat0: 4.0,
    k0: 0.9992,
    false_easting: 5_000_000.0,
    false_northing: 2_000_000.0,
};

/// Zone UTM (hémisphère nord ou sud) sur WGS84
pub fn utm(zone: u32, south: bool) -> TransverseMercator {
    TransverseMercator {
        ellipsoid: WGS84,
        lon0: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
        lat0: 0.0,
        k0: 0.9996,
        false_easting: 500_000.0,
        false_northing: if south { 10_000_000.0 } else { 0.0 },
    }
}

impl TransverseMercator {
    /// Coordonnées géographiques -> projetées (mètres)
    pub fn forward(&self, geo: Geographic) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        let phi = geo.lat;
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
        let t = tan_phi.powi(2);
        let c = ep2 * cos_phi.powi(2);
        let aa = (geo.lon - self.lon0.to_radians()) * cos_phi;

        let m = self.meridian_arc(phi);
        let m0 = self.meridian_arc(self.lat0.to_radians());

        let x = self.false_easting
            + self.k0
                * n
                * (aa
                    + (1.0 - t + c) * aa.powi(3) / 6.0
                    + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0);

        let y = self.false_northing
            + self.k0
                * (m - m0
                    + n * tan_phi
                        * (aa.powi(2) / 2.0
                            + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                            + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2)
                                * aa.powi(6)
                                / 720.0));

        (x, y)
    }

    /// Coordonnées projetées -> géographiques
    pub fn inverse(&self, x: f64, y: f64) -> Geographic {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        // Latitude du pied de la perpendiculaire
        let m = self.meridian_arc(self.lat0.to_radians()) + (y - self.false_northing) / self.k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();

        let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
        let t1 = tan_phi1.powi(2);
        let c1 = ep2 * cos_phi1.powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
        let d = (x - self.false_easting) / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4)
                        / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                        - 252.0 * ep2
                        - 3.0 * c1.powi(2))
                        * d.powi(6)
                        / 720.0);

        let lon = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        Geographic::new(lon, lat)
    }

    /// Longueur de l'arc de méridien depuis l'équateur
    fn meridian_arc(&self, phi: f64) -> f64 {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_false_origin() {
        let (x, y) = ORIGEN_NACIONAL.forward(Geographic::from_degrees(-73.0, 4.0));
        assert!((x - 5_000_000.0).abs() < 1e-6, "x={}", x);
        assert!((y - 2_000_000.0).abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_bogota_origen_nacional() {
        // Plaza de Bolívar: 74.0758°W, 4.5981°N
        let (x, y) = ORIGEN_NACIONAL.forward(Geographic::from_degrees(-74.0758, 4.5981));
        assert!((x - 4_880_713.9).abs() < 1.0, "x={}", x);
        assert!((y - 2_066_175.1).abs() < 1.0, "y={}", y);

        let (lon, lat) = ORIGEN_NACIONAL.inverse(x, y).to_degrees();
        assert!((lon + 74.0758).abs() < 1e-8, "lon={}", lon);
        assert!((lat - 4.5981).abs() < 1e-8, "lat={}", lat);
    }

    #[test]
    fn test_bogota_utm18n() {
        let zone = utm(18, false);
        assert_eq!(zone.lon0, -75.0);

        let (x, y) = zone.forward(Geographic::from_degrees(-74.0758, 4.5981));
        assert!((x - 602_516.0).abs() < 1.0, "x={}", x);
        assert!((y - 508_305.4).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_medellin_round_trip() {
        let (x, y) = ORIGEN_NACIONAL.forward(Geographic::from_degrees(-75.5636, 6.2518));
        let (lon, lat) = ORIGEN_NACIONAL.inverse(x, y).to_degrees();
        assert!((lon + 75.5636).abs() < 1e-8, "lon={}", lon);
        assert!((lat - 6.2518).abs() < 1e-8, "lat={}", lat);
    }
}

//! Projection Transverse Mercator (Gauss-Krüger)
//!
//! Séries de Krüger en n (troisième aplatissement), forme utilisée par le GSI
//! pour les systèmes de coordonnées rectangulaires plans du Japon.
//! Précision sub-millimétrique à l'intérieur d'une zone, inverse exacte à 1e-9°.
//!
//! Utilisée pour:
//! - JGD2011 / JGD2000 Japan Plane Rectangular CS I à XIX (EPSG:6669-6687, 2443-2461)
//! - UTM (EPSG:326xx, 327xx, 6688-6692)

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Paramètres et coefficients précalculés d'une projection Transverse Mercator
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    /// Longitude origine (radians)
    lon0: f64,
    /// Latitude origine (degrés, conservée pour le WKT)
    lat0_deg: f64,
    /// Longitude origine (degrés, conservée pour le WKT)
    lon0_deg: f64,
    /// Facteur d'échelle sur le méridien central
    k0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
    /// Première excentricité
    e: f64,
    /// Rayon rectifiant multiplié par k0
    a_bar: f64,
    /// Arc de méridien (projeté) à la latitude origine
    s0: f64,
    alpha: [f64; 5],
    beta: [f64; 5],
    delta: [f64; 6],
}

impl TransverseMercator {
    /// Crée une projection à partir de l'ellipsoïde et des paramètres (degrés, mètres)
    pub fn new(
        ellipsoid: &Ellipsoid,
        lat0_deg: f64,
        lon0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5,
            49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5,
            34729.0 / 80640.0 * n5,
        ];

        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5,
            4583.0 / 161280.0 * n5,
        ];

        let delta = [
            2.0 * n - 2.0 / 3.0 * n2 - 2.0 * n3 + 116.0 / 45.0 * n4 + 26.0 / 45.0 * n5
                - 2854.0 / 675.0 * n6,
            7.0 / 3.0 * n2 - 8.0 / 5.0 * n3 - 227.0 / 45.0 * n4 + 2704.0 / 315.0 * n5
                + 2323.0 / 945.0 * n6,
            56.0 / 15.0 * n3 - 136.0 / 35.0 * n4 - 1262.0 / 105.0 * n5 + 73814.0 / 2835.0 * n6,
            4279.0 / 630.0 * n4 - 332.0 / 35.0 * n5 - 399572.0 / 14175.0 * n6,
            4174.0 / 315.0 * n5 - 144838.0 / 6237.0 * n6,
            601676.0 / 22275.0 * n6,
        ];

        let a_bar = k0 * ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);

        let mut tm = Self {
            lon0: lon0_deg.to_radians(),
            lat0_deg,
            lon0_deg,
            k0,
            x0: false_easting,
            y0: false_northing,
            e: ellipsoid.e(),
            a_bar,
            s0: 0.0,
            alpha,
            beta,
            delta,
        };

        // Arc de méridien à l'origine: projection du point (lat0, lon0) sans décalage
        let (xi0, _) = tm.conformal_xi_eta(lat0_deg.to_radians(), 0.0);
        tm.s0 = a_bar * xi0;
        tm
    }

    pub fn lat0_deg(&self) -> f64 {
        self.lat0_deg
    }

    pub fn lon0_deg(&self) -> f64 {
        self.lon0_deg
    }

    pub fn k0(&self) -> f64 {
        self.k0
    }

    pub fn false_easting(&self) -> f64 {
        self.x0
    }

    pub fn false_northing(&self) -> f64 {
        self.y0
    }

    /// Coordonnées géographiques vers (easting, northing)
    pub fn forward(&self, geo: Geographic) -> (f64, f64) {
        let (xi, eta) = self.conformal_xi_eta(geo.lat, geo.lon - self.lon0);
        let easting = self.a_bar * eta + self.x0;
        let northing = self.a_bar * xi - self.s0 + self.y0;
        (easting, northing)
    }

    /// (easting, northing) vers coordonnées géographiques
    pub fn inverse(&self, easting: f64, northing: f64) -> Geographic {
        let xi = (northing - self.y0 + self.s0) / self.a_bar;
        let eta = (easting - self.x0) / self.a_bar;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        // Latitude conforme
        let chi = (xi_p.sin() / eta_p.cosh()).asin();

        let mut lat = chi;
        for (j, delta) in self.delta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            lat += delta * (k * chi).sin();
        }

        let lon = self.lon0 + eta_p.sinh().atan2(xi_p.cos());

        Geographic::new(lon, lat)
    }

    /// Coordonnées ξ, η (sans facteur d'échelle) pour une latitude et un écart de longitude
    fn conformal_xi_eta(&self, lat: f64, dlon: f64) -> (f64, f64) {
        let sin_lat = lat.sin();
        let t = (sin_lat.atanh() - self.e * (self.e * sin_lat).atanh()).sinh();

        let xi_p = t.atan2(dlon.cos());
        let eta_p = (dlon.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        (xi, eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::ellipsoid::{GRS80, WGS84};

    /// Zone IX (Tokyo): origine 36°N, 139°50'E
    fn zone_ix() -> TransverseMercator {
        TransverseMercator::new(&GRS80, 36.0, 139.0 + 50.0 / 60.0, 0.9999, 0.0, 0.0)
    }

    #[test]
    fn test_origin_maps_to_zero() {
        let tm = zone_ix();
        let (x, y) = tm.forward(Geographic::from_degrees(139.0 + 50.0 / 60.0, 36.0));
        assert!(x.abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_tokyo_station() {
        // Gare de Tokyo: 35.681236°N, 139.767125°E
        let tm = zone_ix();
        let (x, y) = tm.forward(Geographic::from_degrees(139.767125, 35.681236));

        // Environ 6 km à l'ouest et 35 km au sud de l'origine
        assert!((x - (-5992.92)).abs() < 0.05, "x={}", x);
        assert!((y - (-35363.24)).abs() < 0.05, "y={}", y);
    }

    #[test]
    fn test_utm_central_meridian() {
        // UTM 33N, 52°N sur le méridien central: northing = k0 * arc de méridien
        let tm = TransverseMercator::new(&WGS84, 0.0, 15.0, 0.9996, 500000.0, 0.0);
        let (x, y) = tm.forward(Geographic::from_degrees(15.0, 52.0));

        assert!((x - 500000.0).abs() < 1e-6, "x={}", x);
        assert!((y - 5761038.2).abs() < 1.0, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let tm = zone_ix();
        for &(lon, lat) in &[(139.767125, 35.681236), (141.5, 37.2), (138.1, 34.4)] {
            let (x, y) = tm.forward(Geographic::from_degrees(lon, lat));
            let (lon2, lat2) = tm.inverse(x, y).to_degrees();
            assert!((lon - lon2).abs() < 1e-9, "lon={} -> {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat={} -> {}", lat, lat2);
        }
    }

    #[test]
    fn test_southern_hemisphere() {
        // UTM 56S: Sydney
        let tm = TransverseMercator::new(&WGS84, 0.0, 153.0, 0.9996, 500000.0, 10000000.0);
        let (x, y) = tm.forward(Geographic::from_degrees(151.2093, -33.8688));
        assert!((x - 334368.6).abs() < 1.0, "x={}", x);
        assert!((y - 6250948.3).abs() < 1.0, "y={}", y);

        let (lon, lat) = tm.inverse(x, y).to_degrees();
        assert!((lon - 151.2093).abs() < 1e-9);
        assert!((lat - (-33.8688)).abs() < 1e-9);
    }
}

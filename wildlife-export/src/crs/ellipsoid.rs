//! Définitions des ellipsoïdes

/// Ellipsoïde de référence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Nom WKT
    pub name: &'static str,
    /// Code EPSG de l'ellipsoïde
    pub epsg: u32,
    /// Demi-grand axe (rayon équatorial) en mètres
    pub a: f64,
    /// Inverse de l'aplatissement
    pub inv_f: f64,
}

impl Ellipsoid {
    /// Aplatissement
    pub fn f(&self) -> f64 {
        1.0 / self.inv_f
    }

    /// Troisième aplatissement n = f / (2 - f)
    pub fn n(&self) -> f64 {
        let f = self.f();
        f / (2.0 - f)
    }

    /// Première excentricité au carré
    pub fn e2(&self) -> f64 {
        let f = self.f();
        2.0 * f - f * f
    }

    /// Première excentricité
    pub fn e(&self) -> f64 {
        self.e2().sqrt()
    }
}

/// Ellipsoïde WGS84
pub const WGS84: Ellipsoid = Ellipsoid {
    name: "WGS 84",
    epsg: 7030,
    a: 6378137.0,
    inv_f: 298.257223563,
};

/// Ellipsoïde GRS80 (JGD2000, JGD2011)
/// Note: Quasi identique à WGS84, différence < 0.1mm
pub const GRS80: Ellipsoid = Ellipsoid {
    name: "GRS 1980",
    epsg: 7019,
    a: 6378137.0,
    inv_f: 298.257222101,
};

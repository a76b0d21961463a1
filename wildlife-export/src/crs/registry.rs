//! Registre des systèmes de coordonnées de destination supportés
//!
//! Chaque code EPSG connu est décrit par son datum et sa projection, le WKT
//! écrit dans les `.prj` est généré à partir de cette description.

use std::fmt::Write;

use super::ellipsoid::{Ellipsoid, GRS80, WGS84};
use super::tmerc::TransverseMercator;
use super::Projection;

/// Datum géodésique et CRS géographique associé
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    /// Nom du CRS géographique
    pub name: &'static str,
    /// Nom WKT du datum
    pub datum_name: &'static str,
    pub datum_epsg: u32,
    /// Code EPSG du CRS géographique
    pub geographic_epsg: u32,
    pub ellipsoid: Ellipsoid,
}

pub const JGD2011: Datum = Datum {
    name: "JGD2011",
    datum_name: "Japanese_Geodetic_Datum_2011",
    datum_epsg: 1128,
    geographic_epsg: 6668,
    ellipsoid: GRS80,
};

pub const JGD2000: Datum = Datum {
    name: "JGD2000",
    datum_name: "Japanese_Geodetic_Datum_2000",
    datum_epsg: 6612,
    geographic_epsg: 4612,
    ellipsoid: GRS80,
};

pub const WGS84_DATUM: Datum = Datum {
    name: "WGS 84",
    datum_name: "WGS_1984",
    datum_epsg: 6326,
    geographic_epsg: 4326,
    ellipsoid: WGS84,
};

/// Origines des 19 systèmes rectangulaires plans du Japon (latitude, longitude en degrés)
const JAPAN_PLANE_ORIGINS: [(f64, f64); 19] = [
    (33.0, 129.5),
    (33.0, 131.0),
    (36.0, 132.0 + 10.0 / 60.0),
    (33.0, 133.5),
    (36.0, 134.0 + 20.0 / 60.0),
    (36.0, 136.0),
    (36.0, 137.0 + 10.0 / 60.0),
    (36.0, 138.5),
    (36.0, 139.0 + 50.0 / 60.0),
    (40.0, 140.0 + 50.0 / 60.0),
    (44.0, 140.25),
    (44.0, 142.25),
    (44.0, 144.25),
    (26.0, 142.0),
    (26.0, 127.5),
    (26.0, 124.0),
    (26.0, 131.0),
    (20.0, 136.0),
    (26.0, 154.0),
];

const ROMAN: [&str; 19] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV",
    "XV", "XVI", "XVII", "XVIII", "XIX",
];

/// Facteur d'échelle des systèmes rectangulaires plans
const JAPAN_PLANE_K0: f64 = 0.9999;
const UTM_K0: f64 = 0.9996;

/// Description complète d'un CRS de destination
#[derive(Debug, Clone)]
pub struct CrsDefinition {
    pub epsg: u32,
    pub name: String,
    pub datum: Datum,
    pub projection: Projection,
}

impl CrsDefinition {
    /// WKT1 (format attendu dans les `.prj`)
    pub fn wkt(&self) -> String {
        let geogcs = geogcs_wkt(&self.datum);

        match &self.projection {
            Projection::Identity => geogcs,
            Projection::TransverseMercator(tm) => {
                let mut wkt = format!("PROJCS[\"{}\",{},PROJECTION[\"Transverse_Mercator\"]", self.name, geogcs);
                push_parameter(&mut wkt, "latitude_of_origin", tm.lat0_deg());
                push_parameter(&mut wkt, "central_meridian", tm.lon0_deg());
                push_parameter(&mut wkt, "scale_factor", tm.k0());
                push_parameter(&mut wkt, "false_easting", tm.false_easting());
                push_parameter(&mut wkt, "false_northing", tm.false_northing());
                wkt.push_str(METRE_AXES);
                let _ = write!(wkt, ",AUTHORITY[\"EPSG\",\"{}\"]]", self.epsg);
                wkt
            }
            Projection::WebMercator => {
                let mut wkt = format!("PROJCS[\"{}\",{},PROJECTION[\"Mercator_1SP\"]", self.name, geogcs);
                push_parameter(&mut wkt, "central_meridian", 0.0);
                push_parameter(&mut wkt, "scale_factor", 1.0);
                push_parameter(&mut wkt, "false_easting", 0.0);
                push_parameter(&mut wkt, "false_northing", 0.0);
                wkt.push_str(METRE_AXES);
                wkt.push_str(
                    ",EXTENSION[\"PROJ4\",\"+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 \
                     +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs\"]",
                );
                let _ = write!(wkt, ",AUTHORITY[\"EPSG\",\"{}\"]]", self.epsg);
                wkt
            }
        }
    }
}

const METRE_AXES: &str =
    ",UNIT[\"metre\",1,AUTHORITY[\"EPSG\",\"9001\"]],AXIS[\"Easting\",EAST],AXIS[\"Northing\",NORTH]";

fn geogcs_wkt(datum: &Datum) -> String {
    let e = &datum.ellipsoid;
    format!(
        "GEOGCS[\"{}\",DATUM[\"{}\",SPHEROID[\"{}\",{},{},AUTHORITY[\"EPSG\",\"{}\"]],\
         AUTHORITY[\"EPSG\",\"{}\"]],PRIMEM[\"Greenwich\",0,AUTHORITY[\"EPSG\",\"8901\"]],\
         UNIT[\"degree\",0.0174532925199433,AUTHORITY[\"EPSG\",\"9122\"]],AUTHORITY[\"EPSG\",\"{}\"]]",
        datum.name, datum.datum_name, e.name, e.a, e.inv_f, e.epsg, datum.datum_epsg, datum.geographic_epsg
    )
}

fn push_parameter(wkt: &mut String, name: &str, value: f64) {
    let _ = write!(wkt, ",PARAMETER[\"{}\",{}]", name, value);
}

/// Recherche un CRS de destination par code EPSG
pub fn lookup(epsg: u32) -> Option<CrsDefinition> {
    match epsg {
        4326 => Some(CrsDefinition {
            epsg,
            name: "WGS 84".to_string(),
            datum: WGS84_DATUM,
            projection: Projection::Identity,
        }),
        3857 => Some(CrsDefinition {
            epsg,
            name: "WGS 84 / Pseudo-Mercator".to_string(),
            datum: WGS84_DATUM,
            projection: Projection::WebMercator,
        }),
        6669..=6687 => Some(japan_plane(epsg, (epsg - 6669) as usize, JGD2011)),
        2443..=2461 => Some(japan_plane(epsg, (epsg - 2443) as usize, JGD2000)),
        6688..=6692 => Some(utm(epsg, epsg - 6688 + 51, false, JGD2011)),
        32601..=32660 => Some(utm(epsg, epsg - 32600, false, WGS84_DATUM)),
        32701..=32760 => Some(utm(epsg, epsg - 32700, true, WGS84_DATUM)),
        _ => None,
    }
}

/// Tous les codes supportés, triés
pub fn supported_codes() -> Vec<u32> {
    let mut codes = vec![3857, 4326];
    codes.extend(2443..=2461);
    codes.extend(6669..=6692);
    codes.extend(32601..=32660);
    codes.extend(32701..=32760);
    codes.sort_unstable();
    codes
}

fn japan_plane(epsg: u32, zone: usize, datum: Datum) -> CrsDefinition {
    let (lat0, lon0) = JAPAN_PLANE_ORIGINS[zone];
    CrsDefinition {
        epsg,
        name: format!("{} / Japan Plane Rectangular CS {}", datum.name, ROMAN[zone]),
        datum,
        projection: Projection::TransverseMercator(TransverseMercator::new(
            &datum.ellipsoid,
            lat0,
            lon0,
            JAPAN_PLANE_K0,
            0.0,
            0.0,
        )),
    }
}

fn utm(epsg: u32, zone: u32, south: bool, datum: Datum) -> CrsDefinition {
    let lon0 = zone as f64 * 6.0 - 183.0;
    let false_northing = if south { 10_000_000.0 } else { 0.0 };
    CrsDefinition {
        epsg,
        name: format!(
            "{} / UTM zone {}{}",
            datum.name,
            zone,
            if south { 'S' } else { 'N' }
        ),
        datum,
        projection: Projection::TransverseMercator(TransverseMercator::new(
            &datum.ellipsoid,
            0.0,
            lon0,
            UTM_K0,
            500_000.0,
            false_northing,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_japan_plane_names() {
        assert_eq!(
            lookup(6669).unwrap().name,
            "JGD2011 / Japan Plane Rectangular CS I"
        );
        assert_eq!(
            lookup(6677).unwrap().name,
            "JGD2011 / Japan Plane Rectangular CS IX"
        );
        assert_eq!(
            lookup(6687).unwrap().name,
            "JGD2011 / Japan Plane Rectangular CS XIX"
        );
        assert_eq!(
            lookup(2451).unwrap().name,
            "JGD2000 / Japan Plane Rectangular CS IX"
        );
    }

    #[test]
    fn test_utm_zones() {
        let def = lookup(32654).unwrap();
        assert_eq!(def.name, "WGS 84 / UTM zone 54N");
        match def.projection {
            Projection::TransverseMercator(tm) => {
                assert_eq!(tm.lon0_deg(), 141.0);
                assert_eq!(tm.false_northing(), 0.0);
            }
            _ => panic!("expected transverse mercator"),
        }

        assert_eq!(lookup(32756).unwrap().name, "WGS 84 / UTM zone 56S");
        assert_eq!(lookup(6690).unwrap().name, "JGD2011 / UTM zone 53N");
    }

    #[test]
    fn test_unknown_codes() {
        assert!(lookup(0).is_none());
        assert!(lookup(2154).is_none());
        assert!(lookup(6668).is_none());
        assert!(lookup(32661).is_none());
    }

    #[test]
    fn test_every_supported_code_resolves() {
        let codes = supported_codes();
        assert_eq!(codes.len(), 2 + 19 + 24 + 60 + 60);
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        for code in codes {
            let def = lookup(code).unwrap();
            assert_eq!(def.epsg, code);
        }
    }

    #[test]
    fn test_japan_plane_wkt() {
        let wkt = lookup(6677).unwrap().wkt();
        assert!(wkt.starts_with("PROJCS[\"JGD2011 / Japan Plane Rectangular CS IX\",GEOGCS[\"JGD2011\""));
        assert!(wkt.contains("DATUM[\"Japanese_Geodetic_Datum_2011\""));
        assert!(wkt.contains("SPHEROID[\"GRS 1980\",6378137,298.257222101,AUTHORITY[\"EPSG\",\"7019\"]]"));
        assert!(wkt.contains("PROJECTION[\"Transverse_Mercator\"]"));
        assert!(wkt.contains("PARAMETER[\"latitude_of_origin\",36]"));
        assert!(wkt.contains("PARAMETER[\"scale_factor\",0.9999]"));
        assert!(wkt.ends_with("AUTHORITY[\"EPSG\",\"6677\"]]"));
        assert_eq!(wkt.matches('[').count(), wkt.matches(']').count());
    }

    #[test]
    fn test_geographic_wkt() {
        let wkt = lookup(4326).unwrap().wkt();
        assert!(wkt.starts_with("GEOGCS[\"WGS 84\""));
        assert!(wkt.ends_with("AUTHORITY[\"EPSG\",\"4326\"]]"));
        assert!(!wkt.contains("PROJCS"));
    }

    #[test]
    fn test_web_mercator_wkt() {
        let wkt = lookup(3857).unwrap().wkt();
        assert!(wkt.contains("Mercator_1SP"));
        assert!(wkt.contains("+nadgrids=@null"));
        assert_eq!(wkt.matches('[').count(), wkt.matches(']').count());
    }
}

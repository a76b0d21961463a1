//! Encodage des fichiers `.shp` et `.shx`
//!
//! En-tête de 100 octets (mixte big/little endian), puis un enregistrement par
//! shape. Les longueurs sont exprimées en mots de 16 bits.

use bytes::{BufMut, BytesMut};
use geo::{BoundingRect, Coord, LineString, Rect, Winding};

use crate::types::{Shape, ShapeType};
use crate::ShapefileError;

/// Taille de l'en-tête des fichiers .shp/.shx
pub const HEADER_LEN: usize = 100;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;

/// Accumule les enregistrements d'une couche en mémoire
#[derive(Debug)]
pub(crate) struct ShpBuffer {
    shape_type: ShapeType,
    body: BytesMut,
    index: BytesMut,
    records: i32,
    extent: Option<Rect>,
}

impl ShpBuffer {
    pub(crate) fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            body: BytesMut::with_capacity(16 * 1024),
            index: BytesMut::with_capacity(1024),
            records: 0,
            extent: None,
        }
    }

    pub(crate) fn records(&self) -> usize {
        self.records as usize
    }

    /// Ajoute une shape (Null ou du type de la couche)
    pub(crate) fn push(&mut self, shape: &Shape) -> Result<(), ShapefileError> {
        let content = match shape {
            s if s.is_empty() => encode_null(),
            Shape::Point(coord) => {
                self.check_type(ShapeType::Point)?;
                encode_point(*coord)
            }
            Shape::PolyLine(parts) => {
                self.check_type(ShapeType::PolyLine)?;
                let parts: Vec<&LineString> = parts.iter().filter(|p| !p.0.is_empty()).collect();
                encode_multipart(ShapeType::PolyLine, &parts)
            }
            Shape::Polygon(rings) => {
                self.check_type(ShapeType::Polygon)?;
                let rings = orient_rings(rings);
                let refs: Vec<&LineString> = rings.iter().collect();
                encode_multipart(ShapeType::Polygon, &refs)
            }
            Shape::Null => encode_null(),
        };

        let offset = HEADER_LEN + self.body.len();
        let total = offset + 8 + content.len();
        if total / 2 > i32::MAX as usize {
            return Err(ShapefileError::TooLarge(format!(
                "{} records exceed the 2 GB .shp limit",
                self.records + 1
            )));
        }

        self.records += 1;
        self.body.put_i32(self.records);
        self.body.put_i32((content.len() / 2) as i32);
        self.body.extend_from_slice(&content);

        self.index.put_i32((offset / 2) as i32);
        self.index.put_i32((content.len() / 2) as i32);

        if let Some(rect) = shape_extent(shape) {
            self.extent = Some(match self.extent {
                Some(current) => merge(current, rect),
                None => rect,
            });
        }

        Ok(())
    }

    /// Produit le contenu des fichiers .shp et .shx
    pub(crate) fn finish(self) -> (Vec<u8>, Vec<u8>) {
        let shp_len = HEADER_LEN + self.body.len();
        let shx_len = HEADER_LEN + self.index.len();

        let mut shp = BytesMut::with_capacity(shp_len);
        write_header(&mut shp, self.shape_type, shp_len, self.extent);
        shp.extend_from_slice(&self.body);

        let mut shx = BytesMut::with_capacity(shx_len);
        write_header(&mut shx, self.shape_type, shx_len, self.extent);
        shx.extend_from_slice(&self.index);

        (shp.to_vec(), shx.to_vec())
    }

    fn check_type(&self, found: ShapeType) -> Result<(), ShapefileError> {
        if found != self.shape_type {
            return Err(ShapefileError::ShapeMismatch {
                expected: self.shape_type,
                found,
            });
        }
        Ok(())
    }
}

fn write_header(buf: &mut BytesMut, shape_type: ShapeType, file_len: usize, extent: Option<Rect>) {
    buf.put_i32(FILE_CODE);
    for _ in 0..5 {
        buf.put_i32(0);
    }
    buf.put_i32((file_len / 2) as i32);
    buf.put_i32_le(VERSION);
    buf.put_i32_le(shape_type.code());

    // Couche vide: emprise à zéro
    let (min, max) = extent
        .map(|r| (r.min(), r.max()))
        .unwrap_or((Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));
    buf.put_f64_le(min.x);
    buf.put_f64_le(min.y);
    buf.put_f64_le(max.x);
    buf.put_f64_le(max.y);
    // Zmin, Zmax, Mmin, Mmax
    for _ in 0..4 {
        buf.put_f64_le(0.0);
    }
}

fn encode_null() -> BytesMut {
    let mut buf = BytesMut::with_capacity(4);
    buf.put_i32_le(ShapeType::Null.code());
    buf
}

fn encode_point(coord: Coord) -> BytesMut {
    let mut buf = BytesMut::with_capacity(20);
    buf.put_i32_le(ShapeType::Point.code());
    buf.put_f64_le(coord.x);
    buf.put_f64_le(coord.y);
    buf
}

/// PolyLine et Polygon partagent la même structure: box, parts, points
fn encode_multipart(shape_type: ShapeType, parts: &[&LineString]) -> BytesMut {
    let num_points: usize = parts.iter().map(|p| p.0.len()).sum();
    let mut buf = BytesMut::with_capacity(44 + 4 * parts.len() + 16 * num_points);

    buf.put_i32_le(shape_type.code());

    let rect = parts
        .iter()
        .filter_map(|p| p.bounding_rect())
        .reduce(merge)
        .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }));
    buf.put_f64_le(rect.min().x);
    buf.put_f64_le(rect.min().y);
    buf.put_f64_le(rect.max().x);
    buf.put_f64_le(rect.max().y);

    buf.put_i32_le(parts.len() as i32);
    buf.put_i32_le(num_points as i32);

    let mut start = 0i32;
    for part in parts {
        buf.put_i32_le(start);
        start += part.0.len() as i32;
    }
    for part in parts {
        for c in &part.0 {
            buf.put_f64_le(c.x);
            buf.put_f64_le(c.y);
        }
    }

    buf
}

/// Anneau extérieur en sens horaire, trous en sens anti-horaire
///
/// Les anneaux doivent être fermés (au moins 4 sommets): `geo` ne réoriente
/// pas un anneau ouvert, il est alors écrit tel quel.
fn orient_rings(rings: &[LineString]) -> Vec<LineString> {
    rings
        .iter()
        .filter(|r| !r.0.is_empty())
        .enumerate()
        .map(|(i, ring)| {
            let mut ring = ring.clone();
            if i == 0 {
                ring.make_cw_winding();
            } else {
                ring.make_ccw_winding();
            }
            ring
        })
        .collect()
}

fn shape_extent(shape: &Shape) -> Option<Rect> {
    match shape {
        Shape::Null => None,
        Shape::Point(c) => Some(Rect::new(*c, *c)),
        Shape::PolyLine(parts) | Shape::Polygon(parts) => {
            parts.iter().filter_map(|p| p.bounding_rect()).reduce(merge)
        }
    }
}

fn merge(a: Rect, b: Rect) -> Rect {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

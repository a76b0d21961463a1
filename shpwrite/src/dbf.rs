//! Encodage de la table attributaire dBASE III (`.dbf`)

use bytes::{BufMut, BytesMut};
use chrono::{Datelike, NaiveDate};

use crate::encoding::CodePage;
use crate::types::{FieldDef, FieldType, FieldValue};
use crate::ShapefileError;

const VERSION: u8 = 0x03;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const FIELD_NAME_LEN: usize = 10;

/// Vérifie une définition de champ
pub(crate) fn validate_field(field: &FieldDef) -> Result<(), ShapefileError> {
    let name = &field.name;
    if name.is_empty() || name.len() > FIELD_NAME_LEN {
        return Err(ShapefileError::invalid_field(name, "name must be 1 to 10 bytes"));
    }
    if !name.is_ascii() || name.contains('\0') {
        return Err(ShapefileError::invalid_field(name, "name must be ASCII"));
    }
    if field.width == 0 {
        return Err(ShapefileError::invalid_field(name, "width must be positive"));
    }

    match field.field_type {
        FieldType::Numeric | FieldType::Float => {
            if field.decimals > 0 && field.decimals as usize + 2 > field.width as usize {
                return Err(ShapefileError::invalid_field(name, "too many decimals for width"));
            }
        }
        FieldType::Logical if field.width != 1 => {
            return Err(ShapefileError::invalid_field(name, "logical fields have width 1"));
        }
        FieldType::Date if field.width != 8 => {
            return Err(ShapefileError::invalid_field(name, "date fields have width 8"));
        }
        _ => {}
    }
    Ok(())
}

/// Accumule les enregistrements d'une table en mémoire
#[derive(Debug)]
pub(crate) struct DbfBuffer {
    fields: Vec<FieldDef>,
    code_page: CodePage,
    records: BytesMut,
    count: u32,
    record_len: usize,
}

impl DbfBuffer {
    pub(crate) fn new(fields: Vec<FieldDef>, code_page: CodePage) -> Result<Self, ShapefileError> {
        for field in &fields {
            validate_field(field)?;
        }
        let record_len = 1 + fields.iter().map(|f| f.width as usize).sum::<usize>();
        if record_len > u16::MAX as usize {
            return Err(ShapefileError::TooLarge(format!(
                "record length {} exceeds 65535 bytes",
                record_len
            )));
        }
        Ok(Self {
            fields,
            code_page,
            records: BytesMut::new(),
            count: 0,
            record_len,
        })
    }

    pub(crate) fn records(&self) -> usize {
        self.count as usize
    }

    /// Encode un enregistrement sans l'ajouter (permet de valider avant d'écrire la shape)
    pub(crate) fn encode_record(&self, values: &[FieldValue]) -> Result<Vec<u8>, ShapefileError> {
        if values.len() != self.fields.len() {
            return Err(ShapefileError::RecordArity {
                expected: self.fields.len(),
                found: values.len(),
            });
        }

        let mut record = Vec::with_capacity(self.record_len);
        // Marqueur "non supprimé"
        record.push(b' ');
        for (field, value) in self.fields.iter().zip(values) {
            record.extend_from_slice(&self.encode_value(field, value)?);
        }
        debug_assert_eq!(record.len(), self.record_len);
        Ok(record)
    }

    pub(crate) fn append(&mut self, record: &[u8]) {
        self.records.extend_from_slice(record);
        self.count += 1;
    }

    fn encode_value(&self, field: &FieldDef, value: &FieldValue) -> Result<Vec<u8>, ShapefileError> {
        let width = field.width as usize;

        let encoded = match (field.field_type, value) {
            (FieldType::Character, FieldValue::Null) => vec![b' '; width],
            (FieldType::Character, FieldValue::Text(text)) => {
                pad_right(self.code_page.encode_truncated(text, width), width)
            }
            (FieldType::Character, FieldValue::Integer(v)) => {
                pad_right(self.code_page.encode_truncated(&v.to_string(), width), width)
            }
            (FieldType::Character, FieldValue::Double(v)) => {
                pad_right(self.code_page.encode_truncated(&v.to_string(), width), width)
            }

            // Valeur numérique absente: convention QGIS/pyshp
            (FieldType::Numeric | FieldType::Float, FieldValue::Null) => vec![b'*'; width],
            (FieldType::Numeric | FieldType::Float, FieldValue::Integer(v)) => {
                let text = if field.decimals > 0 {
                    format!("{:.*}", field.decimals as usize, *v as f64)
                } else {
                    v.to_string()
                };
                pad_numeric(field, text)?
            }
            (FieldType::Numeric | FieldType::Float, FieldValue::Double(v)) => {
                if !v.is_finite() {
                    return Err(ShapefileError::invalid_value(&field.name, "not a finite number"));
                }
                pad_numeric(field, format!("{:.*}", field.decimals as usize, v))?
            }

            (FieldType::Logical, FieldValue::Null) => vec![b'?'],
            (FieldType::Logical, FieldValue::Logical(b)) => vec![if *b { b'T' } else { b'F' }],

            (FieldType::Date, FieldValue::Null) => vec![b' '; 8],
            (FieldType::Date, FieldValue::Date(d)) => d.format("%Y%m%d").to_string().into_bytes(),

            (field_type, value) => {
                return Err(ShapefileError::invalid_value(
                    &field.name,
                    format!("{:?} cannot be stored in a {:?} field", value, field_type),
                ))
            }
        };

        Ok(encoded)
    }

    /// Produit le contenu du fichier .dbf
    pub(crate) fn finish(self, updated: NaiveDate) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let mut buf = BytesMut::with_capacity(header_len + self.records.len() + 1);

        buf.put_u8(VERSION);
        buf.put_u8((updated.year() - 1900).clamp(0, 255) as u8);
        buf.put_u8(updated.month() as u8);
        buf.put_u8(updated.day() as u8);
        buf.put_u32_le(self.count);
        buf.put_u16_le(header_len as u16);
        buf.put_u16_le(self.record_len as u16);
        buf.put_bytes(0, 17);
        buf.put_u8(self.code_page.ldid());
        buf.put_bytes(0, 2);

        for field in &self.fields {
            let mut name = [0u8; 11];
            name[..field.name.len()].copy_from_slice(field.name.as_bytes());
            buf.put_slice(&name);
            buf.put_u8(field.field_type.tag());
            buf.put_bytes(0, 4);
            buf.put_u8(field.width);
            buf.put_u8(field.decimals);
            buf.put_bytes(0, 14);
        }
        buf.put_u8(HEADER_TERMINATOR);

        buf.extend_from_slice(&self.records);
        buf.put_u8(END_OF_FILE);
        buf.to_vec()
    }
}

fn pad_right(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    bytes.resize(width, b' ');
    bytes
}

/// Aligne à droite; un nombre trop large est une erreur (on ne tronque pas les chiffres)
fn pad_numeric(field: &FieldDef, text: String) -> Result<Vec<u8>, ShapefileError> {
    let width = field.width as usize;
    if text.len() > width {
        return Err(ShapefileError::invalid_value(
            &field.name,
            format!("{} does not fit in width {}", text, width),
        ));
    }
    Ok(format!("{:>width$}", text, width = width).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<FieldDef> {
        vec![
            FieldDef::integer("obs_id", 18),
            FieldDef::character("species", 50),
            FieldDef::new("ratio", FieldType::Float, 8, 2),
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 8).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let mut dbf = DbfBuffer::new(schema(), CodePage::cp932()).unwrap();
        let record = dbf
            .encode_record(&[1.into(), "Hawk".into(), 0.5.into()])
            .unwrap();
        dbf.append(&record);
        let bytes = dbf.finish(date());

        assert_eq!(bytes[0], 0x03);
        assert_eq!(&bytes[1..4], &[125, 9, 8]);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
        let header_len = u16::from_le_bytes(bytes[8..10].try_into().unwrap()) as usize;
        assert_eq!(header_len, 32 + 3 * 32 + 1);
        let record_len = u16::from_le_bytes(bytes[10..12].try_into().unwrap()) as usize;
        assert_eq!(record_len, 1 + 18 + 50 + 8);
        assert_eq!(bytes[29], 0x13);
        assert_eq!(&bytes[32..38], b"obs_id");
        assert_eq!(bytes[32 + 11], b'N');
        assert_eq!(bytes[32 + 16], 18);
        assert_eq!(bytes[header_len - 1], 0x0D);
        assert_eq!(bytes.len(), header_len + record_len + 1);
        assert_eq!(*bytes.last().unwrap(), 0x1A);
    }

    #[test]
    fn test_value_formatting() {
        let dbf = DbfBuffer::new(schema(), CodePage::utf8()).unwrap();
        let record = dbf
            .encode_record(&[42.into(), "Hawk".into(), 1.234.into()])
            .unwrap();

        assert_eq!(record[0], b' ');
        assert_eq!(&record[1..19], format!("{:>18}", 42).as_bytes());
        assert_eq!(&record[19..23], b"Hawk");
        assert!(record[23..69].iter().all(|&b| b == b' '));
        assert_eq!(&record[69..77], b"    1.23");
    }

    #[test]
    fn test_text_truncated_not_rejected() {
        let dbf = DbfBuffer::new(schema(), CodePage::cp932()).unwrap();
        let species = "x".repeat(60);
        let record = dbf
            .encode_record(&[1.into(), species.into(), FieldValue::Null])
            .unwrap();
        assert_eq!(&record[19..69], "x".repeat(50).as_bytes());
        assert_eq!(&record[69..77], b"********");
    }

    #[test]
    fn test_arity_mismatch() {
        let dbf = DbfBuffer::new(schema(), CodePage::cp932()).unwrap();
        let err = dbf.encode_record(&[1.into()]).unwrap_err();
        assert!(matches!(
            err,
            ShapefileError::RecordArity {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let dbf = DbfBuffer::new(schema(), CodePage::cp932()).unwrap();
        let err = dbf
            .encode_record(&["oops".into(), "Hawk".into(), FieldValue::Null])
            .unwrap_err();
        assert!(matches!(err, ShapefileError::InvalidValue { .. }));
    }

    #[test]
    fn test_numeric_overflow() {
        let fields = vec![FieldDef::integer("count", 3)];
        let dbf = DbfBuffer::new(fields, CodePage::cp932()).unwrap();
        assert!(dbf.encode_record(&[999.into()]).is_ok());
        assert!(dbf.encode_record(&[1000.into()]).is_err());
    }

    #[test]
    fn test_invalid_field_names() {
        assert!(validate_field(&FieldDef::character("behavior_long", 10)).is_err());
        assert!(validate_field(&FieldDef::character("", 10)).is_err());
        assert!(validate_field(&FieldDef::character("種", 10)).is_err());
        assert!(validate_field(&FieldDef::character("behav", 0)).is_err());
        assert!(validate_field(&FieldDef::character("behav", 10)).is_ok());
    }
}

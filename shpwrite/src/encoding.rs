//! Code page de la table attributaire
//!
//! Le format dBASE stocke du texte brut: l'encodage est fixé par l'appelant
//! et annoncé aux lecteurs par l'octet LDID de l'en-tête et le fichier `.cpg`.

use encoding_rs::Encoding;

use crate::ShapefileError;

/// Encodage des champs texte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePage {
    encoding: &'static Encoding,
}

impl Default for CodePage {
    /// CP932 (Shift_JIS Microsoft), attendu par les logiciels SIG japonais
    fn default() -> Self {
        Self::cp932()
    }
}

impl CodePage {
    pub fn cp932() -> Self {
        Self {
            encoding: encoding_rs::SHIFT_JIS,
        }
    }

    pub fn utf8() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }

    /// Résout un libellé de code page ("CP932", "UTF-8", "cp1252", "EUC-JP"...)
    pub fn from_label(label: &str) -> Result<Self, ShapefileError> {
        let normalized = label.trim().to_ascii_lowercase();

        let encoding = match normalized.as_str() {
            "cp932" | "932" => Some(encoding_rs::SHIFT_JIS),
            "utf8" => Some(encoding_rs::UTF_8),
            _ => Encoding::for_label(normalized.as_bytes()).or_else(|| {
                // cpNNNN -> windows-NNNN
                normalized
                    .strip_prefix("cp")
                    .and_then(|code| Encoding::for_label(format!("windows-{}", code).as_bytes()))
            }),
        };

        match encoding {
            // Les encodages UTF-16 et "replacement" ne peuvent pas être produits par encoding_rs
            Some(encoding) if encoding.output_encoding() == encoding => Ok(Self { encoding }),
            _ => Err(ShapefileError::UnsupportedEncoding(label.to_string())),
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Libellé écrit dans le fichier `.cpg`
    pub fn cpg_label(&self) -> &'static str {
        if self.encoding == encoding_rs::SHIFT_JIS {
            "CP932"
        } else {
            self.encoding.name()
        }
    }

    /// Language driver ID (octet 29 de l'en-tête dBASE)
    pub fn ldid(&self) -> u8 {
        let encoding = self.encoding;
        if encoding == encoding_rs::SHIFT_JIS {
            0x13
        } else if encoding == encoding_rs::WINDOWS_1252 {
            0x57
        } else if encoding == encoding_rs::WINDOWS_1251 {
            0xC9
        } else if encoding == encoding_rs::GBK {
            0x4D
        } else if encoding == encoding_rs::EUC_KR {
            0x4F
        } else if encoding == encoding_rs::BIG5 {
            0x78
        } else {
            0x00
        }
    }

    /// Encode un texte
    ///
    /// Les caractères absents de la code page sont remplacés par une référence
    /// numérique (`&#NNNN;`), comme le fait encoding_rs.
    pub fn encode<'a>(&self, value: &'a str) -> std::borrow::Cow<'a, [u8]> {
        let (bytes, _, had_errors) = self.encoding.encode(value);
        if had_errors {
            tracing::debug!(
                encoding = self.encoding.name(),
                "Unmappable characters replaced while encoding attribute text"
            );
        }
        bytes
    }

    /// Encode un texte en le tronquant à `width` octets sans couper de caractère
    pub fn encode_truncated(&self, value: &str, width: usize) -> Vec<u8> {
        let encoded = self.encode(value);
        if encoded.len() <= width {
            return encoded.into_owned();
        }

        // Chaque caractère occupe au moins un octet: inutile d'aller au-delà de `width` caractères
        let candidate = match value.char_indices().nth(width) {
            Some((idx, _)) => &value[..idx],
            None => value,
        };

        let mut end = candidate.len();
        loop {
            let encoded = self.encode(&candidate[..end]);
            if encoded.len() <= width {
                return encoded.into_owned();
            }
            match candidate[..end].char_indices().next_back() {
                Some((idx, _)) => end = idx,
                None => return Vec::new(),
            }
        }
    }
}

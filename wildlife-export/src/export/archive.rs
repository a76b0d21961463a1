//! Assemblage des couches dans une archive ZIP

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;

/// Compresse les fichiers de `dir` (à plat, triés par nom) dans `writer`
///
/// Les sous-répertoires sont ignorés. Un répertoire vide donne une archive
/// vide valide. Les dates des entrées sont fixes: deux exports identiques
/// produisent les mêmes octets.
pub fn write_archive<W: Write + Seek>(dir: &Path, writer: W) -> Result<Vec<String>, ExportError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().into_string().map_err(|name| {
            ExportError::InvalidInput(format!("non UTF-8 file name: {:?}", name))
        })?;
        names.push(name);
    }
    names.sort();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    for name in &names {
        zip.start_file(name.as_str(), options)?;
        let mut file = File::open(dir.join(name))?;
        std::io::copy(&mut file, &mut zip)?;
    }

    zip.finish()?;
    debug!(entries = names.len(), "Archive assembled");

    Ok(names)
}

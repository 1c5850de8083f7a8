//! Orquestación de la extracción: stat, hashes, clasificación y extractor.

pub mod classifier;
pub mod descriptor;
pub mod export;
pub mod hashing;
pub mod normalize;
pub mod report;

use crate::error::ExtractionError;
use crate::extractors::extractor_for;
use crate::metadata::report::{
    ExtractionResult, FileReference, FormatSection, HashOutcome, MetadataReport,
};
use std::fs;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Construye el reporte completo de un archivo.
///
/// Solo un fallo al hacer `stat` sobre la ruta se propaga como error; a partir
/// de ahí cada etapa registra su propio fallo dentro del reporte.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn extract_metadata(path: &Path) -> Result<MetadataReport, ExtractionError> {
    let descriptor = descriptor::inspect(path)?;
    debug!(size = descriptor.size, "file stat completed");

    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    let hashes = match hashing::hash_file(path) {
        Ok(digests) => {
            debug!("digests computed");
            HashOutcome::Computed(digests)
        }
        Err(error) => {
            warn!(%error, "hashing failed");
            HashOutcome::Unavailable {
                error: error.to_string(),
            }
        }
    };

    let classification = classifier::classify(path);
    debug!(
        mime = classification.mime.as_deref().unwrap_or("none"),
        category = classification.category.label(),
        "file classified"
    );

    let result = match extractor_for(classification.category) {
        Some(extractor) => extractor.extract(path),
        None => ExtractionResult::failed(ExtractionError::UnsupportedFormat {
            mime: classification.mime.clone(),
        }),
    };

    let file = FileReference {
        name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: absolute,
        extension: path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default(),
        mime: classification.mime,
        category: classification.category,
        size: descriptor.size,
    };

    Ok(MetadataReport {
        file,
        descriptor,
        hashes,
        format: FormatSection {
            category: classification.category,
            result,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::report::FormatCategory;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_no_report() {
        let dir = tempdir().expect("tempdir");
        let error = extract_metadata(&dir.path().join("ghost.mp3")).expect_err("debe fallar");
        assert_eq!(error.kind(), ErrorKind::FileAccessError);
    }

    #[test]
    fn unknown_types_record_unsupported_format() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("bundle.zip");
        fs::write(&path, b"PK\x05\x06")?;

        let report = extract_metadata(&path)?;
        assert_eq!(report.format.category, FormatCategory::Unknown);
        assert_eq!(
            report.format.result.failure().map(|failure| failure.kind),
            Some(ErrorKind::UnsupportedFormatError)
        );
        assert!(report.hashes.digests().is_some());
        assert_eq!(report.file.extension, "zip");
        Ok(())
    }
}

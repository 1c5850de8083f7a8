//! Tipos de error compartidos por el pipeline de extracción.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Cannot access `{}`: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported file type ({})", mime.as_deref().unwrap_or("no MIME type"))]
    UnsupportedFormat { mime: Option<String> },

    #[error("Error extracting {extractor} metadata: {cause}")]
    ExtractorFailure {
        extractor: &'static str,
        cause: String,
    },

    #[error("{capability} is not available in this build ({extractor} metadata)")]
    DependencyUnavailable {
        extractor: &'static str,
        capability: &'static str,
    },
}

impl ExtractionError {
    pub fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub fn failure(extractor: &'static str, cause: impl ToString) -> Self {
        Self::ExtractorFailure {
            extractor,
            cause: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileAccess { .. } => ErrorKind::FileAccessError,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormatError,
            Self::ExtractorFailure { .. } => ErrorKind::ExtractorFailure,
            Self::DependencyUnavailable { .. } => ErrorKind::DependencyUnavailable,
        }
    }
}

/// Categoría serializable de un error, tal como aparece dentro del reporte.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ErrorKind {
    FileAccessError,
    UnsupportedFormatError,
    ExtractorFailure,
    DependencyUnavailable,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not serialize the report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Could not write the report: {0}")]
    Io(#[from] io::Error),

    #[error("Could not build the PDF report: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Could not build the Excel report: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let error = ExtractionError::failure("document", "truncated header");
        assert_eq!(error.kind(), ErrorKind::ExtractorFailure);
        assert_eq!(
            error.to_string(),
            "Error extracting document metadata: truncated header"
        );

        let missing = ExtractionError::file_access(
            "/nope",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(missing.kind(), ErrorKind::FileAccessError);
    }
}

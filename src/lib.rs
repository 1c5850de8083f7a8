//! Extracción de metadata de archivos individuales: atributos del sistema de
//! archivos, hashes y metadata específica del formato, unificados en un
//! [`MetadataReport`](metadata::report::MetadataReport).

pub mod error;
pub mod extractors;
pub mod formatting;
pub mod metadata;
pub mod server;

pub use error::{ErrorKind, ExportError, ExtractionError};
pub use metadata::extract_metadata;
pub use metadata::report::{ExtractionResult, FormatCategory, MetadataReport};

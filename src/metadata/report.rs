//! Modelos compartidos para reportar metadata de manera consistente.

use crate::error::{ErrorKind, ExtractionError};
use crate::formatting::UNAVAILABLE;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Valor usado cuando un campo esperado no está presente en el archivo.
pub const UNKNOWN: &str = "Unknown";

pub type MetadataMap = BTreeMap<String, MetadataValue>;

/// Valor heterogéneo de un campo de metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetadataValue>),
    Map(MetadataMap),
}

impl MetadataValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetadataMap> {
        match self {
            MetadataValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Boolean(value) => write!(f, "{value}"),
            MetadataValue::Integer(value) => write!(f, "{value}"),
            MetadataValue::Float(value) => write!(f, "{value}"),
            MetadataValue::Text(value) => f.write_str(value),
            MetadataValue::List(values) => {
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
            MetadataValue::Map(map) => {
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Boolean(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<u32> for MetadataValue {
    fn from(value: u32) -> Self {
        MetadataValue::Integer(i64::from(value))
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        MetadataValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<MetadataMap> for MetadataValue {
    fn from(value: MetadataMap) -> Self {
        MetadataValue::Map(value)
    }
}

impl From<Vec<MetadataValue>> for MetadataValue {
    fn from(value: Vec<MetadataValue>) -> Self {
        MetadataValue::List(value)
    }
}

/// Inserta `value` o el marcador [`UNKNOWN`] cuando no hay dato.
pub fn insert_or_unknown(map: &mut MetadataMap, key: &str, value: Option<String>) {
    let value = value
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());
    map.insert(key.to_string(), MetadataValue::Text(value));
}

/// Categorías cerradas que seleccionan el extractor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum FormatCategory {
    Image,
    Audio,
    Video,
    Document,
    Web,
    Unknown,
}

impl FormatCategory {
    /// Título de la sección del reporte asociada a la categoría.
    pub fn section_title(self) -> &'static str {
        match self {
            FormatCategory::Image => "Image Metadata",
            FormatCategory::Audio => "Audio Metadata",
            FormatCategory::Video => "Video Metadata",
            FormatCategory::Document => "Document Metadata",
            FormatCategory::Web => "Web Metadata",
            FormatCategory::Unknown => "File Type",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatCategory::Image => "Image",
            FormatCategory::Audio => "Audio",
            FormatCategory::Video => "Video",
            FormatCategory::Document => "Document",
            FormatCategory::Web => "Web",
            FormatCategory::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExtractionFailure {
    #[serde(rename = "error")]
    pub cause: String,
    pub kind: ErrorKind,
}

impl From<ExtractionError> for ExtractionFailure {
    fn from(error: ExtractionError) -> Self {
        Self {
            kind: error.kind(),
            cause: error.to_string(),
        }
    }
}

/// Resultado de una invocación de extractor.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ExtractionResult {
    Metadata(MetadataMap),
    NotFound(String),
    Failed(ExtractionFailure),
}

impl ExtractionResult {
    pub fn failed(error: ExtractionError) -> Self {
        ExtractionResult::Failed(error.into())
    }

    pub fn fields(&self) -> Option<&MetadataMap> {
        match self {
            ExtractionResult::Metadata(map) => Some(map),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            ExtractionResult::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Identidad inmutable del archivo analizado.
#[derive(Clone, Debug, Serialize)]
pub struct FileReference {
    #[serde(rename = "File Name")]
    pub name: String,
    #[serde(rename = "File Path")]
    pub path: PathBuf,
    #[serde(rename = "Extension")]
    pub extension: String,
    #[serde(rename = "MIME Type")]
    pub mime: Option<String>,
    #[serde(rename = "Category")]
    pub category: FormatCategory,
    #[serde(rename = "Size (bytes)")]
    pub size: u64,
}

/// Atributos del sistema de archivos obtenidos con `stat`.
#[derive(Clone, Debug, Serialize)]
pub struct FileDescriptor {
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Size (human)")]
    pub size_label: String,
    #[serde(rename = "Created")]
    pub created: String,
    #[serde(rename = "Modified")]
    pub modified: String,
    #[serde(rename = "Accessed")]
    pub accessed: String,
    #[serde(rename = "Read Only")]
    pub read_only: bool,
    #[serde(rename = "Detected Type", skip_serializing_if = "Option::is_none")]
    pub detected_type: Option<String>,
    #[serde(rename = "Permissions", skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(rename = "Permissions (rwx)", skip_serializing_if = "Option::is_none")]
    pub permissions_rwx: Option<String>,
    #[serde(rename = "Owner UID", skip_serializing_if = "Option::is_none")]
    pub owner_uid: Option<u32>,
    #[serde(rename = "Group GID", skip_serializing_if = "Option::is_none")]
    pub group_gid: Option<u32>,
    #[serde(rename = "Owner", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "Group", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HashDigestSet {
    #[serde(rename = "MD5")]
    pub md5: String,
    #[serde(rename = "SHA-1")]
    pub sha1: String,
    #[serde(rename = "SHA-256")]
    pub sha256: String,
}

/// Resultado del cálculo de hashes. Si la lectura falla, los tres digests se
/// reportan juntos como no disponibles junto al error.
#[derive(Clone, Debug)]
pub enum HashOutcome {
    Computed(HashDigestSet),
    Unavailable { error: String },
}

impl Serialize for HashOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HashOutcome::Computed(digests) => digests.serialize(serializer),
            HashOutcome::Unavailable { error } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("MD5", UNAVAILABLE)?;
                map.serialize_entry("SHA-1", UNAVAILABLE)?;
                map.serialize_entry("SHA-256", UNAVAILABLE)?;
                map.serialize_entry("Error", error)?;
                map.end()
            }
        }
    }
}

impl HashOutcome {
    pub fn digests(&self) -> Option<&HashDigestSet> {
        match self {
            HashOutcome::Computed(digests) => Some(digests),
            HashOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FormatSection {
    pub category: FormatCategory,
    pub result: ExtractionResult,
}

/// Reporte agregado de una extracción completa.
#[derive(Clone, Debug)]
pub struct MetadataReport {
    pub file: FileReference,
    pub descriptor: FileDescriptor,
    pub hashes: HashOutcome,
    pub format: FormatSection,
}

pub const FILE_KEY: &str = "File";
pub const DETAILS_KEY: &str = "File Details";
pub const HASHES_KEY: &str = "File Hashes";

impl Serialize for MetadataReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(FILE_KEY, &self.file)?;
        map.serialize_entry(DETAILS_KEY, &self.descriptor)?;
        map.serialize_entry(HASHES_KEY, &self.hashes)?;
        map.serialize_entry(self.format.category.section_title(), &self.format.result)?;
        map.end()
    }
}

//! Clasificación del archivo a partir del MIME derivado de su extensión.

use crate::metadata::report::FormatCategory;
use std::path::Path;

pub const WORD_DOC_MIME: &str = "application/msword";
pub const WORD_DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    pub mime: Option<String>,
    pub category: FormatCategory,
}

pub fn classify(path: &Path) -> Classification {
    let mime = mime_from_extension(path);
    let category = mime
        .as_deref()
        .map(category_for_mime)
        .unwrap_or(FormatCategory::Unknown);
    Classification { mime, category }
}

/// Tabla estática extensión → MIME; no inspecciona el contenido.
pub fn mime_from_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    mime_guess::from_ext(&extension)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

pub fn category_for_mime(mime: &str) -> FormatCategory {
    match mime {
        _ if mime.starts_with("image/") => FormatCategory::Image,
        _ if mime.starts_with("video/") => FormatCategory::Video,
        "audio/mpeg" => FormatCategory::Audio,
        "application/pdf" | WORD_DOC_MIME | WORD_DOCX_MIME => FormatCategory::Document,
        "text/html" => FormatCategory::Web,
        _ => FormatCategory::Unknown,
    }
}

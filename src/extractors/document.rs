//! Documentos: diccionario Info de PDFs y propiedades de paquetes DOCX.

use super::Extractor;
use crate::error::ExtractionError;
use crate::metadata::classifier::{WORD_DOC_MIME, WORD_DOCX_MIME, mime_from_extension};
use crate::metadata::report::ExtractionResult;
use std::path::Path;

const NAME: &str = "document";

pub struct DocumentExtractor;

impl Extractor for DocumentExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let mime = mime_from_extension(path);
        match mime.as_deref() {
            Some("application/pdf") => pdf::read_pdf_metadata(path).map(ExtractionResult::Metadata),
            Some(WORD_DOCX_MIME) => read_docx(path),
            Some(WORD_DOC_MIME) => Err(ExtractionError::DependencyUnavailable {
                extractor: NAME,
                capability: "legacy Word (OLE2) reader",
            }),
            _ => Err(ExtractionError::UnsupportedFormat { mime }),
        }
    }
}

#[cfg(feature = "office")]
fn read_docx(path: &Path) -> Result<ExtractionResult, ExtractionError> {
    office::read_docx_metadata(path).map(ExtractionResult::Metadata)
}

#[cfg(not(feature = "office"))]
fn read_docx(_path: &Path) -> Result<ExtractionResult, ExtractionError> {
    Err(ExtractionError::DependencyUnavailable {
        extractor: NAME,
        capability: "Office package reader",
    })
}

mod pdf {
    use super::NAME;
    use crate::error::ExtractionError;
    use crate::metadata::report::{MetadataMap, MetadataValue, insert_or_unknown};
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use lopdf::{Dictionary, Document, Object};
    use std::path::Path;

    /// Claves con columna propia; el resto del diccionario va a `Document Info`.
    const PROMOTED_KEYS: [(&[u8], &str); 4] = [
        (b"Title", "Title"),
        (b"Author", "Author"),
        (b"CreationDate", "Creation Date"),
        (b"ModDate", "Modification Date"),
    ];

    pub fn read_pdf_metadata(path: &Path) -> Result<MetadataMap, ExtractionError> {
        let doc = Document::load(path).map_err(|error| ExtractionError::failure(NAME, error))?;

        let mut metadata = MetadataMap::new();
        let info = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| deref_dictionary(&doc, info));

        for (key, label) in PROMOTED_KEYS {
            let value = info
                .and_then(|dict| dict.get(key).ok())
                .and_then(|object| object_to_string(&doc, object))
                .map(|value| {
                    if key.ends_with(b"Date") {
                        parse_pdf_date(&value).unwrap_or(value)
                    } else {
                        value
                    }
                });
            insert_or_unknown(&mut metadata, label, value);
        }

        metadata.insert(
            "Page Count".into(),
            MetadataValue::from(doc.get_pages().len()),
        );

        if let Some(dict) = info {
            let mut extra = MetadataMap::new();
            for (key, object) in dict.iter() {
                if PROMOTED_KEYS.iter().any(|(promoted, _)| *promoted == key.as_slice()) {
                    continue;
                }
                if let Some(value) = object_to_string(&doc, object) {
                    let value = if key.ends_with(b"Date") {
                        parse_pdf_date(&value).unwrap_or(value)
                    } else {
                        value
                    };
                    extra.insert(String::from_utf8_lossy(key).into_owned(), MetadataValue::from(value));
                }
            }
            if !extra.is_empty() {
                metadata.insert("Document Info".into(), MetadataValue::Map(extra));
            }
        }

        Ok(metadata)
    }

    fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn object_to_string(doc: &Document, obj: &Object) -> Option<String> {
        let text = match obj {
            Object::String(bytes, _) => decode_text_string(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            Object::Integer(value) => value.to_string(),
            Object::Real(value) => value.to_string(),
            Object::Boolean(value) => value.to_string(),
            Object::Reference(reference) => {
                return doc
                    .get_object(*reference)
                    .ok()
                    .and_then(|inner| object_to_string(doc, inner));
            }
            _ => return None,
        };
        let text = text.trim_matches(char::from(0)).trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// Cadenas de texto PDF: UTF-16BE con BOM o bytes de un solo octeto.
    pub fn decode_text_string(bytes: &[u8]) -> String {
        match bytes {
            [0xFE, 0xFF, rest @ ..] => {
                let units: Vec<u16> = rest
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
            _ => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => bytes.iter().map(|b| char::from(*b)).collect(),
            },
        }
    }

    /// `D:YYYYMMDDHHmmSSOHH'mm'` a ISO-8601; los componentes finales son opcionales.
    pub fn parse_pdf_date(raw: &str) -> Option<String> {
        let value = raw.trim().strip_prefix("D:").unwrap_or(raw.trim());
        let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
        if digits.len() < 4 {
            return None;
        }
        let field = |start: usize, len: usize, default: u32| -> Option<u32> {
            match digits.get(start..start + len) {
                Some(part) => part.parse().ok(),
                None => Some(default),
            }
        };
        let year = i32::try_from(field(0, 4, 0)?).ok()?;
        let month = field(4, 2, 1)?;
        let day = field(6, 2, 1)?;
        let hour = field(8, 2, 0)?;
        let minute = field(10, 2, 0)?;
        let second = field(12, 2, 0)?;
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

        let rest = &value[digits.len()..];
        let offset_seconds = match rest.chars().next() {
            Some(sign @ ('+' | '-')) => {
                let tz: String = rest[1..].chars().filter(char::is_ascii_digit).collect();
                let hours: i32 = tz.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
                let minutes: i32 = tz.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
                let total = hours * 3600 + minutes * 60;
                if sign == '-' { -total } else { total }
            }
            _ => 0,
        };
        let offset = FixedOffset::east_opt(offset_seconds)?;
        let moment = offset.from_local_datetime(&naive).single()?;
        Some(moment.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
    }
}

#[cfg(feature = "office")]
mod office {
    use super::NAME;
    use crate::error::ExtractionError;
    use crate::metadata::report::{MetadataMap, MetadataValue, insert_or_unknown};
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;
    use xmltree::{Element, XMLNode};
    use zip::ZipArchive;

    pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
    pub const CP_NS: &str =
        "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
    pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
    pub const APP_NS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

    struct FieldSpec {
        label: &'static str,
        local_name: &'static str,
        namespace: &'static str,
        /// Se reporta `Unknown` cuando falta.
        required: bool,
    }

    const CORE_FIELDS: [FieldSpec; 9] = [
        FieldSpec {
            label: "Author",
            local_name: "creator",
            namespace: DC_NS,
            required: true,
        },
        FieldSpec {
            label: "Title",
            local_name: "title",
            namespace: DC_NS,
            required: true,
        },
        FieldSpec {
            label: "Subject",
            local_name: "subject",
            namespace: DC_NS,
            required: true,
        },
        FieldSpec {
            label: "Keywords",
            local_name: "keywords",
            namespace: CP_NS,
            required: true,
        },
        FieldSpec {
            label: "Revision",
            local_name: "revision",
            namespace: CP_NS,
            required: true,
        },
        FieldSpec {
            label: "Last Modified By",
            local_name: "lastModifiedBy",
            namespace: CP_NS,
            required: false,
        },
        FieldSpec {
            label: "Created",
            local_name: "created",
            namespace: DCTERMS_NS,
            required: false,
        },
        FieldSpec {
            label: "Modified",
            local_name: "modified",
            namespace: DCTERMS_NS,
            required: false,
        },
        FieldSpec {
            label: "Category",
            local_name: "category",
            namespace: CP_NS,
            required: false,
        },
    ];

    const APP_FIELDS: [FieldSpec; 4] = [
        FieldSpec {
            label: "Software",
            local_name: "Application",
            namespace: APP_NS,
            required: false,
        },
        FieldSpec {
            label: "Company",
            local_name: "Company",
            namespace: APP_NS,
            required: false,
        },
        FieldSpec {
            label: "Pages",
            local_name: "Pages",
            namespace: APP_NS,
            required: false,
        },
        FieldSpec {
            label: "Words",
            local_name: "Words",
            namespace: APP_NS,
            required: false,
        },
    ];

    pub fn read_docx_metadata(path: &Path) -> Result<MetadataMap, ExtractionError> {
        let file = File::open(path).map_err(|error| ExtractionError::file_access(path, error))?;
        let mut archive =
            ZipArchive::new(file).map_err(|error| ExtractionError::failure(NAME, error))?;

        let core = read_part(&mut archive, "docProps/core.xml")?;
        let app = read_part(&mut archive, "docProps/app.xml")?;
        let custom = read_part(&mut archive, "docProps/custom.xml")?;

        let mut metadata = MetadataMap::new();
        extract_fields(core.as_ref(), &CORE_FIELDS, &mut metadata);
        extract_fields(app.as_ref(), &APP_FIELDS, &mut metadata);

        if let Some(root) = custom {
            let custom_props = extract_custom_properties(&root);
            if !custom_props.is_empty() {
                metadata.insert("Custom Properties".into(), MetadataValue::Map(custom_props));
            }
        }

        Ok(metadata)
    }

    /// Parte XML del paquete; `None` si no existe, error si está corrupta.
    fn read_part(
        archive: &mut ZipArchive<File>,
        name: &str,
    ) -> Result<Option<Element>, ExtractionError> {
        let mut part = match archive.by_name(name) {
            Ok(part) => part,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(error) => return Err(ExtractionError::failure(NAME, error)),
        };
        let mut contents = String::new();
        part.read_to_string(&mut contents)
            .map_err(|error| ExtractionError::failure(NAME, error))?;
        Element::parse(contents.as_bytes())
            .map(Some)
            .map_err(|error| ExtractionError::failure(NAME, format!("{name}: {error}")))
    }

    fn extract_fields(root: Option<&Element>, fields: &[FieldSpec], metadata: &mut MetadataMap) {
        for field in fields {
            let value = root.and_then(|root| find_child_text(root, field.local_name, field.namespace));
            if field.required {
                insert_or_unknown(metadata, field.label, value);
            } else if let Some(value) = value.filter(|value| !value.is_empty()) {
                metadata.insert(field.label.into(), MetadataValue::from(value));
            }
        }
    }

    fn find_child_text(root: &Element, local_name: &str, namespace: &str) -> Option<String> {
        root.children.iter().find_map(|node| match node {
            XMLNode::Element(child)
                if child.name == local_name && child.namespace.as_deref() == Some(namespace) =>
            {
                Some(element_text_content(child))
            }
            _ => None,
        })
    }

    fn element_text_content(element: &Element) -> String {
        let mut content = String::new();
        for node in &element.children {
            if let XMLNode::Text(text) = node {
                content.push_str(text);
            }
        }
        content.trim().to_string()
    }

    fn extract_custom_properties(root: &Element) -> MetadataMap {
        let mut props = MetadataMap::new();
        for node in &root.children {
            let XMLNode::Element(child) = node else {
                continue;
            };
            if child.name != "property" {
                continue;
            }
            let name = match child.attributes.get("name") {
                Some(name) if !name.trim().is_empty() => name.to_string(),
                _ => continue,
            };
            let value = child
                .children
                .iter()
                .find_map(|node| match node {
                    XMLNode::Element(value_node) => Some(element_text_content(value_node)),
                    _ => None,
                })
                .unwrap_or_default();
            props.insert(name, MetadataValue::from(value));
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::report::{MetadataValue, UNKNOWN};
    use lopdf::{Document, Object, dictionary};
    use std::fs;
    use tempfile::tempdir;

    fn write_pdf(path: &Path, info: Option<lopdf::Dictionary>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1_i64,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), 612_i64.into(), 792_i64.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }
        doc.save(path).expect("save pdf");
    }

    #[test]
    fn pdf_info_dictionary_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("paper.pdf");
        write_pdf(
            &path,
            Some(dictionary! {
                "Title" => Object::string_literal("Quarterly Report"),
                "Producer" => Object::string_literal("metascope tests"),
                "CreationDate" => Object::string_literal("D:20230115093000+01'00'"),
            }),
        );

        let result = DocumentExtractor.extract(&path);
        let fields = result.fields().expect("metadata");
        assert_eq!(fields["Title"], MetadataValue::from("Quarterly Report"));
        assert_eq!(fields["Author"], MetadataValue::from(UNKNOWN));
        assert_eq!(
            fields["Creation Date"],
            MetadataValue::from("2023-01-15T09:30:00+01:00")
        );
        assert_eq!(fields["Modification Date"], MetadataValue::from(UNKNOWN));
        assert_eq!(fields["Page Count"], MetadataValue::from(1_usize));
        let extra = fields["Document Info"].as_map().expect("info");
        assert_eq!(extra["Producer"], MetadataValue::from("metascope tests"));
    }

    #[test]
    fn pdf_without_info_reports_unknown_fields() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("bare.pdf");
        write_pdf(&path, None);

        let result = DocumentExtractor.extract(&path);
        let fields = result.fields().expect("metadata");
        for key in ["Title", "Author", "Creation Date", "Modification Date"] {
            assert_eq!(fields[key], MetadataValue::from(UNKNOWN), "{key}");
        }
        assert!(!fields.contains_key("Document Info"));
    }

    #[test]
    fn truncated_pdf_is_an_extractor_failure() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog").expect("write");

        let result = DocumentExtractor.extract(&path);
        assert_eq!(result.failure().map(|f| f.kind), Some(ErrorKind::ExtractorFailure));
    }

    #[test]
    fn legacy_word_is_dependency_unavailable() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("legacy.doc");
        fs::write(&path, [0xD0, 0xCF, 0x11, 0xE0]).expect("write");

        let result = DocumentExtractor.extract(&path);
        assert_eq!(
            result.failure().map(|f| f.kind),
            Some(ErrorKind::DependencyUnavailable)
        );
    }

    #[test]
    fn pdf_dates_and_strings_are_normalized() {
        assert_eq!(
            pdf::parse_pdf_date("D:20240229").as_deref(),
            Some("2024-02-29T00:00:00+00:00")
        );
        assert_eq!(
            pdf::parse_pdf_date("D:19991231235959-05'30'").as_deref(),
            Some("1999-12-31T23:59:59-05:30")
        );
        assert_eq!(pdf::parse_pdf_date("yesterday"), None);
        assert_eq!(
            pdf::decode_text_string(&[0xFE, 0xFF, 0x00, b'O', 0x00, b'K']),
            "OK"
        );
    }
}

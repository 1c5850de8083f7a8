//! Vistas planas del reporte: JSON para la web y tablas campo/valor para la CLI.

use crate::metadata::report::{DETAILS_KEY, FILE_KEY, HASHES_KEY, MetadataReport};
use serde_json::{Map, Value};

pub const BASIC_INFO_TITLE: &str = "Basic File Information";
pub const HASHES_TITLE: &str = "File Hashes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, field: impl Into<String>, value: String) {
        self.rows.push(ReportRow {
            field: field.into(),
            value,
        });
    }

    fn extend_from_object(&mut self, object: &Map<String, Value>) {
        for (key, value) in object {
            self.push(key.as_str(), format_value(value));
        }
    }
}

pub fn to_json(report: &MetadataReport) -> serde_json::Result<Value> {
    serde_json::to_value(report)
}

/// Tablas en orden: información básica, sección de formato y hashes.
pub fn report_tables(report: &MetadataReport) -> serde_json::Result<Vec<ReportTable>> {
    let json = to_json(report)?;

    let mut basic = ReportTable::new(BASIC_INFO_TITLE);
    for key in [FILE_KEY, DETAILS_KEY] {
        if let Some(object) = json.get(key).and_then(Value::as_object) {
            basic.extend_from_object(object);
        }
    }

    let section_title = report.format.category.section_title();
    let mut format = ReportTable::new(section_title);
    match json.get(section_title) {
        Some(Value::Object(object)) => format.extend_from_object(object),
        Some(Value::String(marker)) => format.push("Result", marker.clone()),
        Some(other) => format.push("Result", format_value(other)),
        None => {}
    }

    let mut hashes = ReportTable::new(HASHES_TITLE);
    if let Some(object) = json.get(HASHES_KEY).and_then(Value::as_object) {
        hashes.extend_from_object(object);
    }

    Ok(vec![basic, format, hashes])
}

/// Texto legible de un valor: mapas como líneas `clave: valor` con la
/// anidación sangrada, listas separadas por comas y sin llaves literales.
pub fn format_value(value: &Value) -> String {
    format_nested(value, 0)
}

fn format_nested(value: &Value, depth: usize) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.replace(['{', '}'], ""),
        Value::Array(items) => items
            .iter()
            .map(|item| format_nested(item, depth))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(object) => {
            let indent = "  ".repeat(depth);
            object
                .iter()
                .map(|(key, value)| match value {
                    Value::Object(inner) if !inner.is_empty() => {
                        format!("{indent}{key}:\n{}", format_nested(value, depth + 1))
                    }
                    _ => format!("{indent}{key}: {}", format_nested(value, depth + 1)),
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_maps_are_indented() {
        let value = json!({
            "Make": "Canon",
            "GPSInfo": { "Latitude": 40.5, "Longitude": -3.25 }
        });
        assert_eq!(
            format_value(&value),
            "Make: Canon\nGPSInfo:\n  Latitude: 40.5\n  Longitude: -3.25"
        );
    }

    #[test]
    fn scalars_and_lists_are_flattened() {
        assert_eq!(format_value(&json!([640, 480])), "640, 480");
        assert_eq!(format_value(&json!("{braced}")), "braced");
        assert_eq!(format_value(&Value::Null), "None");
        assert_eq!(format_value(&json!(true)), "true");
    }
}

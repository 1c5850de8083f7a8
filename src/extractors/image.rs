//! Metadata de imágenes: dimensiones y etiquetas EXIF con el GPS anidado.

use super::Extractor;
use crate::error::ExtractionError;
use crate::metadata::report::ExtractionResult;
use std::path::Path;

pub const NO_EXIF_DATA: &str = "No EXIF data found.";

const NAME: &str = "image";

pub struct ImageExtractor;

impl Extractor for ImageExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    #[cfg(feature = "image")]
    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let mut metadata = raster::read_properties(path)?;
        metadata.insert("EXIF".to_string(), tags::read_exif(path));
        Ok(ExtractionResult::Metadata(metadata))
    }

    #[cfg(not(feature = "image"))]
    fn read(&self, _path: &Path) -> Result<ExtractionResult, ExtractionError> {
        Err(ExtractionError::DependencyUnavailable {
            extractor: NAME,
            capability: "image decoder",
        })
    }
}

#[cfg(feature = "image")]
mod raster {
    use super::NAME;
    use crate::error::ExtractionError;
    use crate::metadata::report::{MetadataMap, MetadataValue};
    use ::image::{ImageDecoder, ImageReader};
    use std::path::Path;

    pub fn read_properties(path: &Path) -> Result<MetadataMap, ExtractionError> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|error| ExtractionError::file_access(path, error))?;
        let format = reader.format();
        let decoder = reader
            .into_decoder()
            .map_err(|error| ExtractionError::failure(NAME, error))?;

        let (width, height) = decoder.dimensions();
        let mut metadata = MetadataMap::new();
        metadata.insert("Width".into(), MetadataValue::from(width));
        metadata.insert("Height".into(), MetadataValue::from(height));
        metadata.insert(
            "Resolution".into(),
            MetadataValue::from(vec![
                MetadataValue::from(width),
                MetadataValue::from(height),
            ]),
        );
        metadata.insert(
            "Color Type".into(),
            MetadataValue::from(format!("{:?}", decoder.color_type())),
        );
        if let Some(format) = format {
            metadata.insert(
                "Format".into(),
                MetadataValue::from(format!("{format:?}").to_uppercase()),
            );
        }
        Ok(metadata)
    }
}

#[cfg(feature = "image")]
mod tags {
    use super::NO_EXIF_DATA;
    use crate::metadata::report::{MetadataMap, MetadataValue};
    use exif::{Context, Exif, In, Tag, Value};
    use std::fs::File;
    use std::io::BufReader;
    use std::path::Path;

    pub fn read_exif(path: &Path) -> MetadataValue {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) => return MetadataValue::from(format!("Unreadable EXIF data: {error}")),
        };
        let mut bufreader = BufReader::new(&file);
        match exif::Reader::new().read_from_container(&mut bufreader) {
            Ok(exif) => collect_fields(&exif),
            Err(exif::Error::NotFound(_)) => MetadataValue::from(NO_EXIF_DATA),
            Err(error) => MetadataValue::from(format!("Unreadable EXIF data: {error}")),
        }
    }

    fn collect_fields(exif: &Exif) -> MetadataValue {
        let mut fields = MetadataMap::new();
        let mut gps = MetadataMap::new();

        for field in exif.fields().filter(|field| field.ifd_num == In::PRIMARY) {
            let value = field.display_value().with_unit(exif).to_string();
            let value = MetadataValue::from(value.trim_matches('"').to_string());
            let name = field.tag.to_string();
            if field.tag.context() == Context::Gps {
                gps.insert(name, value);
            } else {
                fields.insert(name, value);
            }
        }

        if let Some(latitude) = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef) {
            gps.insert("Latitude".into(), MetadataValue::from(latitude));
        }
        if let Some(longitude) = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef) {
            gps.insert("Longitude".into(), MetadataValue::from(longitude));
        }
        if !gps.is_empty() {
            fields.insert("GPSInfo".into(), MetadataValue::Map(gps));
        }

        if fields.is_empty() {
            MetadataValue::from(NO_EXIF_DATA)
        } else {
            MetadataValue::Map(fields)
        }
    }

    /// Grados, minutos y segundos a grados decimales con signo.
    fn gps_coordinate(exif: &Exif, tag: Tag, reference: Tag) -> Option<f64> {
        let field = exif.get_field(tag, In::PRIMARY)?;
        let Value::Rational(ref parts) = field.value else {
            return None;
        };
        if parts.len() < 3 {
            return None;
        }
        let degrees = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
        let hemisphere = exif
            .get_field(reference, In::PRIMARY)
            .map(|field| field.display_value().to_string())
            .unwrap_or_default();
        let sign = if hemisphere.contains('S') || hemisphere.contains('W') {
            -1.0
        } else {
            1.0
        };
        Some((sign * degrees * 1_000_000.0).round() / 1_000_000.0)
    }
}

//! Metadata de páginas HTML: título, idioma, charset y etiquetas `<meta>`.

use super::Extractor;
use crate::error::ExtractionError;
use crate::metadata::report::ExtractionResult;
use std::path::Path;

const NAME: &str = "web";

pub struct WebExtractor;

impl Extractor for WebExtractor {
    fn name(&self) -> &'static str {
        NAME
    }

    #[cfg(feature = "html")]
    fn read(&self, path: &Path) -> Result<ExtractionResult, ExtractionError> {
        let bytes = std::fs::read(path).map_err(|error| ExtractionError::file_access(path, error))?;
        let html = String::from_utf8_lossy(&bytes);
        markup::read_html_metadata(&html).map(ExtractionResult::Metadata)
    }

    #[cfg(not(feature = "html"))]
    fn read(&self, _path: &Path) -> Result<ExtractionResult, ExtractionError> {
        Err(ExtractionError::DependencyUnavailable {
            extractor: NAME,
            capability: "HTML parser",
        })
    }
}

#[cfg(feature = "html")]
mod markup {
    use super::NAME;
    use crate::error::ExtractionError;
    use crate::metadata::report::{MetadataMap, MetadataValue, insert_or_unknown};
    use scraper::{Html, Selector};

    fn selector(css: &str) -> Result<Selector, ExtractionError> {
        Selector::parse(css).map_err(|error| ExtractionError::failure(NAME, error))
    }

    pub fn read_html_metadata(html: &str) -> Result<MetadataMap, ExtractionError> {
        let document = Html::parse_document(html);
        let mut metadata = MetadataMap::new();

        let title = document
            .select(&selector("title")?)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string());

        let language = document
            .select(&selector("html[lang]")?)
            .next()
            .and_then(|element| element.value().attr("lang"))
            .map(str::to_string);

        // Pares name/content en orden de documento: la última aparición gana.
        let mut meta_tags = MetadataMap::new();
        let mut generator = None;
        for element in document.select(&selector("meta[name][content]")?) {
            let (Some(name), Some(content)) =
                (element.value().attr("name"), element.value().attr("content"))
            else {
                continue;
            };
            if name.eq_ignore_ascii_case("generator") {
                generator = Some(content.to_string());
            }
            meta_tags.insert(name.to_string(), MetadataValue::from(content));
        }

        let mut meta_properties = MetadataMap::new();
        for element in document.select(&selector("meta[property][content]")?) {
            if let (Some(property), Some(content)) = (
                element.value().attr("property"),
                element.value().attr("content"),
            ) {
                meta_properties.insert(property.to_string(), MetadataValue::from(content));
            }
        }

        let charset = document
            .select(&selector("meta[charset]")?)
            .next()
            .and_then(|element| element.value().attr("charset"))
            .map(str::to_string)
            .or(document
                .select(&selector("meta[http-equiv][content]")?)
                .filter(|element| {
                    element
                        .value()
                        .attr("http-equiv")
                        .is_some_and(|value| value.eq_ignore_ascii_case("content-type"))
                })
                .find_map(|element| element.value().attr("content").and_then(charset_from_content_type)));

        insert_or_unknown(&mut metadata, "Title", title);
        insert_or_unknown(&mut metadata, "Generator", generator);
        insert_or_unknown(&mut metadata, "Language", language);
        insert_or_unknown(&mut metadata, "Charset", charset);
        metadata.insert("Meta Tags".into(), MetadataValue::Map(meta_tags));
        if !meta_properties.is_empty() {
            metadata.insert("Meta Properties".into(), MetadataValue::Map(meta_properties));
        }

        Ok(metadata)
    }

    fn charset_from_content_type(content: &str) -> Option<String> {
        content.split(';').find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches('"').to_string())
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::metadata::report::UNKNOWN;

        #[test]
        fn duplicate_meta_names_keep_the_last_value() -> Result<(), ExtractionError> {
            let html = r#"<html lang="es"><head>
                <meta charset="utf-8">
                <title> Portada </title>
                <meta name="description" content="first">
                <meta name="description" content="second">
                <meta name="generator" content="Hugo 0.120">
                <meta property="og:title" content="Portada OG">
            </head><body></body></html>"#;

            let metadata = read_html_metadata(html)?;
            let tags = metadata["Meta Tags"].as_map().expect("meta tags");
            assert_eq!(tags["description"], MetadataValue::from("second"));
            assert_eq!(metadata["Title"], MetadataValue::from("Portada"));
            assert_eq!(metadata["Generator"], MetadataValue::from("Hugo 0.120"));
            assert_eq!(metadata["Language"], MetadataValue::from("es"));
            assert_eq!(metadata["Charset"], MetadataValue::from("utf-8"));
            let properties = metadata["Meta Properties"].as_map().expect("properties");
            assert_eq!(properties["og:title"], MetadataValue::from("Portada OG"));
            Ok(())
        }

        #[test]
        fn bare_page_reports_unknown() -> Result<(), ExtractionError> {
            let metadata = read_html_metadata("<p>hola</p>")?;
            for key in ["Title", "Generator", "Language", "Charset"] {
                assert_eq!(metadata[key], MetadataValue::from(UNKNOWN), "{key}");
            }
            assert_eq!(metadata["Meta Tags"], MetadataValue::Map(MetadataMap::new()));
            Ok(())
        }

        #[test]
        fn charset_is_read_from_http_equiv() {
            assert_eq!(
                charset_from_content_type("text/html; charset=ISO-8859-1").as_deref(),
                Some("ISO-8859-1")
            );
            assert_eq!(charset_from_content_type("text/html"), None);
        }
    }
}

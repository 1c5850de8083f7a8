use metascope::extractors::{
    AudioExtractor, DocumentExtractor, Extractor, ImageExtractor, NO_EXIF_DATA, WebExtractor,
};
use metascope::metadata::report::{MetadataValue, UNKNOWN};
use metascope::{ErrorKind, ExtractionResult};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::tempdir;

fn make_zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let cursor = Cursor::new(Vec::<u8>::new());
    let mut writer = zip::ZipWriter::new(cursor);

    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(*name, options).expect("start zip file");
        writer.write_all(data.as_bytes()).expect("write zip data");
    }

    let cursor = writer.finish().expect("finish zip");
    cursor.into_inner()
}

fn make_mp3_bytes(title: &str) -> Vec<u8> {
    let mut frame = b"TIT2".to_vec();
    frame.extend_from_slice(&((title.len() + 1) as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0, 3]);
    frame.extend_from_slice(title.as_bytes());

    let mut data = b"ID3\x03\x00\x00\x00\x00\x00".to_vec();
    data.push(frame.len() as u8);
    data.extend_from_slice(&frame);
    data.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
    data.extend(std::iter::repeat_n(0_u8, 413 * 4));
    data
}

fn fields(result: &ExtractionResult) -> &metascope::metadata::report::MetadataMap {
    match result {
        ExtractionResult::Metadata(map) => map,
        other => panic!("expected metadata, got {other:?}"),
    }
}

fn write(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).expect("write fixture");
}

#[cfg(feature = "image")]
#[test]
fn jpeg_without_exif_reports_marker() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("photo.JPG");
    image::RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]))
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .expect("write jpeg");

    let result = ImageExtractor.extract(&path);
    let map = fields(&result);
    assert_eq!(map["Width"], MetadataValue::from(4_u32));
    assert_eq!(map["Height"], MetadataValue::from(3_u32));
    assert_eq!(map["Format"], MetadataValue::from("JPEG"));
    assert_eq!(map["EXIF"], MetadataValue::from(NO_EXIF_DATA));
}

#[cfg(feature = "image")]
fn make_jpeg_with_app1(app1_payload: &[u8]) -> Vec<u8> {
    let mut jpeg = Vec::new();
    image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]))
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .expect("encode jpeg");

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((app1_payload.len() + 8) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(app1_payload);

    // APP1 justo después del marcador SOI.
    [&jpeg[..2], &segment[..], &jpeg[2..]].concat()
}

#[cfg(feature = "image")]
#[test]
fn jpeg_exif_tags_nest_gps_with_signed_coordinates() {
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};

    let rational = |num: u32| Rational { num, denom: 1 };
    let make = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![b"Canon".to_vec()]),
    };
    let latitude = Field {
        tag: Tag::GPSLatitude,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![rational(40), rational(30), rational(0)]),
    };
    let latitude_ref = Field {
        tag: Tag::GPSLatitudeRef,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![b"S".to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&make);
    writer.push_field(&latitude);
    writer.push_field(&latitude_ref);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("write exif");

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("geotagged.jpg");
    write(&path, &make_jpeg_with_app1(&tiff.into_inner()));

    let result = ImageExtractor.extract(&path);
    let map = fields(&result);
    let exif = map["EXIF"].as_map().expect("exif map");
    assert_eq!(exif["Make"], MetadataValue::from("Canon"));
    assert!(!exif.contains_key("GPSLatitude"));

    let gps = exif["GPSInfo"].as_map().expect("gps map");
    assert!(gps.contains_key("GPSLatitude"));
    assert!(gps.contains_key("GPSLatitudeRef"));
    assert_eq!(gps["Latitude"], MetadataValue::from(-40.5));
    assert!(!gps.contains_key("Longitude"));
}

#[cfg(feature = "image")]
#[test]
fn malformed_exif_block_is_reported_as_unreadable() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("mangled.jpg");
    write(&path, &make_jpeg_with_app1(b"XX\0\0not a tiff header"));

    let result = ImageExtractor.extract(&path);
    let map = fields(&result);
    assert!(
        map["EXIF"]
            .as_text()
            .is_some_and(|text| text.starts_with("Unreadable EXIF data"))
    );
    assert_eq!(map["Width"], MetadataValue::from(2_u32));
}

#[test]
fn undecodable_image_is_an_extractor_failure() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.png");
    write(&path, b"\x89PNG\r\n\x1a\nnot really");

    let result = ImageExtractor.extract(&path);
    let failure = result.failure().expect("failure");
    assert!(matches!(
        failure.kind,
        ErrorKind::ExtractorFailure | ErrorKind::DependencyUnavailable
    ));
}

#[test]
fn mp3_without_artist_reports_unknown() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("track.mp3");
    write(&path, &make_mp3_bytes("Demo Take"));

    let result = AudioExtractor.extract(&path);
    let map = fields(&result);
    assert_eq!(map["Title"], MetadataValue::from("Demo Take"));
    assert_eq!(map["Artist"], MetadataValue::from(UNKNOWN));
    assert_eq!(map["Sample Rate"], MetadataValue::from(44_100_u32));
    assert_eq!(map["MPEG Version"], MetadataValue::from("MPEG1"));
    assert_eq!(map["Layer"], MetadataValue::from("Layer III"));
}

#[cfg(feature = "office")]
#[test]
fn docx_core_app_and_custom_properties_are_read() {
    let core = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>Budget 2024</dc:title>
  <dc:creator>Ada Lovelace</dc:creator>
  <cp:lastModifiedBy>Charles Babbage</cp:lastModifiedBy>
  <cp:revision>7</cp:revision>
  <dcterms:created xsi:type="dcterms:W3CDTF">2024-01-02T03:04:05Z</dcterms:created>
</cp:coreProperties>"#;
    let app = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Application>Microsoft Office Word</Application>
  <Pages>3</Pages>
  <Words>512</Words>
</Properties>"#;
    let custom = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Department"><vt:lpwstr>Finance</vt:lpwstr></property>
</Properties>"#;

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("budget.docx");
    write(
        &path,
        &make_zip_bytes(&[
            ("docProps/core.xml", core),
            ("docProps/app.xml", app),
            ("docProps/custom.xml", custom),
            ("word/document.xml", "<w:document/>"),
        ]),
    );

    let result = DocumentExtractor.extract(&path);
    let map = fields(&result);
    assert_eq!(map["Author"], MetadataValue::from("Ada Lovelace"));
    assert_eq!(map["Title"], MetadataValue::from("Budget 2024"));
    assert_eq!(map["Revision"], MetadataValue::from("7"));
    assert_eq!(map["Subject"], MetadataValue::from(UNKNOWN));
    assert_eq!(map["Keywords"], MetadataValue::from(UNKNOWN));
    assert_eq!(map["Last Modified By"], MetadataValue::from("Charles Babbage"));
    assert_eq!(map["Created"], MetadataValue::from("2024-01-02T03:04:05Z"));
    assert_eq!(map["Software"], MetadataValue::from("Microsoft Office Word"));
    assert_eq!(map["Words"], MetadataValue::from("512"));
    let custom = map["Custom Properties"].as_map().expect("custom properties");
    assert_eq!(custom["Department"], MetadataValue::from("Finance"));
}

#[cfg(feature = "office")]
#[test]
fn docx_without_core_properties_reports_unknown() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("empty.docx");
    write(&path, &make_zip_bytes(&[("word/document.xml", "<w:document/>")]));

    let result = DocumentExtractor.extract(&path);
    let map = fields(&result);
    for key in ["Author", "Title", "Subject", "Keywords", "Revision"] {
        assert_eq!(map[key], MetadataValue::from(UNKNOWN), "{key}");
    }
}

#[test]
fn corrupt_docx_is_an_extractor_failure() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("corrupt.docx");
    write(&path, b"PK\x03\x04 this is not a complete archive");

    let result = DocumentExtractor.extract(&path);
    let failure = result.failure().expect("failure");
    assert!(matches!(
        failure.kind,
        ErrorKind::ExtractorFailure | ErrorKind::DependencyUnavailable
    ));
}

#[cfg(feature = "html")]
#[test]
fn html_meta_collisions_keep_the_last_value() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("index.htm");
    write(
        &path,
        br#"<!doctype html><html><head>
            <meta name="author" content="first">
            <meta name="author" content="last">
        </head></html>"#,
    );

    let result = WebExtractor.extract(&path);
    let map = fields(&result);
    let tags = map["Meta Tags"].as_map().expect("meta tags");
    assert_eq!(tags["author"], MetadataValue::from("last"));
    assert_eq!(map["Title"], MetadataValue::from(UNKNOWN));
}

use metascope::metadata::normalize::{BASIC_INFO_TITLE, HASHES_TITLE, report_tables, to_json};
use metascope::{ErrorKind, FormatCategory, extract_metadata};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[test]
fn report_always_has_size_timestamps_and_digests() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("notes.txt");
    fs::write(&path, b"metascope")?;

    let json = to_json(&extract_metadata(&path)?)?;
    let details = &json["File Details"];
    assert_eq!(details["Size"], 9);
    for key in ["Created", "Modified", "Accessed"] {
        assert!(details[key].is_string(), "{key}");
    }
    for key in ["MD5", "SHA-1", "SHA-256"] {
        assert!(json["File Hashes"][key].is_string(), "{key}");
    }
    assert_eq!(json["File Type"]["kind"], "UnsupportedFormatError");
    Ok(())
}

#[cfg(target_os = "linux")]
#[test]
fn unreadable_content_reports_all_digests_unavailable() -> Result<(), Box<dyn std::error::Error>> {
    // stat funciona pero la lectura secuencial falla con EIO.
    let report = extract_metadata(Path::new("/proc/self/mem"))?;
    assert!(report.hashes.digests().is_none());

    let json = to_json(&report)?;
    for key in ["MD5", "SHA-1", "SHA-256"] {
        assert_eq!(json["File Hashes"][key], "Unavailable", "{key}");
    }
    assert!(json["File Hashes"]["Error"].is_string());
    assert!(json["File Details"]["Size"].is_u64());
    Ok(())
}

#[test]
fn digests_are_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("same.bin");
    fs::write(&path, b"identical bytes")?;

    let first = extract_metadata(&path)?;
    let second = extract_metadata(&path)?;
    assert_eq!(first.hashes.digests(), second.hashes.digests());
    Ok(())
}

#[test]
fn zero_byte_file_uses_empty_input_digests() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("empty.mp3");
    fs::write(&path, b"")?;

    let report = extract_metadata(&path)?;
    assert_eq!(report.descriptor.size, 0);
    assert_eq!(report.format.category, FormatCategory::Audio);
    let digests = report.hashes.digests().expect("digests");
    assert_eq!(digests.md5, EMPTY_MD5);
    assert_eq!(digests.sha1, EMPTY_SHA1);
    assert_eq!(digests.sha256, EMPTY_SHA256);
    assert_eq!(
        report.format.result.failure().map(|failure| failure.kind),
        Some(ErrorKind::ExtractorFailure)
    );
    Ok(())
}

#[test]
fn truncated_pdf_keeps_hash_and_size() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("truncated.pdf");
    let bytes = b"%PDF-1.7\n1 0 obj\n<< /Type /Cat";
    fs::write(&path, bytes)?;

    let json = to_json(&extract_metadata(&path)?)?;
    assert_eq!(json["Document Metadata"]["kind"], "ExtractorFailure");
    assert!(
        json["Document Metadata"]["error"]
            .as_str()
            .is_some_and(|cause| cause.starts_with("Error extracting document metadata"))
    );
    assert_eq!(json["File Details"]["Size"], bytes.len());
    assert!(json["File Hashes"]["SHA-256"].is_string());
    Ok(())
}

#[test]
fn json_round_trip_preserves_keys_and_scalars() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("index.html");
    fs::write(&path, "<html><head><title>Round trip</title></head></html>")?;

    let report = extract_metadata(&path)?;
    let original = to_json(&report)?;
    let reparsed: Value = serde_json::from_str(&serde_json::to_string(&report)?)?;

    let keys: Vec<&String> = reparsed.as_object().expect("object").keys().collect();
    assert_eq!(keys, ["File", "File Details", "File Hashes", "Web Metadata"]);
    assert_eq!(reparsed, original);
    assert_eq!(reparsed["File"]["File Name"], "index.html");
    assert_eq!(reparsed["File"]["Category"], "Web");
    Ok(())
}

#[test]
fn tables_follow_report_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("clip.mp4");
    fs::write(&path, b"\0\0\0\x10free\0\0\0\0\0\0\0\0")?;

    let tables = report_tables(&extract_metadata(&path)?)?;
    let titles: Vec<&str> = tables.iter().map(|table| table.title.as_str()).collect();
    assert_eq!(titles, [BASIC_INFO_TITLE, "Video Metadata", HASHES_TITLE]);
    assert_eq!(tables[1].rows[0].field, "Result");
    assert_eq!(tables[1].rows[0].value, "No metadata found.");
    Ok(())
}

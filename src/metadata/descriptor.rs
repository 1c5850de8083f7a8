//! Atributos del sistema de archivos: tamaño, fechas, permisos y propietario.

use crate::error::ExtractionError;
use crate::formatting::{format_optional_time, format_size};
use crate::metadata::report::FileDescriptor;
use infer::Infer;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

pub fn inspect(path: &Path) -> Result<FileDescriptor, ExtractionError> {
    let metadata = fs::metadata(path).map_err(|error| ExtractionError::file_access(path, error))?;

    if !metadata.is_file() {
        return Err(ExtractionError::file_access(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    let mut descriptor = FileDescriptor {
        size: metadata.len(),
        size_label: format_size(metadata.len()),
        created: format_optional_time(creation_time(&metadata)),
        modified: format_optional_time(metadata.modified().ok()),
        accessed: format_optional_time(metadata.accessed().ok()),
        read_only: metadata.permissions().readonly(),
        detected_type: sniff_content_type(path),
        permissions: None,
        permissions_rwx: None,
        owner_uid: None,
        group_gid: None,
        owner: None,
        group: None,
    };

    fill_unix_attributes(&metadata, &mut descriptor);

    Ok(descriptor)
}

/// Fecha de nacimiento si la plataforma la expone; en Unix cae al ctime.
fn creation_time(metadata: &Metadata) -> Option<SystemTime> {
    if let Ok(created) = metadata.created() {
        return Some(created);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        use std::time::Duration;

        let seconds = u64::try_from(metadata.ctime()).ok()?;
        let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
        SystemTime::UNIX_EPOCH.checked_add(Duration::new(seconds, nanos))
    }

    #[cfg(not(unix))]
    {
        None
    }
}

/// Tipo de contenido inferido por firma; solo informativo, no clasifica.
fn sniff_content_type(path: &Path) -> Option<String> {
    let infer = Infer::new();
    infer
        .get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}

#[cfg(unix)]
fn fill_unix_attributes(metadata: &Metadata, descriptor: &mut FileDescriptor) {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use users::{get_group_by_gid, get_user_by_uid};

    let mode = metadata.permissions().mode();
    descriptor.permissions = Some(format!("0o{:o}", mode));
    descriptor.permissions_rwx = Some(format_unix_permissions(mode));

    let uid = metadata.uid();
    let gid = metadata.gid();
    descriptor.owner_uid = Some(uid);
    descriptor.group_gid = Some(gid);
    descriptor.owner = get_user_by_uid(uid).map(|user| user.name().to_string_lossy().into_owned());
    descriptor.group =
        get_group_by_gid(gid).map(|group| group.name().to_string_lossy().into_owned());
}

#[cfg(not(unix))]
fn fill_unix_attributes(_metadata: &Metadata, _descriptor: &mut FileDescriptor) {}

#[cfg(unix)]
pub fn format_unix_permissions(mode: u32) -> String {
    const SYMBOLS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];

    let user = SYMBOLS[((mode >> 6) & 0o7) as usize];
    let group = SYMBOLS[((mode >> 3) & 0o7) as usize];
    let other = SYMBOLS[(mode & 0o7) as usize];

    format!("{}{}{}", user, group, other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formatting::UNAVAILABLE;
    use tempfile::tempdir;

    #[test]
    fn empty_file_has_size_and_timestamps() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.txt");
        fs::write(&path, b"")?;

        let descriptor = inspect(&path)?;
        assert_eq!(descriptor.size, 0);
        assert_ne!(descriptor.modified, UNAVAILABLE);
        assert_ne!(descriptor.accessed, UNAVAILABLE);
        assert!(!descriptor.created.is_empty());
        Ok(())
    }

    #[test]
    fn missing_path_is_file_access_error() {
        let dir = tempdir().expect("tempdir");
        let error = inspect(&dir.path().join("nope")).expect_err("debe fallar");
        assert_eq!(error.kind(), ErrorKind::FileAccessError);
    }

    #[test]
    fn directories_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let error = inspect(dir.path()).expect_err("debe fallar");
        assert_eq!(error.kind(), ErrorKind::FileAccessError);
    }

    #[cfg(unix)]
    #[test]
    fn unix_permissions_are_reported() -> Result<(), Box<dyn std::error::Error>> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let path = dir.path().join("script.sh");
        fs::write(&path, b"#!/bin/sh\n")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o754))?;

        let descriptor = inspect(&path)?;
        assert_eq!(descriptor.permissions_rwx.as_deref(), Some("rwxr-xr--"));
        assert!(descriptor.permissions.as_deref().is_some_and(|p| p.ends_with("754")));
        assert!(descriptor.owner_uid.is_some());
        assert!(descriptor.group_gid.is_some());
        Ok(())
    }
}

//! Cálculo de hashes MD5, SHA-1 y SHA-256 sobre el contenido completo.

use crate::error::ExtractionError;
use crate::metadata::report::HashDigestSet;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Lee el archivo una sola vez y calcula los tres digests sobre los mismos bytes.
pub fn hash_file(path: &Path) -> Result<HashDigestSet, ExtractionError> {
    let data = fs::read(path).map_err(|error| ExtractionError::file_access(path, error))?;
    Ok(hash_bytes(&data))
}

pub fn hash_bytes(data: &[u8]) -> HashDigestSet {
    HashDigestSet {
        md5: format!("{:x}", Md5::digest(data)),
        sha1: format!("{:x}", Sha1::digest(data)),
        sha256: format!("{:x}", Sha256::digest(data)),
    }
}

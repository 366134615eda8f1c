//! Content digests.
//!
//! BLAKE3, rendered as lowercase hex. Digests double as `ETag` values and as
//! the fingerprint segment of permanently cacheable URLs.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Digest a reader in fixed-size chunks
pub fn hexdigest_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

pub fn hexdigest_file(path: &Path) -> io::Result<String> {
    hexdigest_reader(File::open(path)?)
}

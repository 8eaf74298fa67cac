//! Integrity check for finished archives.
//!
//! Re-reads the archive from disk, recomputes the CRC-32 over its raw bytes
//! and compares it with the expected value, then decompresses the whole zstd
//! frame and walks every tar entry to its end. Any mismatch or decoding
//! error is a [`ArchiverError::VerifyFailure`].

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crc32fast::Hasher as Crc32Hasher;
use serde::Serialize;

use crate::archive::parse_archive_file_name;
use crate::ArchiverError;

const READ_BUFFER: usize = 256 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub path: PathBuf,
    pub checksum: u32,
    pub archive_bytes: u64,
    pub entries: u64,
    pub content_bytes: u64,
}

/// Verifies a published archive against the checksum embedded in its name.
pub fn verify_archive(path: &Path) -> Result<VerifyReport, ArchiverError> {
    let expected = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_archive_file_name)
        .map(|(_, checksum)| checksum)
        .ok_or_else(|| ArchiverError::verify(path, "file name is not of the form mm-dd-yyyy-<crc32>.tar.zstd"))?;
    verify_file(path, expected)
}

/// Verifies the archive at `path` against `expected`.
pub fn verify_file(path: &Path, expected: u32) -> Result<VerifyReport, ArchiverError> {
    let (checksum, archive_bytes) = checksum_file(path)
        .map_err(|e| ArchiverError::verify(path, format!("cannot read archive: {e}")))?;
    if checksum != expected {
        return Err(ArchiverError::verify(
            path,
            format!("checksum mismatch: expected {expected:08x}, found {checksum:08x}"),
        ));
    }

    let (entries, content_bytes) = walk_contents(path)
        .map_err(|e| ArchiverError::verify(path, format!("archive does not decode: {e}")))?;

    Ok(VerifyReport { path: path.to_path_buf(), checksum, archive_bytes, entries, content_bytes })
}

fn checksum_file(path: &Path) -> io::Result<(u32, u64)> {
    let mut file = File::open(path)?;
    let mut crc = Crc32Hasher::new();
    let mut buf = vec![0u8; READ_BUFFER];
    let mut total = 0u64;
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        crc.update(&buf[..n]);
        total += n as u64;
    }
    Ok((crc.finalize(), total))
}

fn walk_contents(path: &Path) -> io::Result<(u64, u64)> {
    let file = BufReader::with_capacity(READ_BUFFER, File::open(path)?);
    let decoder = zstd::stream::read::Decoder::with_buffer(file)?;
    let mut archive = tar::Archive::new(decoder);

    let mut entries = 0u64;
    let mut content_bytes = 0u64;
    for entry in archive.entries()? {
        let mut entry = entry?;
        content_bytes += io::copy(&mut entry, &mut io::sink())?;
        entries += 1;
    }
    // Drain to the end of the frame so its checksum is checked and trailing
    // garbage is rejected.
    io::copy(&mut archive.into_inner(), &mut io::sink())?;
    Ok((entries, content_bytes))
}

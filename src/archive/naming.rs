//! Final archive names: `<mm-dd-yyyy>-<crc32 as 8 hex digits>.tar.zstd`.

use chrono::NaiveDate;

pub const ARCHIVE_EXTENSION: &str = "tar.zstd";

const DATE_FORMAT: &str = "%m-%d-%Y";
const DATE_LEN: usize = "mm-dd-yyyy".len();
const CHECKSUM_LEN: usize = 8;

/// Derives the permanent file name for an archive created on `date`.
pub fn archive_file_name(date: NaiveDate, checksum: u32) -> String {
    format!("{}-{:08x}.{}", date.format(DATE_FORMAT), checksum, ARCHIVE_EXTENSION)
}

/// Splits a permanent file name back into its date and checksum.
///
/// Returns `None` for anything [`archive_file_name`] could not have produced,
/// including temp files.
pub fn parse_archive_file_name(name: &str) -> Option<(NaiveDate, u32)> {
    let stem = name.strip_suffix(ARCHIVE_EXTENSION)?.strip_suffix('.')?;
    if stem.len() != DATE_LEN + 1 + CHECKSUM_LEN || !stem.is_ascii() {
        return None;
    }
    let (date, rest) = stem.split_at(DATE_LEN);
    let hex = rest.strip_prefix('-')?;
    if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
    let checksum = u32::from_str_radix(hex, 16).ok()?;
    Some((date, checksum))
}

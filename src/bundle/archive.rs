//! Archive decoding.
//!
//! Turns raw archive bytes into `(relative path, bytes)` pairs. Directory
//! markers are dropped; only leaf files come out.
//!
//! Entry sizes recorded in archive headers are never trusted. Every member is
//! read through a shared budget of decompressed bytes, and the decode stops
//! with [`BundleError::TooLarge`] once the budget runs out.

use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tar::Archive;

use super::error::{BundleError, BundleResult};

/// Archive container formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [b'P', b'K', 0x03, 0x04, ..] | [b'P', b'K', 0x05, 0x06, ..] => Some(Self::Zip),
            [0x1f, 0x8b, ..] => Some(Self::TarGz),
            _ => None,
        }
    }
}

/// A decoded archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub path: String,
    pub content: Vec<u8>,
}

/// Decode `data` according to its detected format.
///
/// `max_unpacked` caps the sum of all decompressed entry sizes.
pub fn decode(data: &[u8], max_unpacked: usize) -> BundleResult<Vec<RawEntry>> {
    let mut budget = Budget::new(max_unpacked);
    match ArchiveFormat::detect(data) {
        Some(ArchiveFormat::Zip) => decode_zip(data, &mut budget),
        Some(ArchiveFormat::TarGz) => decode_tar_gz(data, &mut budget),
        None => Err(BundleError::InvalidArchive(
            "unrecognised archive format (expected zip or tar.gz)".to_string(),
        )),
    }
}

/// Decompressed bytes still allowed for the rest of the archive.
struct Budget {
    limit: usize,
    remaining: usize,
}

impl Budget {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    /// Read one member to its end, charging what it yields to the budget.
    fn read_entry<R: Read>(&mut self, reader: R, name: &str) -> BundleResult<Vec<u8>> {
        let mut content = Vec::new();
        reader
            .take((self.remaining as u64).saturating_add(1))
            .read_to_end(&mut content)
            .map_err(|e| BundleError::EntryRead {
                path: name.to_string(),
                message: e.to_string(),
            })?;

        if content.len() > self.remaining {
            return Err(BundleError::TooLarge {
                size: self.limit - self.remaining + content.len(),
                limit: self.limit,
            });
        }
        self.remaining -= content.len();
        Ok(content)
    }
}

fn decode_zip(data: &[u8], budget: &mut Budget) -> BundleResult<Vec<RawEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| BundleError::InvalidArchive(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx).map_err(|e| BundleError::EntryRead {
            path: format!("#{}", idx),
            message: e.to_string(),
        })?;

        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let path = clean_relative_path(&name)?;

        let content = budget.read_entry(&mut file, &name)?;
        entries.push(RawEntry { path, content });
    }

    Ok(entries)
}

fn decode_tar_gz(data: &[u8], budget: &mut Budget) -> BundleResult<Vec<RawEntry>> {
    let mut archive = Archive::new(GzDecoder::new(data));
    let mut entries = Vec::new();

    for entry in archive
        .entries()
        .map_err(|e| BundleError::InvalidArchive(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| BundleError::InvalidArchive(e.to_string()))?;

        // Directories, links, and metadata records carry no file content.
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(|e| BundleError::InvalidArchive(format!("invalid path in archive: {}", e)))?
            .to_string_lossy()
            .to_string();
        let path = clean_relative_path(&name)?;

        let content = budget.read_entry(&mut entry, &name)?;
        entries.push(RawEntry { path, content });
    }

    Ok(entries)
}

/// Canonicalise an archive member name into a relative `/`-separated path.
///
/// Absolute names and `..` components are rejected outright; `.` and empty
/// components are dropped.
pub fn clean_relative_path(name: &str) -> BundleResult<String> {
    let name = name.replace('\\', "/");
    if name.starts_with('/') {
        return Err(BundleError::UnsafePath(name));
    }

    let mut components = Vec::new();
    for component in name.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(BundleError::UnsafePath(name)),
            c if c.contains('\0') => return Err(BundleError::UnsafePath(name)),
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return Err(BundleError::UnsafePath(name));
    }
    Ok(components.join("/"))
}

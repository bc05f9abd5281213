//! Bundle unpacking.
//!
//! A bundle is an archive (zip or tar.gz) or a plain set of named blobs
//! with a `manifest.json` at its root. Unpacking is all-or-nothing: either
//! every entry is decoded and the manifest validates, or nothing comes back.

pub mod archive;
mod error;
mod manifest;
pub mod pack;

use std::collections::HashMap;

use sha2::{Digest, Sha256};

pub use archive::ArchiveFormat;
pub use error::{BundleError, BundleResult};
pub use manifest::BundleManifest;

/// Default upper bound on raw bundle size (10 MB).
pub const DEFAULT_MAX_BUNDLE_SIZE: usize = 10 * 1024 * 1024;

/// Default cap on decompressed bytes, as a multiple of the raw size limit.
pub const DEFAULT_UNPACK_RATIO: usize = 8;

/// One file inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// Path relative to the bundle root, `/`-separated.
    pub path: String,
    pub content: Vec<u8>,
}

/// A fully decoded bundle, ready to be written into a namespace.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub manifest: BundleManifest,
    pub entries: Vec<BundleEntry>,
    /// SHA-256 of the raw input, hex encoded.
    pub checksum: String,
}

impl Bundle {
    /// Namespace identity taken from the manifest.
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    /// Sum of all entry sizes.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.content.len()).sum()
    }

    /// Build a bundle from already separated files.
    ///
    /// Paths follow the same rules as archive members.
    pub fn from_blobs<I, P>(blobs: I) -> BundleResult<Self>
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        let mut raw = Vec::new();
        for (path, content) in blobs {
            let path = archive::clean_relative_path(path.as_ref())?;
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(&content);
            raw.push(archive::RawEntry { path, content });
        }
        assemble(raw, hex::encode(hasher.finalize()))
    }
}

/// Decodes raw bundle bytes, enforcing a size limit on the input and on
/// everything decompressed out of it.
#[derive(Debug, Clone, Copy)]
pub struct Unpacker {
    max_size: usize,
    max_unpacked: usize,
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUNDLE_SIZE)
    }
}

impl Unpacker {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            max_unpacked: max_size.saturating_mul(DEFAULT_UNPACK_RATIO),
        }
    }

    /// Override the cap on total decompressed bytes.
    pub fn with_max_unpacked(mut self, max_unpacked: usize) -> Self {
        self.max_unpacked = max_unpacked;
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_unpacked(&self) -> usize {
        self.max_unpacked
    }

    /// Decode `data` into a [`Bundle`].
    pub fn unpack(&self, data: &[u8]) -> BundleResult<Bundle> {
        if data.len() > self.max_size {
            return Err(BundleError::TooLarge {
                size: data.len(),
                limit: self.max_size,
            });
        }

        let raw = archive::decode(data, self.max_unpacked)?;
        assemble(raw, calculate_checksum(data))
    }
}

/// Decode `data` with the default size limit.
pub fn unpack(data: &[u8]) -> BundleResult<Bundle> {
    Unpacker::default().unpack(data)
}

/// Calculate SHA-256 checksum.
pub fn calculate_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Locate the manifest and collapse duplicate paths (the last copy wins,
/// keeping the position of the first).
fn assemble(raw: Vec<archive::RawEntry>, checksum: String) -> BundleResult<Bundle> {
    let mut entries: Vec<BundleEntry> = Vec::with_capacity(raw.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in raw {
        match positions.get(&entry.path) {
            Some(&idx) => entries[idx].content = entry.content,
            None => {
                positions.insert(entry.path.clone(), entries.len());
                entries.push(BundleEntry {
                    path: entry.path,
                    content: entry.content,
                });
            }
        }
    }

    let manifest_entry = positions
        .get(BundleManifest::FILE_NAME)
        .map(|&idx| &entries[idx])
        .ok_or(BundleError::MissingManifest)?;
    let manifest = BundleManifest::parse(&manifest_entry.content)?;

    Ok(Bundle {
        manifest,
        entries,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_files() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("manifest.json", br#"{"id": "ext1", "name": "Example"}"#.as_slice()),
            ("index.html", b"<html>hi</html>".as_slice()),
            ("js/app.js", b"console.log('hi')".as_slice()),
        ]
    }

    fn paths(bundle: &Bundle) -> Vec<&str> {
        let mut paths: Vec<&str> = bundle.entries.iter().map(|e| e.path.as_str()).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_unpack_zip() {
        let data = pack::zip_bundle(&sample_files()).unwrap();
        let bundle = unpack(&data).unwrap();

        assert_eq!(bundle.id(), "ext1");
        assert_eq!(bundle.manifest.display_name(), "Example");
        assert_eq!(paths(&bundle), vec!["index.html", "js/app.js", "manifest.json"]);

        let app = bundle.entries.iter().find(|e| e.path == "js/app.js").unwrap();
        assert_eq!(app.content, b"console.log('hi')");
        assert_eq!(bundle.checksum, calculate_checksum(&data));
    }

    #[test]
    fn test_unpack_tar_gz() {
        let data = pack::tar_gz_bundle(&sample_files()).unwrap();
        let bundle = unpack(&data).unwrap();

        assert_eq!(bundle.id(), "ext1");
        assert_eq!(paths(&bundle), vec!["index.html", "js/app.js", "manifest.json"]);
        let expected: usize = sample_files().iter().map(|(_, c)| c.len()).sum();
        assert_eq!(bundle.total_bytes(), expected);
    }

    #[test]
    fn test_unpack_requires_manifest() {
        let data = pack::zip_bundle(&[("index.html", b"<html></html>".as_slice())]).unwrap();
        assert_eq!(unpack(&data).unwrap_err(), BundleError::MissingManifest);

        // A nested manifest does not count.
        let data = pack::zip_bundle(&[("sub/manifest.json", br#"{"id":"x"}"#.as_slice())]).unwrap();
        assert_eq!(unpack(&data).unwrap_err(), BundleError::MissingManifest);
    }

    #[test]
    fn test_unpack_rejects_manifest_without_id() {
        let data = pack::zip_bundle(&[("manifest.json", br#"{"name": "x"}"#.as_slice())]).unwrap();
        assert!(matches!(unpack(&data), Err(BundleError::ManifestParse(_))));
    }

    #[test]
    fn test_unsafe_paths_fail_the_whole_bundle() {
        let result = Bundle::from_blobs(vec![
            ("manifest.json", br#"{"id": "ext1"}"#.to_vec()),
            ("index.html", b"ok".to_vec()),
            ("../outside.js", b"x".to_vec()),
        ]);
        assert!(matches!(result, Err(BundleError::UnsafePath(_))));
    }

    #[test]
    fn test_unpack_size_limit() {
        let data = pack::zip_bundle(&sample_files()).unwrap();
        let err = Unpacker::new(16).unpack(&data).unwrap_err();
        assert!(matches!(err, BundleError::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn test_unpacked_size_limit() {
        let files = [
            ("manifest.json", br#"{"id": "ext1"}"#.to_vec()),
            ("padding.txt", vec![b' '; 256 * 1024]),
        ];
        let data = pack::zip_bundle(&files).unwrap();

        let unpacker = Unpacker::new(64 * 1024);
        assert_eq!(unpacker.max_unpacked(), 64 * 1024 * DEFAULT_UNPACK_RATIO);
        assert_eq!(unpacker.unpack(&data).unwrap().total_bytes(), 256 * 1024 + 14);

        let err = unpacker.with_max_unpacked(100 * 1024).unpack(&data).unwrap_err();
        assert!(matches!(err, BundleError::TooLarge { limit, .. } if limit == 100 * 1024));
    }

    #[test]
    fn test_from_blobs() {
        let bundle = Bundle::from_blobs(vec![
            ("manifest.json", br#"{"id": "local"}"#.to_vec()),
            ("./style.css", b"body{}".to_vec()),
            ("style.css", b"body{color:red}".to_vec()),
        ])
        .unwrap();

        assert_eq!(bundle.id(), "local");
        assert_eq!(bundle.entries.len(), 2);
        let css = bundle.entries.iter().find(|e| e.path == "style.css").unwrap();
        assert_eq!(css.content, b"body{color:red}");

        assert!(matches!(
            Bundle::from_blobs(vec![("/abs.js", Vec::new())]),
            Err(BundleError::UnsafePath(_))
        ));
    }
}

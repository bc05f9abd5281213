//! Bundle packing: the inverse of unpacking, used by `assetd pack` and by
//! tests that need real archives.

use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use super::error::{BundleError, BundleResult};

fn pack_error(e: impl std::fmt::Display) -> BundleError {
    BundleError::InvalidArchive(format!("failed to build archive: {}", e))
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Build a zip archive from `(relative path, bytes)` pairs.
///
/// Parent directories get explicit directory markers, the way desktop zip
/// tools write them.
pub fn zip_bundle<P, C>(files: &[(P, C)]) -> BundleResult<Vec<u8>>
where
    P: AsRef<str>,
    C: AsRef<[u8]>,
{
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut directories: Vec<String> = Vec::new();

    for (path, content) in files {
        let path = path.as_ref();

        let mut prefix = String::new();
        let segments: Vec<&str> = path.split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            prefix.push_str(segment);
            prefix.push('/');
            if !directories.contains(&prefix) {
                writer
                    .add_directory(prefix.as_str(), file_options())
                    .map_err(pack_error)?;
                directories.push(prefix.clone());
            }
        }

        writer.start_file(path, file_options()).map_err(pack_error)?;
        writer.write_all(content.as_ref()).map_err(pack_error)?;
    }

    let cursor = writer.finish().map_err(pack_error)?;
    Ok(cursor.into_inner())
}

/// Build a gzip-compressed tar archive from `(relative path, bytes)` pairs.
pub fn tar_gz_bundle<P, C>(files: &[(P, C)]) -> BundleResult<Vec<u8>>
where
    P: AsRef<str>,
    C: AsRef<[u8]>,
{
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, content) in files {
        let content = content.as_ref();
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path.as_ref(), content)
            .map_err(pack_error)?;
    }

    let encoder = builder.into_inner().map_err(pack_error)?;
    encoder.finish().map_err(pack_error)
}

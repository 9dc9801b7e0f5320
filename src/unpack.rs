//! Source extraction.
//!
//! [`unpack`] always starts from nothing: the previous extraction of the same
//! archive is removed first, so the returned directory holds exactly what the
//! archive contains.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::descriptor::{ArchiveFormat, LibraryDescriptor};
use crate::error::{fs_err, Error, Result};
use crate::layout::{remove_dir_if_exists, FilesystemLayout};
use crate::process::Cmd;

/// The opaque "unpack archive to directory" capability.
pub trait Extractor {
    /// Extract `archive` (of the given format) into `dest_dir`.
    fn extract(&self, archive: &Path, format: ArchiveFormat, dest_dir: &Path) -> Result<()>;
}

/// In-process tar extraction over gzip/bzip2/xz/lzma decoders; zip archives
/// are handed to the host's `unzip`.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn extract(&self, archive: &Path, format: ArchiveFormat, dest_dir: &Path) -> Result<()> {
        let open = || -> Result<BufReader<File>> {
            let f = File::open(archive).map_err(fs_err("opening archive", archive))?;
            Ok(BufReader::new(f))
        };

        match format {
            ArchiveFormat::Tar => unpack_tar(open()?, archive, dest_dir),
            ArchiveFormat::TarGz => {
                unpack_tar(flate2::read::GzDecoder::new(open()?), archive, dest_dir)
            }
            ArchiveFormat::TarBz2 => {
                unpack_tar(bzip2::read::BzDecoder::new(open()?), archive, dest_dir)
            }
            ArchiveFormat::TarXz => {
                unpack_tar(xz2::read::XzDecoder::new(open()?), archive, dest_dir)
            }
            ArchiveFormat::TarLzma => {
                let stream =
                    xz2::stream::Stream::new_lzma_decoder(u64::MAX).map_err(|e| Error::Extract {
                        path: archive.to_path_buf(),
                        reason: format!("initializing lzma decoder: {e}"),
                    })?;
                unpack_tar(
                    xz2::read::XzDecoder::new_stream(open()?, stream),
                    archive,
                    dest_dir,
                )
            }
            ArchiveFormat::Zip => Cmd::new("unzip")
                .args(["-q", "-o"])
                .arg(archive)
                .arg("-d")
                .arg(dest_dir)
                .error_msg("unzip")
                .run()
                .map_err(|e| Error::Extract {
                    path: archive.to_path_buf(),
                    reason: e.to_string(),
                }),
        }
    }
}

fn unpack_tar(reader: impl Read, archive: &Path, dest_dir: &Path) -> Result<()> {
    let mut tarball = tar::Archive::new(reader);
    tarball.set_preserve_permissions(true);
    tarball.unpack(dest_dir).map_err(|e| Error::Extract {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Extract `archive` (the verified cache file for `descriptor`) under the
/// source root and return the fresh top-level source directory.
pub fn unpack(
    descriptor: &LibraryDescriptor,
    archive: &Path,
    layout: &FilesystemLayout,
    extractor: &dyn Extractor,
) -> Result<PathBuf> {
    let source_dir = layout.source_dir(descriptor.archive_base());
    remove_dir_if_exists(&source_dir)?;
    fs::create_dir_all(&layout.src_root)
        .map_err(fs_err("creating source directory", &layout.src_root))?;

    info!("unpack {}", archive.display());
    extractor.extract(archive, descriptor.format(), &layout.src_root)?;

    if !source_dir.is_dir() {
        return Err(Error::Extract {
            path: archive.to_path_buf(),
            reason: format!(
                "archive has no top-level directory '{}'",
                descriptor.archive_base()
            ),
        });
    }
    Ok(source_dir)
}

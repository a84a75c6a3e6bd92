mod error;

pub use self::error::ExtractError;

use crate::delta::DeltaDecoder;
use crate::progress::ExtractProgress;
use pstream::manifest::Manifest;
use pstream::{Psf, SourceRange};
use std::fs::{File, create_dir_all};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;

/// Name of the decoded manifest document persisted at the destination root.
pub const MANIFEST_FILE_NAME: &str = "manifest.cix.xml";

/// Entry payloads are copied out of the container in slices of this size.
const COPY_CHUNK: usize = 1024 * 1024;

/// Progress is reported after every this many completed entries.
const PROGRESS_INTERVAL: usize = 100;

/// Extracts a PSTREAM container to a destination directory.
///
/// The extractor walks the manifest strictly in document order, streaming
/// each entry's byte range to its relative path and running PA30-typed
/// payloads through the injected [`DeltaDecoder`]. The first failure of any
/// kind aborts the run.
pub struct PsfExtractor<'a, R: AsRef<[u8]>, P: ExtractProgress, D: DeltaDecoder> {
    psf: &'a Psf<R>,
    progress: P,
    decoder: D,
}

impl<'a, R: AsRef<[u8]>, P: ExtractProgress, D: DeltaDecoder> PsfExtractor<'a, R, P, D> {
    /// Creates a new extractor for the given container.
    pub fn new(psf: &'a Psf<R>, progress: P, decoder: D) -> Self {
        Self {
            psf,
            progress,
            decoder,
        }
    }

    /// Extracts the whole container to `output`.
    ///
    /// `output` must be absent or empty. The decoded manifest is written to
    /// `output/manifest.cix.xml` and left there; every entry it describes
    /// is then streamed to its separator-normalized relative path under
    /// `output`, in manifest order. Files extracted before a failure remain
    /// on disk; entries after it are never touched.
    pub fn extract(&self, output: impl AsRef<Path>) -> Result<(), ExtractError> {
        let output = output.as_ref();

        ensure_empty_destination(output)?;

        let manifest = self.decode_manifest(output)?;
        let total = manifest.len();

        self.progress.start(total);

        let mut processed = 0usize;

        for entry in &manifest {
            let dest = entry.to_path(output);
            self.progress.entry_start(&dest, processed, total);

            self.extract_range(entry.source, &dest)?;

            if entry.delta.needs_decode() {
                self.decoder
                    .decode(&dest)
                    .map_err(|e| ExtractError::DecodeEntryFailed {
                        path: dest.clone(),
                        source: e,
                    })?;
            }

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 || processed == total {
                self.progress.entries_extracted(processed, total);
            }
        }

        self.progress.completed(processed);

        Ok(())
    }

    /// Materializes and decodes the manifest at the destination root.
    ///
    /// The packed bytes are streamed to `manifest.cix.xml` under `output`,
    /// decoded in place, then parsed. A decode failure here is fatal:
    /// without a manifest, extraction cannot proceed.
    pub fn decode_manifest(&self, output: &Path) -> Result<Manifest, ExtractError> {
        let path = output.join(MANIFEST_FILE_NAME);

        self.extract_range(self.psf.manifest_source(), &path)?;

        self.decoder
            .decode(&path)
            .map_err(|e| ExtractError::DecodeManifestFailed { source: e })?;

        let xml =
            std::fs::read_to_string(&path).map_err(|e| ExtractError::ReadManifestFailed {
                path: path.clone(),
                source: e,
            })?;

        Manifest::parse(&xml).map_err(|e| ExtractError::ParseManifestFailed { source: e })
    }

    /// Streams `source` out of the container into a new file at `dest`.
    ///
    /// Missing parent directories are created and an existing file at
    /// `dest` is overwritten. The copy runs in bounded chunks so peak
    /// memory does not depend on the entry size; a zero-length range
    /// produces an empty file.
    pub fn extract_range(&self, source: SourceRange, dest: &Path) -> Result<(), ExtractError> {
        debug!(
            "extracting {} bytes at {} to {}",
            source.length,
            source.offset,
            dest.display()
        );

        let data = self
            .psf
            .range(source)
            .map_err(|e| ExtractError::InvalidRange {
                path: dest.to_path_buf(),
                source: e,
            })?;

        if let Some(parent) = dest.parent() {
            create_dir_all(parent).map_err(|e| ExtractError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = File::create(dest).map_err(|e| ExtractError::CreateFileFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        for chunk in data.chunks(COPY_CHUNK) {
            file.write_all(chunk).map_err(|e| ExtractError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }

        Ok(())
    }
}

/// Ensures the destination directory exists and is empty.
///
/// Fails with [`ExtractError::NonEmptyDestination`] if it already contains
/// entries; creates it (and missing parents) if absent. Run this before
/// opening the container so a doomed invocation never touches it.
pub fn ensure_empty_destination(path: &Path) -> Result<(), ExtractError> {
    match std::fs::read_dir(path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                return Err(ExtractError::NonEmptyDestination {
                    path: path.to_path_buf(),
                });
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            create_dir_all(path).map_err(|e| ExtractError::CreateDirectoryFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Err(e) => {
            return Err(ExtractError::InspectDestinationFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    }

    Ok(())
}

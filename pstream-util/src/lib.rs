//! Library for extracting PSTREAM update containers.
//!
//! This crate provides the extraction logic for PSTREAM `.psf` files: the
//! destination precondition, the manifest decode stage, and the sequential
//! entry extraction loop with its fail-fast error policy.
//!
//! # Overview
//!
//! The main entry point is [`PsfExtractor`], which takes a parsed
//! [`pstream::Psf`], an [`ExtractProgress`] implementation, and a
//! [`DeltaDecoder`], then streams the container contents to a directory on
//! disk. The decoded manifest is persisted at the destination root as
//! `manifest.cix.xml`.
//!
//! # Example
//!
//! ```no_run
//! use pstream_util::{open_psf, CommandDecoder, PsfExtractor, SilentProgress};
//!
//! let psf = unsafe { open_psf("update.psf".as_ref()) }.expect("failed to open container");
//! let decoder = CommandDecoder::new("applydelta");
//! let extractor = PsfExtractor::new(&psf, SilentProgress, decoder);
//! extractor.extract("output/").expect("extraction failed");
//! ```
//!
//! # Delta decoding
//!
//! PA30 delta streams are decoded by an injected [`DeltaDecoder`]; the
//! extractor itself never interprets them. Ship your own implementation, or
//! use [`CommandDecoder`] to call an external tool.

pub mod delta;
pub mod extract;
pub mod progress;

pub use self::delta::{CommandDecoder, DecodeError, DeltaDecoder, UnavailableDecoder};
pub use self::extract::{ExtractError, MANIFEST_FILE_NAME, PsfExtractor, ensure_empty_destination};
pub use self::progress::{ExtractProgress, SilentProgress};

#[cfg(feature = "cli")]
pub use self::progress::ConsoleProgress;

use snafu::{ResultExt, Snafu};
use std::path::Path;

/// Errors that can occur when opening a PSTREAM container from disk.
#[derive(Debug, Snafu)]
pub enum OpenPsfError {
    #[snafu(display("failed to open file"))]
    OpenFile { source: std::io::Error },

    #[snafu(display("failed to memory map file"))]
    MmapFile { source: std::io::Error },

    #[snafu(display("failed to parse container"))]
    ParsePsf { source: pstream::OpenError },
}

/// Opens a PSTREAM container from disk using a memory-mapped read.
///
/// This is a convenience function that opens the file, maps it into memory,
/// and parses the header. The descriptor backing the map stays open for the
/// lifetime of the returned [`Psf`](pstream::Psf) and is released when it is
/// dropped, on completion or fatal error alike.
///
/// # Safety
///
/// This function uses `unsafe` internally to create a memory map. The caller
/// must ensure the file is not modified or truncated while the returned
/// `Psf` is in use.
pub unsafe fn open_psf(path: &Path) -> Result<pstream::Psf<memmap2::Mmap>, OpenPsfError> {
    let file = std::fs::File::open(path).context(OpenFileSnafu)?;
    let raw = unsafe { memmap2::Mmap::map(&file).context(MmapFileSnafu)? };
    pstream::Psf::new(raw).context(ParsePsfSnafu)
}

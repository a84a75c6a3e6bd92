//! A library for parsing PSTREAM update containers.
//!
//! This crate provides functionality to parse PSTREAM files, the container
//! format used to package delta-compressed update payloads together with a
//! ContainerIndex manifest describing them.
//!
//! # Features
//!
//! - Parse and validate the PSTREAM header and its manifest locator
//! - Bounds-checked byte-range access to any segment of the container
//! - Decode the ContainerIndex manifest into an ordered entry list
//!
//! # Example
//!
//! ```no_run
//! use pstream::Psf;
//!
//! // Open a container from any byte source
//! let bytes = std::fs::read("update.psf").unwrap();
//! let psf = Psf::new(bytes).unwrap();
//!
//! // Locate the packed manifest
//! let source = psf.manifest_source();
//! println!("packed manifest at {}+{}", source.offset, source.length);
//!
//! // Access its raw (still delta-compressed) bytes
//! let packed = psf.range(source).unwrap();
//! println!("{} packed manifest bytes", packed.len());
//! ```
//!
//! Decoding the packed manifest and the PA30 payloads requires a delta
//! decoder; see the `pstream-util` crate for the extraction side.

use self::header::PsfHeader;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use open_error::*;

pub mod header;
pub mod manifest;

/// A byte range within a PSTREAM container.
///
/// Offsets and lengths are stored signed, exactly as they appear in the
/// header and manifest; they are validated when the range is resolved
/// against a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SourceRange {
    /// Byte offset from the start of the container.
    pub offset: i64,
    /// Length of the range in bytes.
    pub length: i64,
}

/// A parsed PSTREAM container.
///
/// This struct provides read-only access to the container contents: the
/// header, the packed manifest locator, and arbitrary byte ranges.
#[must_use]
pub struct Psf<R: AsRef<[u8]>> {
    raw: R,
    header: PsfHeader,
}

impl<R: AsRef<[u8]>> std::fmt::Debug for Psf<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Psf")
            .field("header", &self.header)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl<R: AsRef<[u8]>> Psf<R> {
    /// Creates a new [`Psf`] from raw bytes.
    ///
    /// Validates the PSTREAM signature and parses the manifest locator.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pstream::Psf;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let bytes = std::fs::read("update.psf")?;
    /// let psf = Psf::new(bytes)?;
    /// println!("container size: {} bytes", psf.size());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(raw: R) -> Result<Self, OpenError> {
        let header = PsfHeader::read(raw.as_ref()).context(ReadHeaderFailedSnafu)?;

        debug!(
            "opened PSTREAM container, packed manifest at {}+{}",
            header.manifest_offset(),
            header.manifest_length()
        );

        Ok(Self { raw, header })
    }

    /// Returns a reference to the container header.
    pub fn header(&self) -> &PsfHeader {
        &self.header
    }

    /// Returns the container size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.raw.as_ref().len()
    }

    /// Returns the byte range holding the packed manifest.
    pub fn manifest_source(&self) -> SourceRange {
        self.header.manifest_source()
    }

    /// Resolves a byte range against the container.
    ///
    /// Zero-length ranges are valid and yield an empty slice. A range with
    /// a negative offset or length, or one extending past the end of the
    /// container, fails with [`RangeError::OutOfBounds`].
    pub fn range(&self, source: SourceRange) -> Result<&[u8], RangeError> {
        let raw = self.raw.as_ref();

        let data = match (
            usize::try_from(source.offset),
            usize::try_from(source.length),
        ) {
            (Ok(start), Ok(length)) => start
                .checked_add(length)
                .and_then(|end| raw.get(start..end)),
            _ => None,
        };

        data.ok_or_else(|| {
            OutOfBoundsSnafu {
                offset: source.offset,
                length: source.length,
                size: raw.len(),
            }
            .build()
        })
    }
}

#[derive(Debug, Snafu)]
#[snafu(module)]
#[non_exhaustive]
pub enum OpenError {
    #[snafu(display("invalid PSTREAM header"))]
    ReadHeaderFailed { source: header::ReadError },
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RangeError {
    #[snafu(display(
        "range {offset}+{length} is out of bounds for a container of {size} bytes"
    ))]
    OutOfBounds {
        offset: i64,
        length: i64,
        size: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal container: header followed by `payload`.
    fn container(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; header::PsfHeader::RAW_SIZE];
        bytes[..7].copy_from_slice(b"PSTREAM");
        bytes.extend_from_slice(payload);
        bytes
    }

    fn range(offset: i64, length: i64) -> SourceRange {
        SourceRange { offset, length }
    }

    #[test]
    fn resolves_interior_range() {
        let psf = Psf::new(container(b"abcdef")).unwrap();
        let base = header::PsfHeader::RAW_SIZE as i64;

        assert_eq!(psf.range(range(base + 1, 3)).unwrap(), b"bcd");
    }

    #[test]
    fn resolves_range_ending_exactly_at_eof() {
        let psf = Psf::new(container(b"abcdef")).unwrap();
        let base = header::PsfHeader::RAW_SIZE as i64;

        assert_eq!(psf.range(range(base, 6)).unwrap(), b"abcdef");
    }

    #[test]
    fn zero_length_range_is_empty() {
        let psf = Psf::new(container(b"abcdef")).unwrap();

        assert_eq!(psf.range(range(0, 0)).unwrap(), b"");
    }

    #[test]
    fn range_past_eof_is_out_of_bounds() {
        let psf = Psf::new(container(b"abcdef")).unwrap();
        let base = header::PsfHeader::RAW_SIZE as i64;

        assert!(matches!(
            psf.range(range(base, 7)),
            Err(RangeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn negative_offset_is_out_of_bounds() {
        let psf = Psf::new(container(b"abcdef")).unwrap();

        assert!(matches!(
            psf.range(range(-1, 4)),
            Err(RangeError::OutOfBounds { .. })
        ));

        assert!(matches!(
            psf.range(range(0, -4)),
            Err(RangeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn foreign_bytes_fail_to_open() {
        assert!(matches!(
            Psf::new(b"MZ\x90\x00 definitely not a container".to_vec()),
            Err(OpenError::ReadHeaderFailed { .. })
        ));
    }
}

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::little_endian::I64,
};

use crate::SourceRange;

/// Errors when reading a PSTREAM header.
#[derive(Debug, snafu::Snafu)]
#[non_exhaustive]
pub enum ReadError {
    #[snafu(display("file is too small to hold a PSTREAM signature"))]
    TooSmall,

    #[snafu(display("not a PSTREAM container"))]
    InvalidMagic,

    #[snafu(display("PSTREAM header is truncated"))]
    TruncatedHeader,
}

type Result<T, E = ReadError> = std::result::Result<T, E>;

/// The 7-byte ASCII signature at the start of every PSTREAM container.
pub const PSTREAM_MAGIC: [u8; 7] = *b"PSTREAM";

/// Raw on-disk layout of the PSTREAM header region.
///
/// The manifest locator integers are fixed at 8-byte signed little-endian;
/// a container too short to hold them is rejected as a truncated or
/// mismatched header rather than read partially.
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PsfHeaderRaw {
    pub magic: [u8; 7],       // 0x00 - "PSTREAM"
    pub reserved: [u8; 33],   // 0x07 - undocumented, not consumed
    pub manifest_offset: I64, // 0x28 - byte offset of the packed manifest
    pub manifest_length: I64, // 0x30 - byte length of the packed manifest
}

/// Parsed PSTREAM header information.
#[derive(Debug)]
#[must_use]
pub struct PsfHeader {
    raw_header: PsfHeaderRaw,
}

impl PsfHeader {
    pub const RAW_SIZE: usize = size_of::<PsfHeaderRaw>();

    /// Parses a PSTREAM header from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too small, does not start with the
    /// PSTREAM signature, or ends before the manifest locator.
    pub fn read(psf: &[u8]) -> Result<Self> {
        // Check the signature before anything else so a foreign file is
        // reported as such, not as a short header.
        snafu::ensure!(psf.len() >= PSTREAM_MAGIC.len(), TooSmallSnafu);
        snafu::ensure!(psf[..PSTREAM_MAGIC.len()] == PSTREAM_MAGIC, InvalidMagicSnafu);

        let (raw_header, _) =
            PsfHeaderRaw::read_from_prefix(psf).map_err(|_| TruncatedHeaderSnafu.build())?;

        Ok(Self { raw_header })
    }

    /// Returns the byte offset of the packed manifest within the container.
    #[must_use]
    pub const fn manifest_offset(&self) -> i64 {
        self.raw_header.manifest_offset.get()
    }

    /// Returns the byte length of the packed manifest.
    #[must_use]
    pub const fn manifest_length(&self) -> i64 {
        self.raw_header.manifest_length.get()
    }

    /// Returns the byte range of the packed manifest.
    ///
    /// The range is read as-is from the header; it is bounds-checked
    /// against the container when the bytes are actually accessed.
    pub const fn manifest_source(&self) -> SourceRange {
        SourceRange {
            offset: self.manifest_offset(),
            length: self.manifest_length(),
        }
    }

    /// Returns the raw header.
    #[must_use]
    pub const fn raw_header(&self) -> &PsfHeaderRaw {
        &self.raw_header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(offset: i64, length: i64) -> Vec<u8> {
        let mut bytes = vec![0u8; PsfHeader::RAW_SIZE];
        bytes[..7].copy_from_slice(b"PSTREAM");
        bytes[40..48].copy_from_slice(&offset.to_le_bytes());
        bytes[48..56].copy_from_slice(&length.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_manifest_locator() {
        let header = PsfHeader::read(&header_bytes(0x1234, 987)).unwrap();

        assert_eq!(header.manifest_offset(), 0x1234);
        assert_eq!(header.manifest_length(), 987);
        assert_eq!(
            header.manifest_source(),
            SourceRange {
                offset: 0x1234,
                length: 987
            }
        );
    }

    #[test]
    fn rejects_foreign_signature() {
        let mut bytes = header_bytes(0, 0);
        bytes[..7].copy_from_slice(b"NOTPSTR");

        assert!(matches!(
            PsfHeader::read(&bytes),
            Err(ReadError::InvalidMagic)
        ));
    }

    #[test]
    fn rejects_file_shorter_than_signature() {
        assert!(matches!(PsfHeader::read(b"PSTR"), Err(ReadError::TooSmall)));
    }

    #[test]
    fn rejects_truncated_header() {
        // Valid signature but the file ends before the manifest locator.
        assert!(matches!(
            PsfHeader::read(b"PSTREAM\x00\x00"),
            Err(ReadError::TruncatedHeader)
        ));
    }

    #[test]
    fn negative_locator_values_are_preserved() {
        let header = PsfHeader::read(&header_bytes(-1, -8)).unwrap();

        assert_eq!(header.manifest_offset(), -1);
        assert_eq!(header.manifest_length(), -8);
    }
}

use crate::delta::DecodeError;
use snafu::Snafu;
use std::path::PathBuf;

/// Errors that can occur during PSTREAM extraction.
///
/// Every variant is fatal to the run that produced it: nothing is retried,
/// and the extraction loop stops at the first failure.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ExtractError {
    #[snafu(display("destination {} is not empty", path.display()))]
    NonEmptyDestination { path: PathBuf },

    #[snafu(display("cannot inspect destination {}: {source}", path.display()))]
    InspectDestinationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("cannot create directory {}: {source}", path.display()))]
    CreateDirectoryFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("cannot create file {}: {source}", path.display()))]
    CreateFileFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("cannot write to {}: {source}", path.display()))]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid source range for {}: {source}", path.display()))]
    InvalidRange {
        path: PathBuf,
        source: pstream::RangeError,
    },

    #[snafu(display("failed to decode the manifest: {source}"))]
    DecodeManifestFailed { source: DecodeError },

    #[snafu(display("cannot read the decoded manifest {}: {source}", path.display()))]
    ReadManifestFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("malformed manifest: {source}"))]
    ParseManifestFailed {
        source: pstream::manifest::ManifestError,
    },

    #[snafu(display("failed to decode {}: {source}", path.display()))]
    DecodeEntryFailed {
        path: PathBuf,
        source: DecodeError,
    },
}

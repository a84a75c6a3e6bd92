use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::debug;

/// Errors surfaced by a delta decoder.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeError {
    #[snafu(display("no PA30 delta decoder is configured"))]
    Unavailable,

    #[snafu(display("cannot run delta tool '{}'", tool.display()))]
    SpawnFailed {
        tool: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("delta tool '{}' failed on {} ({status})", tool.display(), path.display()))]
    ToolFailed {
        tool: PathBuf,
        path: PathBuf,
        status: ExitStatus,
    },
}

/// Decodes PA30 delta streams in place.
///
/// `decode` is handed a file holding a delta against an implicit empty
/// baseline and must overwrite the same path with the reconstructed bytes.
/// Callers invoke it at most once per path and treat every failure as
/// fatal; implementations are never asked to retry.
pub trait DeltaDecoder {
    fn decode(&self, path: &Path) -> Result<(), DecodeError>;
}

impl<D: DeltaDecoder + ?Sized> DeltaDecoder for &D {
    fn decode(&self, path: &Path) -> Result<(), DecodeError> {
        (**self).decode(path)
    }
}

impl<D: DeltaDecoder + ?Sized> DeltaDecoder for Box<D> {
    fn decode(&self, path: &Path) -> Result<(), DecodeError> {
        (**self).decode(path)
    }
}

/// Decoder for hosts without a PA30 facility; fails on first use.
pub struct UnavailableDecoder;

impl DeltaDecoder for UnavailableDecoder {
    fn decode(&self, _path: &Path) -> Result<(), DecodeError> {
        Err(DecodeError::Unavailable)
    }
}

/// Decoder that shells out to an external delta tool.
///
/// The tool is invoked as `<tool> <path>` and must rewrite the file in
/// place; a non-zero exit status is reported as a decode failure.
pub struct CommandDecoder {
    tool: PathBuf,
}

impl CommandDecoder {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }
}

impl DeltaDecoder for CommandDecoder {
    fn decode(&self, path: &Path) -> Result<(), DecodeError> {
        debug!("decoding {} with {}", path.display(), self.tool.display());

        let status = Command::new(&self.tool)
            .arg(path)
            .status()
            .context(SpawnFailedSnafu { tool: &self.tool })?;

        snafu::ensure!(
            status.success(),
            ToolFailedSnafu {
                tool: &self.tool,
                path,
                status
            }
        );

        Ok(())
    }
}

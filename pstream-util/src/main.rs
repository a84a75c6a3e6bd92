mod cli;

use clap::Parser;
use cli::{Cli, Command};
use pstream_util::{
    CommandDecoder, ConsoleProgress, DeltaDecoder, PsfExtractor, SilentProgress,
    UnavailableDecoder, ensure_empty_destination,
};
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};

/// Top-level application errors for pstream-util.
#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to open PSTREAM container '{}'", path.display()))]
    OpenPsf {
        path: PathBuf,
        source: pstream_util::OpenPsfError,
    },

    #[snafu(display("failed to prepare destination"))]
    PrepareDestination { source: pstream_util::ExtractError },

    #[snafu(display("failed to extract container"))]
    Extract { source: pstream_util::ExtractError },

    #[snafu(display("failed to read manifest"))]
    ReadManifest { source: pstream_util::ExtractError },

    #[snafu(display("failed to create scratch directory"))]
    CreateScratchDir { source: std::io::Error },
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[snafu::report]
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .init();

    match cli.command {
        Command::Extract {
            psf_path,
            output,
            delta_tool,
            quiet,
        } => cmd_extract(&psf_path, &output, delta_tool.as_deref(), quiet),
        Command::Info { psf_path } => cmd_info(&psf_path),
        Command::List {
            psf_path,
            delta_tool,
        } => cmd_list(&psf_path, delta_tool.as_deref()),
    }
}

fn cmd_extract(path: &Path, output: &Path, delta_tool: Option<&Path>, quiet: bool) -> Result<()> {
    // Destination precondition runs first so a doomed invocation never
    // opens the container.
    ensure_empty_destination(output).context(PrepareDestinationSnafu)?;

    let psf = unsafe { pstream_util::open_psf(path).context(OpenPsfSnafu { path })? };
    let decoder = make_decoder(delta_tool);

    if !quiet {
        println!(
            "Extracting {} to {}...",
            path.display(),
            output.display()
        );
    }

    let start = std::time::Instant::now();

    // Extract based on verbosity.
    if quiet {
        let extractor = PsfExtractor::new(&psf, SilentProgress, &decoder);
        extractor.extract(output).context(ExtractSnafu)?;
    } else {
        let extractor = PsfExtractor::new(&psf, ConsoleProgress::new(), &decoder);
        extractor.extract(output).context(ExtractSnafu)?;
    }

    let elapsed = start.elapsed();

    if !quiet {
        println!("Done in {:.2}s.", elapsed.as_secs_f64());
    }

    Ok(())
}

fn cmd_info(path: &Path) -> Result<()> {
    let psf = unsafe { pstream_util::open_psf(path).context(OpenPsfSnafu { path })? };
    let source = psf.manifest_source();

    println!("PSTREAM container: {}", path.display());
    println!();
    println!("Container Size:   {} bytes", psf.size());
    println!("Manifest Offset:  0x{:X}", source.offset);
    println!("Manifest Length:  {} bytes", source.length);

    Ok(())
}

fn cmd_list(path: &Path, delta_tool: Option<&Path>) -> Result<()> {
    let psf = unsafe { pstream_util::open_psf(path).context(OpenPsfSnafu { path })? };
    let decoder = make_decoder(delta_tool);

    // The manifest is materialized and decoded in a scratch directory that
    // is removed when the listing is done.
    let scratch = tempfile::tempdir().context(CreateScratchDirSnafu)?;
    let extractor = PsfExtractor::new(&psf, SilentProgress, &decoder);
    let manifest = extractor
        .decode_manifest(scratch.path())
        .context(ReadManifestSnafu)?;

    println!("Entries in {}:", path.display());
    println!(
        "{:>6}  {:>6}  {:>12}  {:>12}  Path",
        "Index", "Type", "Offset", "Length"
    );
    println!("{:-<6}  {:-<6}  {:-<12}  {:-<12}  {:-<30}", "", "", "", "", "");

    for (index, entry) in manifest.entries().enumerate() {
        println!(
            "{:>6}  {:>6}  {:>12}  {:>12}  {}",
            index, entry.delta, entry.source.offset, entry.source.length, entry.name
        );
    }

    Ok(())
}

fn make_decoder(delta_tool: Option<&Path>) -> Box<dyn DeltaDecoder> {
    match delta_tool {
        Some(tool) => Box::new(CommandDecoder::new(tool)),
        None => Box::new(UnavailableDecoder),
    }
}

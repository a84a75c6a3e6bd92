use std::path::Path;

/// Trait for receiving extraction progress updates.
///
/// All methods have empty default implementations, so reporters only
/// implement the hooks they care about.
pub trait ExtractProgress {
    /// Called once the manifest is decoded, before the first entry.
    fn start(&self, _total: usize) {}

    /// Called when starting to extract an entry.
    fn entry_start(&self, _path: &Path, _index: usize, _total: usize) {}

    /// Called after every 100th entry completes, and after the final one.
    fn entries_extracted(&self, _processed: usize, _total: usize) {}

    /// Called when every entry has been extracted.
    fn completed(&self, _extracted: usize) {}
}

impl<P: ExtractProgress + ?Sized> ExtractProgress for &P {
    fn start(&self, total: usize) {
        (**self).start(total);
    }

    fn entry_start(&self, path: &Path, index: usize, total: usize) {
        (**self).entry_start(path, index, total);
    }

    fn entries_extracted(&self, processed: usize, total: usize) {
        (**self).entries_extracted(processed, total);
    }

    fn completed(&self, extracted: usize) {
        (**self).completed(extracted);
    }
}

/// A no-op progress implementation that discards all updates.
pub struct SilentProgress;

impl ExtractProgress for SilentProgress {}

/// Console progress reporter using an indicatif progress bar.
///
/// The bar redraws from the batched `entries_extracted` updates rather than
/// per file, so large containers do not thrash stderr.
#[cfg(feature = "cli")]
pub struct ConsoleProgress {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            bar: indicatif::ProgressBar::hidden(),
        }
    }
}

#[cfg(feature = "cli")]
impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ExtractProgress for ConsoleProgress {
    fn start(&self, total: usize) {
        self.bar
            .set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} files [{elapsed_precise}]")
                .unwrap()
                .progress_chars("━╸─"),
        );
        self.bar.reset();
    }

    fn entries_extracted(&self, processed: usize, _total: usize) {
        self.bar.set_position(processed as u64);
    }

    fn completed(&self, extracted: usize) {
        self.bar.finish_and_clear();
        println!("Extracted {} files.", extracted);
    }
}

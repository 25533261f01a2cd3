//! Progress reporting
//!
//! Formatting is pure; where the text goes is decided by the
//! [`ProgressObserver`] handed to a long-running operation.

use std::io::Write;

/// Width of the progress bar in cells
pub const BAR_WIDTH: u64 = 40;

/// Render one carriage-return terminated progress line
///
/// `total == 0` renders a complete bar.
///
/// ```
/// use cairn_core::progress::format_progress;
///
/// let line = format_progress(4, 1);
/// assert!(line.starts_with("Processed 1 of 4 files"));
/// assert!(line.ends_with("|==========------------------------------|\r"));
/// ```
pub fn format_progress(total: u64, processed: u64) -> String {
    let filled = if total == 0 {
        BAR_WIDTH
    } else {
        (processed.saturating_mul(BAR_WIDTH) / total).min(BAR_WIDTH)
    };
    let summary = format!("Processed {} of {} files", processed, total);
    format!(
        "{:<30}  |{}{}|\r",
        summary,
        "=".repeat(filled as usize),
        "-".repeat((BAR_WIDTH - filled) as usize)
    )
}

/// Render the running tally printed while a manifest is built
pub fn format_load_progress(files: u64, bytes: u64) -> String {
    format!("Loaded {} files {} bytes.\r", files, bytes)
}

/// Human readable byte count, e.g. `1.50KB`
pub fn pretty_bytes(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut idx = 0;
    while size > 1024.0 && idx + 1 < SUFFIXES.len() {
        size /= 1024.0;
        idx += 1;
    }
    format!("{:.2}{}", size, SUFFIXES[idx])
}

/// One progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A manifest walk has hashed `files` files totalling `bytes` bytes
    Loaded { files: u64, bytes: u64 },
    /// A driver has handled `processed` of `total` manifest entries
    Processed { processed: u64, total: u64 },
}

impl ProgressEvent {
    pub fn render(&self) -> String {
        match *self {
            ProgressEvent::Loaded { files, bytes } => format_load_progress(files, bytes),
            ProgressEvent::Processed { processed, total } => format_progress(total, processed),
        }
    }
}

/// Receiver of progress notifications
pub trait ProgressObserver {
    fn on_event(&mut self, event: ProgressEvent);

    /// Called once when the operation is over
    fn finish(&mut self) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_event(&mut self, _event: ProgressEvent) {}
}

/// Records events, mostly useful in tests
impl ProgressObserver for Vec<ProgressEvent> {
    fn on_event(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Redraws a single terminal line per event
///
/// Write failures are ignored; progress output is best effort.
pub struct TerminalProgress<W: Write> {
    out: W,
    dirty: bool,
}

impl TerminalProgress<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out, dirty: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressObserver for TerminalProgress<W> {
    fn on_event(&mut self, event: ProgressEvent) {
        let _ = self.out.write_all(event.render().as_bytes());
        let _ = self.out.flush();
        self.dirty = true;
    }

    fn finish(&mut self) {
        if self.dirty {
            let _ = self.out.write_all(b"\n");
            let _ = self.out.flush();
            self.dirty = false;
        }
    }
}

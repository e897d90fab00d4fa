//! Progress reporting on stderr using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait, with phases
//! named `walking`, `hashing` and `verifying`. [`Progress`] renders them as
//! terminal bars; tests can plug in their own implementation to observe the
//! pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Receives progress events from the duplicate finder.
///
/// Callbacks may run concurrently from hashing worker threads.
pub trait ProgressCallback: Send + Sync {
    /// A phase started. `total` is the number of items, or 0 if unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Item number `current` (1-based) of the active phase is being processed.
    fn on_progress(&self, current: usize, path: &str);

    /// An item of `bytes` bytes finished processing.
    fn on_item_completed(&self, _bytes: u64) {}

    /// A phase completed.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status message.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress reporter.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    verifying: Mutex<Option<ProgressBar>>,
    bytes_done: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a reporter. With `quiet` set, nothing is drawn.
    ///
    /// ```
    /// use dupehunter::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            verifying: Mutex::new(None),
            bytes_done: AtomicU64::new(0),
            quiet,
        }
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            "walking" => Some(&self.walking),
            "hashing" => Some(&self.hashing),
            "verifying" => Some(&self.verifying),
            _ => None,
        }
    }

    /// The most recently started bar that is still running.
    fn active_bar(&self) -> Option<ProgressBar> {
        [&self.verifying, &self.hashing, &self.walking]
            .into_iter()
            .find_map(|slot| slot.lock().ok().and_then(|bar| bar.clone()))
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        let Some(slot) = self.slot(phase) else {
            log::debug!("Unknown progress phase: {phase}");
            return;
        };

        let pb = if phase == "walking" {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            pb
        };
        pb.set_message(match phase {
            "walking" => "Walking directory",
            "hashing" => "Hashing",
            _ => "Verifying",
        });
        self.bytes_done.store(0, Ordering::Relaxed);

        if let Ok(mut guard) = slot.lock() {
            *guard = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes_done.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        let Some(pb) = self
            .slot(phase)
            .and_then(|slot| slot.lock().ok().and_then(|mut bar| bar.take()))
        else {
            return;
        };

        let bytes = ByteSize::b(self.bytes_done.load(Ordering::Relaxed));
        match phase {
            "walking" => pb.finish_with_message("Walking complete"),
            "hashing" => pb.finish_with_message(format!("Hashing complete ({bytes} read)")),
            _ => pb.finish_with_message(format!("Verification complete ({bytes} compared)")),
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_message(message.to_string());
        }
    }
}

/// Shorten a path to its file name when it is longer than `max_len`.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}

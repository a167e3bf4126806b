//! Progress reporting with indicatif.
//!
//! The finder reports three phases through [`ProgressCallback`]:
//! `walking` (count unknown, spinner), `hashing` and `verifying` (bars).
//! Bars draw on stderr and are hidden when it is not a terminal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress updates from the duplicate finder.
pub trait ProgressCallback: Send + Sync {
    /// A phase begins; `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// `current` items done (1-based), `path` is the latest one.
    fn on_progress(&self, current: usize, path: &str);

    /// An item of `bytes` bytes was read.
    fn on_item_completed(&self, _bytes: u64) {}

    fn on_phase_end(&self, phase: &str);

    /// Free-form status line.
    fn on_message(&self, _message: &str) {}
}

/// Terminal progress bars.
pub struct Progress {
    multi: MultiProgress,
    active: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a reporter; `quiet` disables all drawing.
    ///
    /// ```
    /// use ftwin::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let target = if quiet {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            active: Mutex::new(None),
            bytes: AtomicU64::new(0),
            quiet,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
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
        pb.set_message(phase_label(phase).to_string());
        self.bytes.store(0, Ordering::Relaxed);
        *self.active() = Some(pb);
    }

    fn on_progress(&self, current: usize, path: &str) {
        if let Some(pb) = self.active().as_ref() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, phase: &str) {
        if let Some(pb) = self.active().take() {
            let read = self.bytes.load(Ordering::Relaxed);
            if read > 0 {
                pb.finish_with_message(format!(
                    "{} done, {} read",
                    phase_label(phase),
                    HumanBytes(read)
                ));
            } else {
                pb.finish_with_message(format!("{} done", phase_label(phase)));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(pb) = self.active().as_ref() {
            pb.set_message(message.to_string());
        }
    }
}

fn phase_label(phase: &str) -> &str {
    match phase {
        "walking" => "Walking",
        "hashing" => "Hashing",
        "verifying" => "Verifying",
        other => other,
    }
}

/// Shorten a path to its file name when longer than `max_len` bytes.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.len() <= max_len {
        return path.to_string();
    }

    let name = path.rsplit(['/', ':']).next().unwrap_or(path);
    if name.len() + 4 <= max_len {
        return format!(".../{name}");
    }

    let tail: String = name
        .chars()
        .rev()
        .take(max_len.saturating_sub(3))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{tail}")
}

//! Progress reporting and cancellation.
//!
//! Workers call [`Progress::report`] after every chunk. Returning `false`
//! asks the run to stop at the next chunk boundary.

use crate::coords::Dimension;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Converting the chunks of one dimension.
    Chunks(Dimension),
    /// Writing world-level records.
    Finalize,
    /// Flushing and compacting the output store.
    Compact,
    /// Zipping the `.mcworld` archive.
    Package,
}

impl Phase {
    fn unit(self) -> &'static str {
        match self {
            Phase::Chunks(_) => "chunks",
            Phase::Finalize => "steps",
            Phase::Compact => "slices",
            Phase::Package => "files",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Chunks(dimension) => write!(f, "Converting {dimension}"),
            Phase::Finalize => f.write_str("Writing world records"),
            Phase::Compact => f.write_str("Compacting"),
            Phase::Package => f.write_str("Packaging"),
        }
    }
}

pub trait Progress: Sync {
    /// Reports `done` of `total` units in `phase`. `false` cancels the run.
    fn report(&self, phase: Phase, done: u64, total: u64) -> bool;
}

/// Ignores every report and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _phase: Phase, _done: u64, _total: u64) -> bool {
        true
    }
}

/// Any `Fn(Phase, done, total) -> bool` is a progress sink.
impl<F> Progress for F
where
    F: Fn(Phase, u64, u64) -> bool + Sync,
{
    fn report(&self, phase: Phase, done: u64, total: u64) -> bool {
        self(phase, done, total)
    }
}

/// One terminal progress bar per phase.
#[derive(Default)]
pub struct ConsoleProgress {
    current: Mutex<Option<(Phase, ProgressBar)>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn bar(phase: Phase, total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:45.white/black}}] {{pos}}/{{len}} {} ({{eta}})",
            phase.unit()
        );
        if let Ok(style) = ProgressStyle::default_bar().template(&template) {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar
    }

    /// Finishes the bar that is currently shown, if any.
    pub fn finish(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, bar)) = current.take() {
            bar.finish();
        }
    }
}

impl Progress for ConsoleProgress {
    fn report(&self, phase: Phase, done: u64, total: u64) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_mut() {
            Some((shown, bar)) if *shown == phase => {
                bar.set_length(total);
                bar.set_position(done);
            }
            _ => {
                if let Some((_, bar)) = current.take() {
                    bar.finish();
                }
                let bar = Self::bar(phase, total);
                bar.set_position(done);
                *current = Some((phase, bar));
            }
        }
        true
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_closures_report_and_cancel() {
        let calls = AtomicU64::new(0);
        let stop_after_two = |_: Phase, done: u64, _: u64| {
            calls.fetch_add(1, Ordering::Relaxed);
            done < 2
        };
        assert!(stop_after_two.report(Phase::Chunks(Dimension::Overworld), 1, 10));
        assert!(!stop_after_two.report(Phase::Chunks(Dimension::Overworld), 2, 10));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert!(NoProgress.report(Phase::Compact, 0, 0));
    }

    #[test]
    fn test_console_progress_switches_bars_between_phases() {
        let progress = ConsoleProgress::new();
        assert!(progress.report(Phase::Chunks(Dimension::Nether), 3, 8));
        assert!(progress.report(Phase::Compact, 1, 256));
        let current = progress.current.lock().unwrap();
        let (phase, bar) = current.as_ref().unwrap();
        assert_eq!(*phase, Phase::Compact);
        assert_eq!(bar.length(), Some(256));
    }
}

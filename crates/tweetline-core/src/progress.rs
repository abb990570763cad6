//! Progress reporting for TTY and non-TTY environments.
//!
//! TTY mode: one indicatif bar tracking accepted events.
//! Non-TTY mode: hidden bars; logs carry the status instead.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Bounded-session style: events out of the configured cap
fn capped_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:<10.cyan} {bar:30.green/dim} {human_pos:>9}/{human_len:9} {eta:>4} {wide_msg:.dim}")
        .expect("invalid template")
        .progress_chars("--")
}

/// Unbounded-session style: a counting spinner
fn unbounded_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix:<10.cyan} {human_pos} events {wide_msg:.dim}")
        .expect("invalid template")
}

/// Central progress context managing the multi-progress area.
pub struct ProgressContext {
    multi: MultiProgress,
    is_tty: bool,
}

impl ProgressContext {
    /// Create new context, detecting TTY automatically.
    pub fn new() -> Self {
        let is_tty = std::io::stderr().is_terminal();
        Self {
            multi: MultiProgress::new(),
            is_tty,
        }
    }

    /// Event-count bar for a capture session.
    ///
    /// With a cap: a bounded bar. Without: a counting spinner.
    /// Non-TTY: hidden (no-op).
    pub fn capture_bar(&self, cap: Option<u64>) -> ProgressBar {
        if !self.is_tty {
            return ProgressBar::hidden();
        }

        let pb = match cap {
            Some(total) => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(capped_style());
                pb
            }
            None => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(unbounded_style());
                pb.enable_steady_tick(Duration::from_millis(80));
                pb
            }
        };
        pb.set_prefix("capture");
        pb
    }

    /// Print a line above managed progress bars (avoids interference).
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_tty {
            let _ = self.multi.println(msg);
        } else {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Whether running in TTY mode.
    pub fn is_tty(&self) -> bool {
        self.is_tty
    }

    /// Get reference to `MultiProgress` for log bridge.
    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }
}

impl Default for ProgressContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Format number with thousand separators.
pub fn fmt_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

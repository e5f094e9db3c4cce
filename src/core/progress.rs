// ─── Progress Reporting ───
// The pipeline reports through `InstallObserver` and never touches a concrete
// UI channel. `TracingObserver` is the default sink.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;

/// Receives status phrases, progress fractions and log lines from the core.
pub trait InstallObserver: Send + Sync {
    /// Short phase description ("Downloading libraries...").
    fn on_status(&self, text: &str);

    /// Completion in `0.0..=1.0` for the current phase.
    fn on_progress(&self, fraction: f64);

    /// Detailed line for a log view (recoverable errors, game output).
    fn on_log(&self, line: &str);
}

/// Forwards everything to `tracing`, throttling progress.
pub struct TracingObserver {
    throttle: ProgressThrottle,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self {
            throttle: ProgressThrottle::new(Duration::from_millis(500)),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallObserver for TracingObserver {
    fn on_status(&self, text: &str) {
        info!(target: "status", "{}", text);
    }

    fn on_progress(&self, fraction: f64) {
        if self.throttle.admit(fraction) {
            info!(target: "progress", "{:.0}%", fraction * 100.0);
        }
    }

    fn on_log(&self, line: &str) {
        info!(target: "log", "{}", line);
    }
}

/// Lets at most one progress update through per interval. The endpoints
/// `0.0` and `1.0` always pass.
pub struct ProgressThrottle {
    last: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl ProgressThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last: Mutex::new(None),
            min_interval,
        }
    }

    pub fn admit(&self, fraction: f64) -> bool {
        let now = Instant::now();
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let is_endpoint = fraction <= 0.0 || fraction >= 1.0;
        let elapsed = last.map_or(true, |at| now.duration_since(at) >= self.min_interval);
        if is_endpoint || elapsed {
            *last = Some(now);
            true
        } else {
            false
        }
    }
}

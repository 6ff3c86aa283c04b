// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::sys::time::Duration;

/// Tuning knobs for a [crate::timer::DrawcallTimer].
#[derive(Debug, Clone, PartialEq)]
pub struct TimerConfig {
    /// Emit a frame/shader report through the debug sink every this many frames.
    ///
    /// Zero disables periodic reports.
    pub log_interval: u64,
    /// Upper bound on how long a frame boundary may block waiting for the
    /// validity result of the frame being resolved.
    pub validity_timeout: Duration,
    /// How long to wait between validity polls.
    pub validity_poll_interval: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            log_interval: 30,
            validity_timeout: Duration::from_millis(100),
            validity_poll_interval: Duration::from_millis(1),
        }
    }
}

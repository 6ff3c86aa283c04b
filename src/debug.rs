// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The diagnostic channel.

Hosts usually want the timer's chatter in their own console, so every engine owns a
[DebugSink]: a single-string callback.  The default sink forwards to logwise.
*/

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A callback receiving every diagnostic message of one engine instance.
#[derive(Clone)]
pub struct DebugSink(Arc<dyn Fn(&str) + Send + Sync>);

impl DebugSink {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        DebugSink(Arc::new(f))
    }

    /// A sink that routes messages into logwise.
    pub fn logwise() -> Self {
        DebugSink::new(|message| {
            logwise::info_sync!("render_timing: {message}", message = message.to_owned());
        })
    }

    /// A sink that drops everything.
    pub fn silent() -> Self {
        DebugSink::new(|_| {})
    }

    pub fn emit(&self, message: &str) {
        (self.0)(message)
    }
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::logwise()
    }
}

impl Debug for DebugSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSink").finish_non_exhaustive()
    }
}

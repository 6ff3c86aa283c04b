// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Frame windows on wgpu.

wgpu exposes no disjoint query; its timestamps are already normalised by the timestamp
period.  A window is therefore valid as soon as the GPU finished the work submitted up to
its end.  Each opening bumps a generation so a late completion from an abandoned window
is not mistaken for the current one.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct WgpuValidity {
    generation: AtomicU64,
    completed: Arc<AtomicU64>,
}

impl WgpuValidity {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn begin(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn end(&self, queue: &wgpu::Queue) {
        let generation = self.generation.load(Ordering::Relaxed);
        let move_completed = self.completed.clone();
        queue.on_submitted_work_done(move || {
            move_completed.store(generation, Ordering::Release);
        });
    }

    pub(super) fn is_complete(&self) -> bool {
        let generation = self.generation.load(Ordering::Relaxed);
        generation != 0 && self.completed.load(Ordering::Acquire) == generation
    }
}

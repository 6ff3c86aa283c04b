// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The drawcall timing engine.

# Protocol

The render thread drives the engine with three calls:

1.  [DrawcallTimer::start] right before a drawcall, carrying the bound shaders.
2.  [DrawcallTimer::end] right after it.
3.  [DrawcallTimer::advance_frame] once per frame boundary.

Start/end pairs do not nest.  A start while a drawcall is already being measured, or an
end without a start, is reported and ignored rather than corrupting the bookkeeping.

# Frame resolution

Frames are double buffered (see [crate::frame_ring]).  At each boundary the active slot
is closed and the next slot's window opens immediately, so consecutive windows neither
overlap nor leave a gap.  Then the engine waits, boundedly, until the backend can say
whether the closed window stayed on a stable GPU clock.  This wait is the only blocking
point of the engine.

A disjoint window discards the whole frame: published results keep their previous
values.  Otherwise every drawcall's delta is read without blocking (results that are
not ready count as zero), summed per shader combination, converted to milliseconds and
published, replacing the previous frame's map wholesale.  Either way the slot's query
pairs go back to the pool.
*/

use crate::backend::{FrameValidity, TimerBackend, counter_mask, masked_delta};
use crate::config::TimerConfig;
use crate::debug::DebugSink;
use crate::error::InitError;
use crate::frame_ring::{DrawcallRef, FrameRing, FrameTable, RING_DEPTH};
use crate::query_pool::{QueryPair, QueryPool};
use crate::shader::{ShaderCombinationKey, ShaderNames};
use crate::sys::time::Instant;
use crate::timings::ShaderTimes;

/// Where the current drawcall stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureState {
    /// No drawcall is open.
    Idle,
    /// A start timestamp was issued; the end is pending.
    Measuring,
    /// A drawcall is open but could not be timed (no query object).
    Unmeasured,
}

/**
The engine's object-safe face, one per graphics device.

Hosts that pick the backend at runtime hold a `Box<dyn FrameTimer>`.
*/
pub trait FrameTimer {
    fn start(&mut self, key: ShaderCombinationKey);
    fn end(&mut self);
    fn advance_frame(&mut self);
    /// The most recently published per-shader times.  Empty until a frame resolved.
    fn shader_times(&self) -> &ShaderTimes;
    /// The most recently published whole-frame GPU time in milliseconds, 0 if none.
    fn last_frame_gpu_time(&self) -> f64;
    fn set_debug_function(&mut self, debug: DebugSink);
    /// False when construction failed; every call is then a no-op.
    fn is_functional(&self) -> bool;
}

impl std::fmt::Debug for dyn FrameTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTimer")
            .field("functional", &self.is_functional())
            .finish_non_exhaustive()
    }
}

struct FrameSlot<Q, V> {
    table: FrameTable<Q>,
    /// Brackets the whole frame.
    bracket: QueryPair<Q>,
    validity: V,
}

struct Active<B: TimerBackend> {
    backend: B,
    pool: QueryPool<B::Query>,
    ring: FrameRing<FrameSlot<B::Query, B::Validity>>,
}

impl<B: TimerBackend> Active<B> {
    fn new(mut backend: B) -> Result<Self, InitError> {
        let mut slots = Vec::with_capacity(RING_DEPTH);
        for _ in 0..RING_DEPTH {
            slots.push(FrameSlot {
                table: FrameTable::new(),
                bracket: backend.create_query_pair()?,
                validity: backend.create_validity_query()?,
            });
        }
        let ring = FrameRing::new(slots);
        //open the first frame window
        let first = ring.current();
        backend.begin_validity(&first.validity);
        backend.write_frame_timestamp(&first.bracket.start);
        Ok(Active {
            backend,
            pool: QueryPool::new(),
            ring,
        })
    }
}

/**
Times drawcalls and whole frames on one graphics device.

Generic over the [TimerBackend] that speaks to the graphics API.
*/
pub struct DrawcallTimer<B: TimerBackend> {
    //None when the device could not be set up
    active: Option<Active<B>>,
    config: TimerConfig,
    debug: DebugSink,
    state: MeasureState,
    current: Option<DrawcallRef>,
    shader_times: ShaderTimes,
    last_frame_time: f64,
    discarded_frames: u64,
}

impl<B: TimerBackend> DrawcallTimer<B> {
    pub fn new(backend: B, debug: DebugSink) -> Self {
        Self::with_config(backend, TimerConfig::default(), debug)
    }

    pub fn with_config(backend: B, config: TimerConfig, debug: DebugSink) -> Self {
        let name = backend.name().to_owned();
        let active = match Active::new(backend) {
            Ok(active) => {
                logwise::info_sync!("drawcall timer started on {name}", name = name);
                Some(active)
            }
            Err(e) => {
                debug.emit(&format!("Can't start drawcall timer on {name}: {e}"));
                None
            }
        };
        Self::from_parts(active, config, debug)
    }

    /// An engine for a device that never came up.  Every call is a no-op.
    pub fn disabled(config: TimerConfig, debug: DebugSink) -> Self {
        Self::from_parts(None, config, debug)
    }

    fn from_parts(active: Option<Active<B>>, config: TimerConfig, debug: DebugSink) -> Self {
        DrawcallTimer {
            active,
            config,
            debug,
            state: MeasureState::Idle,
            current: None,
            shader_times: ShaderTimes::new(),
            last_frame_time: 0.0,
            discarded_frames: 0,
        }
    }

    /**
    Opens timing for a drawcall using the shaders in `key`.

    Takes a query pair from the pool (or allocates one), issues its start timestamp and
    files it under `key` in the active frame.  If no query object can be had the
    drawcall simply goes untimed.
    */
    pub fn start(&mut self, key: ShaderCombinationKey) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        //an untimed drawcall is still open until its end
        if self.state != MeasureState::Idle {
            self.debug
                .emit("start called while a drawcall is already being timed; ignoring it");
            return;
        }
        let Active { backend, pool, ring } = active;
        let queries = match pool.acquire_with(|| backend.create_query_pair()) {
            Ok(queries) => queries,
            Err(e) => {
                self.debug.emit(&format!("Could not create a query object: {e}"));
                self.state = MeasureState::Unmeasured;
                return;
            }
        };
        backend.write_timestamp(&queries.start);
        self.current = Some(ring.current_mut().table.record(key, queries));
        self.state = MeasureState::Measuring;
    }

    /// Closes timing for the drawcall opened by the last [Self::start].
    pub fn end(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        match self.state {
            MeasureState::Idle => {
                self.debug.emit("end called without a matching start; ignoring it");
            }
            MeasureState::Unmeasured => {
                self.state = MeasureState::Idle;
            }
            MeasureState::Measuring => {
                let Active { backend, ring, .. } = active;
                let drawcall = match self.current.take() {
                    Some(current) => ring.current_mut().table.get_mut(current),
                    None => None,
                };
                match drawcall {
                    Some(drawcall) => {
                        backend.write_timestamp(&drawcall.queries.end);
                        drawcall.closed = true;
                    }
                    None => self.debug.emit("lost track of the open drawcall"),
                }
                self.state = MeasureState::Idle;
            }
        }
    }

    /**
    Marks a frame boundary.

    Resolves the frame that just ended, then rotates to the next ring slot.
    */
    pub fn advance_frame(&mut self) {
        if self.active.is_none() {
            return;
        }
        if self.state == MeasureState::Measuring {
            self.debug
                .emit("frame ended while a drawcall was being timed; dropping that drawcall");
        }
        self.state = MeasureState::Idle;
        self.current = None;

        self.resolve_queries();
        if let Some(active) = self.active.as_mut() {
            active.ring.advance();
        }
    }

    fn resolve_queries(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Active { backend, pool, ring } = active;
        let frame = ring.frame_counter();
        let (closing, opening) = ring.current_and_next_mut();

        backend.write_frame_timestamp(&closing.bracket.end);
        backend.end_validity(&closing.validity);
        backend.begin_validity(&opening.validity);
        backend.write_frame_timestamp(&opening.bracket.start);

        let validity = match wait_for_validity(backend, &closing.validity, &self.config) {
            Some(validity) if validity.disjoint => {
                self.debug.emit("Disjoint! Throwing away current frame");
                None
            }
            Some(validity) if !validity.timebase.is_usable() => {
                self.debug.emit(&format!(
                    "Unusable timebase {:?}; throwing away current frame",
                    validity.timebase
                ));
                None
            }
            Some(validity) => Some(validity),
            None => {
                self.debug
                    .emit("Timed out waiting for frame results; throwing away current frame");
                None
            }
        };
        let report = self.config.log_interval != 0 && frame % self.config.log_interval == 0;
        let mask = counter_mask(backend.counter_bits());

        let Some(validity) = validity else {
            self.discarded_frames += 1;
            for (_, drawcalls) in closing.table.drain() {
                for drawcall in drawcalls {
                    release_pair(backend, pool, drawcall.queries);
                }
            }
            return;
        };

        let frame_start = backend.read_timestamp(&closing.bracket.start);
        let frame_end = backend.read_timestamp(&closing.bracket.end);
        match (frame_start, frame_end) {
            (Some(start), Some(end)) => {
                self.last_frame_time = validity.timebase.ticks_to_ms(masked_delta(start, end, mask));
                if report {
                    self.debug
                        .emit(&format!("The frame took {}ms total", self.last_frame_time));
                }
            }
            _ => self
                .debug
                .emit("Frame timestamps were not available; keeping the previous frame time"),
        }

        let resolved = collect_shader_times(backend, pool, &mut closing.table, &validity, mask);
        if report {
            for (names, time) in &resolved {
                if *time > 0.0 {
                    self.debug.emit(&format!("Shader {names} took {time}ms"));
                }
            }
        }
        logwise::trace_sync!(
            "resolved frame {frame}: {combinations} shader combinations",
            frame = frame,
            combinations = resolved.len()
        );
        self.shader_times = resolved;
    }

    pub fn shader_times(&self) -> &ShaderTimes {
        &self.shader_times
    }

    pub fn last_frame_gpu_time(&self) -> f64 {
        self.last_frame_time
    }

    pub fn set_debug_function(&mut self, debug: DebugSink) {
        self.debug = debug;
    }

    pub fn is_functional(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> MeasureState {
        self.state
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Frames completed so far.
    pub fn frame_counter(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.ring.frame_counter())
    }

    /// The ring slot accepting drawcalls.
    pub fn ring_index(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.ring.index())
    }

    /// The ring slot the next frame will use.
    pub fn next_ring_index(&self) -> usize {
        self.active.as_ref().map_or(1 % RING_DEPTH, |a| a.ring.next_index())
    }

    /// Frames thrown away because of a disjoint clock or missing results.
    pub fn discarded_frames(&self) -> u64 {
        self.discarded_frames
    }

    /// Query pairs waiting in the pool.
    pub fn pooled_query_pairs(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.pool.available())
    }

    /// Drawcall query pairs allocated over the engine's lifetime.
    pub fn allocated_query_pairs(&self) -> usize {
        self.active.as_ref().map_or(0, |a| a.pool.created())
    }

    /// Drawcalls recorded in unresolved frames.
    pub fn pending_drawcalls(&self) -> usize {
        self.active
            .as_ref()
            .map_or(0, |a| a.ring.slots().map(|s| s.table.drawcall_count()).sum::<usize>())
    }

    pub fn backend(&self) -> Option<&B> {
        self.active.as_ref().map(|a| &a.backend)
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.active.as_mut().map(|a| &mut a.backend)
    }
}

impl<B: TimerBackend> std::fmt::Debug for DrawcallTimer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawcallTimer")
            .field("backend", &self.backend().map(|b| b.name()))
            .field("state", &self.state)
            .field("frame_counter", &self.frame_counter())
            .field("pending_drawcalls", &self.pending_drawcalls())
            .field("discarded_frames", &self.discarded_frames)
            .finish_non_exhaustive()
    }
}

/// Polls `validity` until the backend answers or the configured timeout passes.
fn wait_for_validity<B: TimerBackend>(
    backend: &mut B,
    validity: &B::Validity,
    config: &TimerConfig,
) -> Option<FrameValidity> {
    let started = Instant::now();
    loop {
        if let Some(result) = backend.poll_validity(validity) {
            return Some(result);
        }
        if started.elapsed() >= config.validity_timeout {
            return None;
        }
        backend.wait_for_results(config.validity_poll_interval);
    }
}

/// Hands a pair back to the backend for cleanup, then to the pool.
fn release_pair<B: TimerBackend>(
    backend: &mut B,
    pool: &mut QueryPool<B::Query>,
    queries: QueryPair<B::Query>,
) {
    backend.recycle_query(&queries.start);
    backend.recycle_query(&queries.end);
    pool.release(queries);
}

/**
Sums each shader combination's closed drawcalls and returns every pair to the pool.

Combinations whose drawcalls were all dropped get no entry.
*/
fn collect_shader_times<B: TimerBackend>(
    backend: &mut B,
    pool: &mut QueryPool<B::Query>,
    table: &mut FrameTable<B::Query>,
    validity: &FrameValidity,
    mask: u64,
) -> ShaderTimes {
    let mut resolved = ShaderTimes::new();
    if table.is_empty() {
        return resolved;
    }
    for (key, drawcalls) in table.drain() {
        let mut ticks: u64 = 0;
        let mut closed = 0;
        for drawcall in drawcalls {
            if drawcall.closed {
                closed += 1;
                let start = backend.read_timestamp(&drawcall.queries.start);
                let end = backend.read_timestamp(&drawcall.queries.end);
                //not ready yet counts as nothing; we don't wait per drawcall
                if let (Some(start), Some(end)) = (start, end) {
                    ticks = ticks.saturating_add(masked_delta(start, end, mask));
                }
            }
            release_pair(backend, pool, drawcall.queries);
        }
        if closed == 0 {
            continue;
        }
        let names = ShaderNames::resolve(&key, |stage, handle| backend.shader_name(stage, handle));
        *resolved.entry(names).or_insert(0.0) += validity.timebase.ticks_to_ms(ticks);
    }
    resolved
}

impl<B: TimerBackend> FrameTimer for DrawcallTimer<B> {
    fn start(&mut self, key: ShaderCombinationKey) {
        DrawcallTimer::start(self, key)
    }

    fn end(&mut self) {
        DrawcallTimer::end(self)
    }

    fn advance_frame(&mut self) {
        DrawcallTimer::advance_frame(self)
    }

    fn shader_times(&self) -> &ShaderTimes {
        DrawcallTimer::shader_times(self)
    }

    fn last_frame_gpu_time(&self) -> f64 {
        DrawcallTimer::last_frame_gpu_time(self)
    }

    fn set_debug_function(&mut self, debug: DebugSink) {
        DrawcallTimer::set_debug_function(self, debug)
    }

    fn is_functional(&self) -> bool {
        DrawcallTimer::is_functional(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::manual::ManualDevice;
    use crate::shader::ShaderHandle;
    use std::sync::{Arc, Mutex};

    fn key(vertex: u64, fragment: u64) -> ShaderCombinationKey {
        ShaderCombinationKey::new(ShaderHandle::new(vertex), ShaderHandle::new(fragment))
    }

    fn recording_sink() -> (DebugSink, Arc<Mutex<Vec<String>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let move_messages = messages.clone();
        let sink = DebugSink::new(move |m| move_messages.lock().unwrap().push(m.to_owned()));
        (sink, messages)
    }

    #[test]
    fn construction_opens_the_first_window() {
        let device = ManualDevice::new();
        let timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        assert!(timer.is_functional());
        assert_eq!(timer.frame_counter(), 0);
        assert_eq!(timer.ring_index(), 0);
        assert_eq!(timer.next_ring_index(), 1);
        //two bracket pairs and two validity objects, nothing else
        assert_eq!(device.query_objects(), 4);
        assert_eq!(device.validity_objects(), 2);
        assert!(timer.shader_times().is_empty());
        assert_eq!(timer.last_frame_gpu_time(), 0.0);
    }

    #[test]
    fn failed_construction_is_inert() {
        let device = ManualDevice::new();
        device.fail_next_allocations(1);
        let (sink, messages) = recording_sink();
        let mut timer = DrawcallTimer::new(device.backend(), sink);
        assert!(!timer.is_functional());
        assert!(messages.lock().unwrap()[0].starts_with("Can't start drawcall timer"));

        timer.start(key(1, 2));
        timer.end();
        timer.advance_frame();
        assert_eq!(timer.frame_counter(), 0);
        assert!(timer.shader_times().is_empty());
        assert_eq!(messages.lock().unwrap().len(), 1);
    }

    #[test]
    fn ring_follows_frames() {
        let device = ManualDevice::new();
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        for frame in 0..5u64 {
            assert_eq!(timer.ring_index() as u64, frame % RING_DEPTH as u64);
            timer.advance_frame();
        }
        assert_eq!(timer.frame_counter(), 5);
    }

    #[test]
    fn nested_start_is_ignored() {
        let device = ManualDevice::new();
        let (sink, messages) = recording_sink();
        let mut timer = DrawcallTimer::new(device.backend(), sink);
        timer.start(key(1, 2));
        timer.start(key(3, 4));
        assert_eq!(timer.pending_drawcalls(), 1);
        assert_eq!(timer.state(), MeasureState::Measuring);
        timer.end();
        timer.end();
        assert_eq!(timer.state(), MeasureState::Idle);
        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("start called while"));
        assert!(messages[1].starts_with("end called without"));
    }

    #[test]
    fn unclosed_drawcall_is_dropped() {
        let device = ManualDevice::new();
        let (sink, messages) = recording_sink();
        let mut timer = DrawcallTimer::new(device.backend(), sink);
        timer.start(key(1, 2));
        device.advance(500);
        timer.advance_frame();
        assert_eq!(timer.state(), MeasureState::Idle);
        //nothing was measured, so the combination is not reported at all
        assert!(timer.shader_times().is_empty());
        assert_eq!(timer.pooled_query_pairs(), 1);
        assert!(messages.lock().unwrap()[0].starts_with("frame ended while"));
    }

    #[test]
    fn allocation_failure_skips_one_drawcall() {
        let device = ManualDevice::new();
        let (sink, messages) = recording_sink();
        let mut timer = DrawcallTimer::new(device.backend(), sink);
        device.fail_next_allocations(1);
        timer.start(key(1, 2));
        assert_eq!(timer.state(), MeasureState::Unmeasured);
        timer.end();
        assert_eq!(timer.state(), MeasureState::Idle);
        assert_eq!(
            messages.lock().unwrap().as_slice(),
            ["Could not create a query object: Out of memory".to_string()]
        );

        timer.start(key(1, 2));
        device.advance(1_000);
        timer.end();
        timer.advance_frame();
        assert_eq!(timer.shader_times().values().sum::<f64>(), 1.0);
        assert_eq!(timer.allocated_query_pairs(), 1);
    }

    #[test]
    fn dropped_drawcall_does_not_hide_closed_ones() {
        let device = ManualDevice::new();
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        timer.start(key(1, 2));
        device.advance(2_000);
        timer.end();
        timer.start(key(1, 2));
        device.advance(500);
        timer.start(key(3, 4));
        timer.advance_frame();
        //the open (1,2) drawcall is dropped, the closed one still counts
        let times = timer.shader_times();
        assert_eq!(times.len(), 1);
        assert_eq!(times.values().sum::<f64>(), 2.0);
    }

    #[test]
    fn start_after_failed_allocation_is_ignored() {
        let device = ManualDevice::new();
        let (sink, messages) = recording_sink();
        let mut timer = DrawcallTimer::new(device.backend(), sink);
        device.fail_next_allocations(1);
        timer.start(key(1, 2));
        //the untimed drawcall is still open, so this one is nested
        timer.start(key(3, 4));
        assert_eq!(timer.state(), MeasureState::Unmeasured);
        assert_eq!(timer.pending_drawcalls(), 0);
        assert_eq!(timer.allocated_query_pairs(), 0);
        timer.end();
        assert_eq!(timer.state(), MeasureState::Idle);
        timer.end();
        let messages = messages.lock().unwrap();
        assert_eq!(
            messages.as_slice(),
            [
                "Could not create a query object: Out of memory".to_string(),
                "start called while a drawcall is already being timed; ignoring it".to_string(),
                "end called without a matching start; ignoring it".to_string(),
            ]
        );
    }

    #[test]
    fn released_pairs_are_recycled() {
        let device = ManualDevice::new();
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        timer.start(key(1, 2));
        device.advance(100);
        timer.end();
        timer.start(key(1, 2));
        timer.advance_frame();
        //both drawcalls, closed or not, hand both queries back
        assert_eq!(device.recycled_queries(), 4);

        device.mark_disjoint();
        timer.start(key(1, 2));
        timer.end();
        timer.advance_frame();
        assert_eq!(timer.discarded_frames(), 1);
        assert_eq!(device.recycled_queries(), 6);
    }

    #[test]
    fn brackets_use_the_frame_path() {
        let device = ManualDevice::new();
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        assert_eq!(device.frame_writes(), 1);
        timer.start(key(1, 2));
        timer.end();
        timer.advance_frame();
        //closing end plus opening start; drawcall writes go elsewhere
        assert_eq!(device.frame_writes(), 3);
    }

    #[test]
    fn periodic_report() {
        let device = ManualDevice::new();
        let (sink, messages) = recording_sink();
        let config = TimerConfig {
            log_interval: 2,
            ..TimerConfig::default()
        };
        let mut timer = DrawcallTimer::with_config(device.backend(), config, sink);
        device.label_shader(ShaderHandle::new(1).unwrap(), "sky_vs");
        device.label_shader(ShaderHandle::new(2).unwrap(), "sky_fs");
        for _ in 0..3 {
            timer.start(key(1, 2));
            device.advance(3_000);
            timer.end();
            device.advance(1_000);
            timer.advance_frame();
        }
        //frames 0 and 2 report
        let messages = messages.lock().unwrap();
        assert_eq!(
            messages.as_slice(),
            [
                "The frame took 4ms total".to_string(),
                "Shader vertex=sky_vs fragment=sky_fs took 3ms".to_string(),
                "The frame took 4ms total".to_string(),
                "Shader vertex=sky_vs fragment=sky_fs took 3ms".to_string(),
            ]
        );
    }

    #[test]
    fn slow_validity_polls_then_resolves() {
        let device = ManualDevice::new();
        device.set_validity_latency(3);
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        device.advance(2_000);
        timer.advance_frame();
        assert_eq!(device.waits(), 3);
        assert_eq!(timer.last_frame_gpu_time(), 2.0);
        assert_eq!(timer.discarded_frames(), 0);
    }

    #[test]
    fn unusable_timebase_discards() {
        let device = ManualDevice::with_timebase(crate::backend::Timebase::TicksPerSecond(0));
        let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
        device.advance(2_000);
        timer.advance_frame();
        assert_eq!(timer.discarded_frames(), 1);
        assert_eq!(timer.last_frame_gpu_time(), 0.0);
    }

    #[test]
    fn usable_through_trait_object() {
        let device = ManualDevice::new();
        let mut timer: Box<dyn FrameTimer> =
            Box::new(DrawcallTimer::new(device.backend(), DebugSink::silent()));
        timer.start(key(1, 2));
        device.advance(250);
        timer.end();
        timer.advance_frame();
        assert_eq!(timer.shader_times().values().sum::<f64>(), 0.25);
        assert_eq!(timer.last_frame_gpu_time(), 0.25);
    }
}

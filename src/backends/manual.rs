// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A backend whose GPU clock is a number you move by hand.

[ManualDevice] plays the role of the driver.  It owns every query object and exposes the
knobs a real device turns on its own: the clock, how long results take to arrive,
allocation failures, lost results and clock discontinuities.  [ManualBackend] is the
[TimerBackend] that talks to it.

Timestamps are captured the moment they are written, so a drawcall's measured time is
exactly how far the clock was advanced between its start and end.

```
use render_timing::backends::manual::ManualDevice;
use render_timing::debug::DebugSink;
use render_timing::shader::{ShaderCombinationKey, ShaderHandle};
use render_timing::timer::DrawcallTimer;

let device = ManualDevice::new();
let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
let key = ShaderCombinationKey::new(ShaderHandle::new(1), ShaderHandle::new(2));

timer.start(key);
device.advance(2_000); //2ms at the default 1MHz
timer.end();
timer.advance_frame();

assert_eq!(timer.shader_times().values().sum::<f64>(), 2.0);
```
*/

use crate::backend::{FrameValidity, Timebase, TimerBackend, counter_mask};
use crate::error::QueryError;
use crate::query_pool::QueryPair;
use crate::shader::{ShaderHandle, ShaderLabels, ShaderStage};
use crate::sys::time::Duration;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct QuerySlot {
    value: Option<u64>,
}

#[derive(Debug, Default)]
struct ValidityRecord {
    open: bool,
    ended: bool,
    disjoint: bool,
    polls_remaining: u32,
}

#[derive(Debug)]
struct DeviceState {
    clock: u64,
    timebase: Timebase,
    counter_bits: u32,
    queries: Vec<QuerySlot>,
    validities: Vec<ValidityRecord>,
    validity_latency: u32,
    failing_allocations: u32,
    withheld_writes: u32,
    labels: ShaderLabels,
    waits: u64,
    frame_writes: u64,
    recycled: u64,
}

/// A software GPU.  Clones share the same device.
#[derive(Debug, Clone)]
pub struct ManualDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl ManualDevice {
    /// A device ticking at 1MHz with a 64-bit counter.
    pub fn new() -> Self {
        Self::with_timebase(Timebase::TicksPerSecond(1_000_000))
    }

    pub fn with_timebase(timebase: Timebase) -> Self {
        ManualDevice {
            state: Arc::new(Mutex::new(DeviceState {
                clock: 0,
                timebase,
                counter_bits: 64,
                queries: Vec::new(),
                validities: Vec::new(),
                validity_latency: 0,
                failing_allocations: 0,
                withheld_writes: 0,
                labels: ShaderLabels::new(),
                waits: 0,
                frame_writes: 0,
                recycled: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap()
    }

    /// A backend speaking to this device.
    pub fn backend(&self) -> ManualBackend {
        ManualBackend {
            device: self.clone(),
        }
    }

    pub fn clock(&self) -> u64 {
        self.lock().clock
    }

    pub fn set_clock(&self, ticks: u64) {
        self.lock().clock = ticks;
    }

    /// Moves the clock forward, wrapping like hardware does.
    pub fn advance(&self, ticks: u64) {
        let mut state = self.lock();
        state.clock = state.clock.wrapping_add(ticks);
    }

    /// Restricts the counter to its low `bits` bits.
    pub fn set_counter_bits(&self, bits: u32) {
        self.lock().counter_bits = bits;
    }

    pub fn set_timebase(&self, timebase: Timebase) {
        self.lock().timebase = timebase;
    }

    /// How many unsuccessful polls a closed frame window answers before its verdict.
    /// `u32::MAX` means effectively never.
    pub fn set_validity_latency(&self, polls: u32) {
        self.lock().validity_latency = polls;
    }

    /// The next `count` query allocations fail with [QueryError::OutOfMemory].
    pub fn fail_next_allocations(&self, count: u32) {
        self.lock().failing_allocations = count;
    }

    /// The next `count` timestamp writes never produce a result.
    pub fn withhold_next_writes(&self, count: u32) {
        self.lock().withheld_writes = count;
    }

    /// The clock jumps: every frame window open right now becomes disjoint.
    pub fn mark_disjoint(&self) {
        for record in self.lock().validities.iter_mut().filter(|r| r.open) {
            record.disjoint = true;
        }
    }

    pub fn label_shader(&self, handle: ShaderHandle, label: impl Into<String>) {
        self.lock().labels.set(handle, label);
    }

    /// Timestamp query objects allocated on this device.
    pub fn query_objects(&self) -> usize {
        self.lock().queries.len()
    }

    /// Frame validity objects allocated on this device.
    pub fn validity_objects(&self) -> usize {
        self.lock().validities.len()
    }

    /// Times the engine waited for results.
    pub fn waits(&self) -> u64 {
        self.lock().waits
    }

    /// Frame bracket timestamps written so far.
    pub fn frame_writes(&self) -> u64 {
        self.lock().frame_writes
    }

    /// Queries handed back for reuse so far.
    pub fn recycled_queries(&self) -> u64 {
        self.lock().recycled
    }

    fn allocation_fails(state: &mut DeviceState) -> bool {
        if state.failing_allocations > 0 {
            state.failing_allocations -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for ManualDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// A query object on a [ManualDevice].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualQuery(usize);

/// A frame validity object on a [ManualDevice].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualValidity(usize);

#[derive(Debug, Clone)]
pub struct ManualBackend {
    device: ManualDevice,
}

impl ManualBackend {
    pub fn device(&self) -> &ManualDevice {
        &self.device
    }
}

impl TimerBackend for ManualBackend {
    type Query = ManualQuery;
    type Validity = ManualValidity;

    fn name(&self) -> &str {
        "manual"
    }

    fn create_query_pair(&mut self) -> Result<QueryPair<ManualQuery>, QueryError> {
        let mut state = self.device.lock();
        if ManualDevice::allocation_fails(&mut state) {
            return Err(QueryError::OutOfMemory);
        }
        let start = state.queries.len();
        state.queries.push(QuerySlot::default());
        state.queries.push(QuerySlot::default());
        Ok(QueryPair::new(ManualQuery(start), ManualQuery(start + 1)))
    }

    fn create_validity_query(&mut self) -> Result<ManualValidity, QueryError> {
        let mut state = self.device.lock();
        if ManualDevice::allocation_fails(&mut state) {
            return Err(QueryError::OutOfMemory);
        }
        state.validities.push(ValidityRecord::default());
        Ok(ManualValidity(state.validities.len() - 1))
    }

    fn write_timestamp(&mut self, query: &ManualQuery) {
        let mut state = self.device.lock();
        let value = if state.withheld_writes > 0 {
            state.withheld_writes -= 1;
            None
        } else {
            Some(state.clock & counter_mask(state.counter_bits))
        };
        state.queries[query.0].value = value;
    }

    fn write_frame_timestamp(&mut self, query: &ManualQuery) {
        self.device.lock().frame_writes += 1;
        self.write_timestamp(query);
    }

    fn recycle_query(&mut self, query: &ManualQuery) {
        let mut state = self.device.lock();
        state.recycled += 1;
        //a recycled query has no result until it is written again
        state.queries[query.0].value = None;
    }

    fn begin_validity(&mut self, validity: &ManualValidity) {
        let mut state = self.device.lock();
        let latency = state.validity_latency;
        state.validities[validity.0] = ValidityRecord {
            open: true,
            ended: false,
            disjoint: false,
            polls_remaining: latency,
        };
    }

    fn end_validity(&mut self, validity: &ManualValidity) {
        let mut state = self.device.lock();
        let record = &mut state.validities[validity.0];
        record.open = false;
        record.ended = true;
    }

    fn poll_validity(&mut self, validity: &ManualValidity) -> Option<FrameValidity> {
        let mut state = self.device.lock();
        let timebase = state.timebase;
        let record = &mut state.validities[validity.0];
        if !record.ended {
            return None;
        }
        if record.polls_remaining > 0 {
            record.polls_remaining -= 1;
            return None;
        }
        Some(FrameValidity {
            disjoint: record.disjoint,
            timebase,
        })
    }

    fn wait_for_results(&mut self, _interval: Duration) {
        self.device.lock().waits += 1;
    }

    fn read_timestamp(&mut self, query: &ManualQuery) -> Option<u64> {
        self.device.lock().queries[query.0].value
    }

    fn counter_bits(&self) -> u32 {
        self.device.lock().counter_bits
    }

    fn shader_name(&self, _stage: ShaderStage, handle: ShaderHandle) -> String {
        self.device.lock().labels.resolve(handle)
    }
}

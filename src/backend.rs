// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The contract between the timing engine and a graphics API.

Every API has its own notion of a timestamp query, of when its result can be read, and
of what invalidates a measurement.  A [TimerBackend] boils that down to a handful of
primitive operations.  The frame bookkeeping built on top lives in
[crate::timer::DrawcallTimer] and is shared by every backend.

# Query lifecycle

```text
create_query_pair ──► write_timestamp(start) ──► write_timestamp(end) ──► read_timestamp
        ▲                                                                     │
        └───────────── recycle_query, pooled, never destroyed ◄───────────────┘
```

A query object may be recycled after it was read, or after its frame was thrown away
without reading it.  Backends must cope with both.
*/

use crate::error::QueryError;
use crate::query_pool::QueryPair;
use crate::shader::{ShaderHandle, ShaderStage};
use crate::sys::time::Duration;

/// How raw timestamp ticks convert to wall time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timebase {
    /// The counter runs at this frequency (D3D-style).
    TicksPerSecond(u64),
    /// Each tick is this many nanoseconds (GL counters are 1.0; wgpu reports a period).
    NanosecondsPerTick(f64),
}

impl Timebase {
    /// Nanosecond counters.
    pub const NANOSECONDS: Timebase = Timebase::NanosecondsPerTick(1.0);

    /// Whether ticks can be converted at all.  A zero frequency cannot.
    pub fn is_usable(self) -> bool {
        match self {
            Timebase::TicksPerSecond(frequency) => frequency != 0,
            Timebase::NanosecondsPerTick(period) => period.is_finite() && period > 0.0,
        }
    }

    pub fn ticks_to_ms(self, ticks: u64) -> f64 {
        match self {
            Timebase::TicksPerSecond(frequency) => 1000.0 * ticks as f64 / frequency as f64,
            Timebase::NanosecondsPerTick(period) => ticks as f64 * period / 1_000_000.0,
        }
    }
}

/// What a backend knows about a finished frame window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameValidity {
    /// The GPU clock jumped during the window (power state change and the like).
    /// Nothing measured in the window can be trusted.
    pub disjoint: bool,
    pub timebase: Timebase,
}

impl FrameValidity {
    pub fn valid(timebase: Timebase) -> Self {
        FrameValidity {
            disjoint: false,
            timebase,
        }
    }

    pub fn disjoint(timebase: Timebase) -> Self {
        FrameValidity {
            disjoint: true,
            timebase,
        }
    }
}

/**
One graphics API's timestamp primitives.

All methods are called from the render thread, in strict sequence.  Apart from
[TimerBackend::wait_for_results] none of them may block.
*/
pub trait TimerBackend {
    /// A single timestamp query object.
    type Query;
    /// The object tracking whether one frame window stayed on a stable clock.
    type Validity;

    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Allocates two fresh timestamp queries.
    fn create_query_pair(&mut self) -> Result<QueryPair<Self::Query>, QueryError>;

    fn create_validity_query(&mut self) -> Result<Self::Validity, QueryError>;

    /// Records the GPU clock into `query` at this point of the command stream.
    fn write_timestamp(&mut self, query: &Self::Query);

    /// Records a frame bracket timestamp.
    ///
    /// Called only at frame boundaries, right before [TimerBackend::end_validity] or
    /// right after [TimerBackend::begin_validity].  Backends that batch drawcall
    /// timestamps into host command streams must put this one where the validity
    /// check can see it.
    fn write_frame_timestamp(&mut self, query: &Self::Query) {
        self.write_timestamp(query);
    }

    /// Called for every query going back to the pool, during frame resolution.
    ///
    /// The query may still hold an unread or pending result.  Implementations drop it
    /// here, without blocking, so the next write finds the query ready.
    fn recycle_query(&mut self, _query: &Self::Query) {}

    /// Opens a frame window.
    fn begin_validity(&mut self, validity: &Self::Validity);

    /// Closes a frame window.  Every timestamp written before this belongs to it.
    fn end_validity(&mut self, validity: &Self::Validity);

    /// Returns the window's verdict once the GPU has produced it, `None` before.
    fn poll_validity(&mut self, validity: &Self::Validity) -> Option<FrameValidity>;

    /// Waits a little for outstanding GPU work.  Called between unsuccessful polls.
    fn wait_for_results(&mut self, interval: Duration) {
        crate::sys::time::sleep(interval);
    }

    /// The raw counter value, or `None` if the result is not available yet.
    fn read_timestamp(&mut self, query: &Self::Query) -> Option<u64>;

    /// Significant bits of the timestamp counter.  Restricted devices report 32.
    fn counter_bits(&self) -> u32 {
        64
    }

    /// Display name of a bound shader object.
    fn shader_name(&self, stage: ShaderStage, handle: ShaderHandle) -> String;
}

/// A mask keeping the low `bits` bits.  Zero and anything past 64 mean the full width.
pub fn counter_mask(bits: u32) -> u64 {
    if bits == 0 || bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Elapsed ticks between two raw counter values, tolerating one wraparound.
pub fn masked_delta(start: u64, end: u64, mask: u64) -> u64 {
    (end & mask).wrapping_sub(start & mask) & mask
}

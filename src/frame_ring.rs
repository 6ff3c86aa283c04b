// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Double-buffered per-frame bookkeeping.

While the GPU still works on frame N, the CPU is already issuing frame N+1.  Each frame
in flight gets its own ring slot, so one slot can be resolved while the other collects
new drawcalls.  The active slot is always `frame_counter % RING_DEPTH`.
*/

use crate::query_pool::QueryPair;
use crate::shader::ShaderCombinationKey;
use std::collections::HashMap;

/// Number of frames that can be in flight at once.
pub const RING_DEPTH: usize = 2;

/// One drawcall's queries as recorded in a [FrameTable].
#[derive(Debug)]
pub(crate) struct TimedDrawcall<Q> {
    pub(crate) queries: QueryPair<Q>,
    /// Whether the end timestamp was issued.
    pub(crate) closed: bool,
}

/// Identifies a drawcall inside a [FrameTable] until the table is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrawcallRef {
    key: ShaderCombinationKey,
    index: usize,
}

/**
Every drawcall issued during one frame, grouped by shader combination.

Many drawcalls may share a key, so each key maps to a list.
*/
#[derive(Debug)]
pub(crate) struct FrameTable<Q> {
    drawcalls: HashMap<ShaderCombinationKey, Vec<TimedDrawcall<Q>>>,
}

impl<Q> FrameTable<Q> {
    pub(crate) fn new() -> Self {
        FrameTable {
            drawcalls: HashMap::new(),
        }
    }

    pub(crate) fn record(&mut self, key: ShaderCombinationKey, queries: QueryPair<Q>) -> DrawcallRef {
        let list = self.drawcalls.entry(key).or_default();
        list.push(TimedDrawcall {
            queries,
            closed: false,
        });
        DrawcallRef {
            key,
            index: list.len() - 1,
        }
    }

    pub(crate) fn get_mut(&mut self, drawcall: DrawcallRef) -> Option<&mut TimedDrawcall<Q>> {
        self.drawcalls
            .get_mut(&drawcall.key)
            .and_then(|list| list.get_mut(drawcall.index))
    }

    /// Empties the table, handing back everything recorded.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (ShaderCombinationKey, Vec<TimedDrawcall<Q>>)> + '_ {
        self.drawcalls.drain()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.drawcalls.is_empty()
    }

    /// Drawcalls recorded, across all keys.
    pub(crate) fn drawcall_count(&self) -> usize {
        self.drawcalls.values().map(Vec::len).sum()
    }
}

/**
A fixed ring of [RING_DEPTH] slots and the frame counter that selects among them.
*/
#[derive(Debug)]
pub(crate) struct FrameRing<S> {
    slots: Vec<S>,
    frame_counter: u64,
}

impl<S> FrameRing<S> {
    pub(crate) fn new(slots: Vec<S>) -> Self {
        assert_eq!(slots.len(), RING_DEPTH, "ring needs exactly one slot per frame in flight");
        FrameRing {
            slots,
            frame_counter: 0,
        }
    }

    pub(crate) fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub(crate) fn index(&self) -> usize {
        (self.frame_counter % RING_DEPTH as u64) as usize
    }

    pub(crate) fn next_index(&self) -> usize {
        ((self.frame_counter + 1) % RING_DEPTH as u64) as usize
    }

    pub(crate) fn current(&self) -> &S {
        &self.slots[self.index()]
    }

    pub(crate) fn current_mut(&mut self) -> &mut S {
        let index = self.index();
        &mut self.slots[index]
    }

    /// The active slot and the one the next frame will use.
    pub(crate) fn current_and_next_mut(&mut self) -> (&mut S, &mut S) {
        let current = self.index();
        let next = self.next_index();
        debug_assert_ne!(current, next);
        if current < next {
            let (low, high) = self.slots.split_at_mut(next);
            (&mut low[current], &mut high[0])
        } else {
            let (low, high) = self.slots.split_at_mut(current);
            (&mut high[0], &mut low[next])
        }
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = &S> {
        self.slots.iter()
    }

    pub(crate) fn advance(&mut self) {
        self.frame_counter += 1;
    }
}

// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Recycling of timestamp query pairs.

Every timed drawcall needs two query objects.  Creating them is comparatively expensive
and some drivers never really give the memory back, so once a pair exists it lives until
the engine is torn down.  Pairs come back here when their frame is resolved.

The pool has no cap.  It grows when empty and converges to the peak number of drawcalls
in flight across one ring of frames.
*/

/// The start/end query objects bracketing one timed interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair<Q> {
    pub start: Q,
    pub end: Q,
}

impl<Q> QueryPair<Q> {
    pub fn new(start: Q, end: Q) -> Self {
        QueryPair { start, end }
    }
}

#[derive(Debug)]
pub struct QueryPool<Q> {
    available: Vec<QueryPair<Q>>,
    created: usize,
}

impl<Q> QueryPool<Q> {
    pub fn new() -> Self {
        QueryPool {
            available: Vec::new(),
            created: 0,
        }
    }

    /**
    Hands out a pair, reusing a pooled one when possible.

    `allocate` is only invoked when the pool is empty.  Its error is passed through
    untouched and nothing is recorded, so a failed allocation leaves the pool as it was.
    */
    pub fn acquire_with<E, F>(&mut self, allocate: F) -> Result<QueryPair<Q>, E>
    where
        F: FnOnce() -> Result<QueryPair<Q>, E>,
    {
        match self.available.pop() {
            Some(pair) => Ok(pair),
            None => {
                let pair = allocate()?;
                self.created += 1;
                logwise::trace_sync!("query pool grew to {created} pairs", created = self.created);
                Ok(pair)
            }
        }
    }

    pub fn release(&mut self, pair: QueryPair<Q>) {
        self.available.push(pair);
    }

    /// Pairs sitting in the pool right now.
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Pairs this pool ever allocated.
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<Q> Default for QueryPool<Q> {
    fn default() -> Self {
        Self::new()
    }
}

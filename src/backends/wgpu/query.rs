// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
One timestamp query on wgpu.

Each query owns a single-entry query set, a buffer to resolve into and a buffer to read
back from.  A write encodes the timestamp, resolves it and copies it to the readback
buffer, either in the host's encoder or in a submission of its own.  The readback buffer
is mapped once the copy is known to be submitted.  Reading only looks at whether that
mapping already completed.

```text
IDLE ──write_now──────────────────────────────────► PENDING ──► MAPPED ──read──► READ
  └───write_into──► RECORDED ──encoder finished──► ENCODED ──read (maps)──► PENDING
```

[WgpuQuery::reset] returns any state to IDLE without waiting for the GPU.  Map
callbacks from before a reset are ignored.
*/

use super::poll;
use crate::error::QueryError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

const TIMESTAMP_SIZE: wgpu::BufferAddress = std::mem::size_of::<u64>() as wgpu::BufferAddress;

//readback states
const IDLE: u8 = 0;
const RECORDED: u8 = 1;
const ENCODED: u8 = 2;
const PENDING: u8 = 3;
const MAPPED: u8 = 4;
const FAILED: u8 = 5;
const READ: u8 = 6;

#[derive(Debug)]
pub struct WgpuQuery {
    set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    readback: wgpu::Buffer,
    state: Arc<AtomicU8>,
    //bumped on every reset
    epoch: Arc<AtomicU64>,
    //valid in READ
    value: AtomicU64,
}

impl WgpuQuery {
    pub(super) fn new(device: &wgpu::Device) -> Result<Self, QueryError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("render_timing timestamp"),
            ty: wgpu::QueryType::Timestamp,
            count: 1,
        });
        let resolve = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render_timing resolve"),
            size: TIMESTAMP_SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render_timing readback"),
            size: TIMESTAMP_SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let out_of_memory = test_executors::spin_on(device.pop_error_scope());
        let invalid = test_executors::spin_on(device.pop_error_scope());
        if out_of_memory.is_some() {
            return Err(QueryError::OutOfMemory);
        }
        if let Some(e) = invalid {
            return Err(QueryError::Backend(e.to_string()));
        }
        Ok(WgpuQuery {
            set,
            resolve,
            readback,
            state: Arc::new(AtomicU8::new(IDLE)),
            epoch: Arc::new(AtomicU64::new(0)),
            value: AtomicU64::new(0),
        })
    }

    /// Drops any earlier result without waiting for the GPU.
    pub(super) fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        match self.state.swap(IDLE, Ordering::AcqRel) {
            //unmapping also cancels a mapping still in flight
            PENDING | MAPPED => self.readback.unmap(),
            _ => {}
        }
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.write_timestamp(&self.set, 0);
        encoder.resolve_query_set(&self.set, 0..1, &self.resolve, 0);
        encoder.copy_buffer_to_buffer(&self.resolve, 0, &self.readback, 0, TIMESTAMP_SIZE);
    }

    /// Writes the timestamp in a submission of its own.
    pub(super) fn write_now(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.reset();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_timing timestamp"),
        });
        self.encode(&mut encoder);
        queue.submit(std::iter::once(encoder.finish()));
        self.map();
    }

    /**
    Writes the timestamp into the host's `encoder`.

    The readback can't be mapped until the host submits, so the query waits in RECORDED
    until [Self::encoder_finished] is called on the handle this returns.
    */
    pub(super) fn write_into(&self, encoder: &mut wgpu::CommandEncoder) -> RecordedQuery {
        self.reset();
        self.encode(encoder);
        self.state.store(RECORDED, Ordering::Release);
        RecordedQuery {
            state: self.state.clone(),
        }
    }

    fn map(&self) {
        self.state.store(PENDING, Ordering::Release);
        let epoch = self.epoch.load(Ordering::Acquire);
        let move_state = self.state.clone();
        let move_epoch = self.epoch.clone();
        self.readback.map_async(wgpu::MapMode::Read, .., move |result| {
            if move_epoch.load(Ordering::Acquire) != epoch {
                return;
            }
            let next = if result.is_ok() { MAPPED } else { FAILED };
            move_state.store(next, Ordering::Release);
        });
    }

    /// The resolved timestamp, if the GPU already delivered it.
    pub(super) fn read(&self, device: &wgpu::Device) -> Option<u64> {
        if self.state.load(Ordering::Acquire) == ENCODED {
            self.map();
        }
        if self.state.load(Ordering::Acquire) == PENDING {
            poll(device, wgpu::PollType::Poll);
        }
        match self.state.load(Ordering::Acquire) {
            MAPPED => {
                let value = {
                    let view = self.readback.slice(..).get_mapped_range();
                    <[u8; 8]>::try_from(&view[..]).ok().map(u64::from_le_bytes)
                };
                self.readback.unmap();
                match value {
                    Some(value) => {
                        self.value.store(value, Ordering::Relaxed);
                        self.state.store(READ, Ordering::Release);
                    }
                    None => self.state.store(FAILED, Ordering::Release),
                }
                value
            }
            READ => Some(self.value.load(Ordering::Relaxed)),
            //RECORDED: the host's encoder is still open
            _ => None,
        }
    }
}

/// A query written into a host encoder that has not been handed back yet.
#[derive(Debug)]
pub(super) struct RecordedQuery {
    state: Arc<AtomicU8>,
}

impl RecordedQuery {
    /// The encoder left the backend; its copy will be submitted before the next read.
    pub(super) fn encoder_finished(&self) {
        //a reset since then leaves the query alone
        let _ = self.state.compare_exchange(
            RECORDED,
            ENCODED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

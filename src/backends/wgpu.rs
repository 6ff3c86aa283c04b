// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Timestamp queries through wgpu.

wgpu fronts Direct3D 12, Vulkan, Metal and OpenGL, so this one backend covers every native
API the engine targets.  It needs both [wgpu::Features::TIMESTAMP_QUERY] and
[wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS]; see [REQUIRED_FEATURES].

# Recording into the host's encoder

Hosts lend their command encoder to the backend for the span of a frame's drawcalls:

```no_run
# use render_timing::backends::wgpu::WgpuBackend;
# use render_timing::shader::ShaderCombinationKey;
# use render_timing::timer::DrawcallTimer;
# fn frame(timer: &mut DrawcallTimer<WgpuBackend>, key: ShaderCombinationKey) -> Option<()> {
let backend = timer.backend_mut()?;
let encoder = backend
    .device()
    .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
backend.attach_encoder(encoder);

timer.start(key);
if let Some(encoder) = timer.backend_mut()?.encoder_mut() {
    //begin a pass, draw, end the pass
    encoder.insert_debug_marker("draw");
}
timer.end();

let backend = timer.backend_mut()?;
let encoder = backend.detach_encoder()?;
backend.queue().submit(std::iter::once(encoder.finish()));
timer.advance_frame();
# Some(())
# }
```

Drawcall timestamps then sit in the host's command stream, between its passes.  The
encoder must be detached and submitted before [crate::timer::DrawcallTimer::advance_frame].
Frame brackets always go in submissions of their own, so the frame window covers
everything the host submitted in between.

Without an attached encoder each timestamp is written in its own submission.  A drawcall
is then bracketed correctly only if the host submits its work between
[crate::timer::DrawcallTimer::start] and [crate::timer::DrawcallTimer::end].

Not available on wasm32: frame resolution waits on the GPU, which the browser's main
thread can't do.

wgpu cannot report a shader module's label back, so hosts register names with
[WgpuBackend::label_shader].
*/

mod query;
mod validity;

pub use query::WgpuQuery;
pub use validity::WgpuValidity;

use query::RecordedQuery;

use crate::backend::{FrameValidity, Timebase, TimerBackend};
use crate::error::{InitError, QueryError};
use crate::query_pool::QueryPair;
use crate::shader::{ShaderHandle, ShaderLabels, ShaderStage};
use crate::sys::time::Duration;

/// Device features the backend cannot work without.
pub const REQUIRED_FEATURES: wgpu::Features =
    wgpu::Features::TIMESTAMP_QUERY.union(wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS);

/// Polls `device`, logging rather than propagating a failure.
fn poll(device: &wgpu::Device, kind: wgpu::PollType) {
    if let Err(e) = device.poll(kind) {
        logwise::warn_sync!("wgpu poll failed: {error}", error = e.to_string());
    }
}

#[derive(Debug)]
struct HostEncoder {
    encoder: wgpu::CommandEncoder,
    recorded: Vec<RecordedQuery>,
}

#[derive(Debug)]
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    period: f64,
    labels: ShaderLabels,
    host_encoder: Option<HostEncoder>,
}

impl WgpuBackend {
    /// Wraps an existing device.  Fails if it was created without [REQUIRED_FEATURES].
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Result<Self, InitError> {
        let missing = REQUIRED_FEATURES.difference(device.features());
        if !missing.is_empty() {
            return Err(InitError::Unsupported(format!("{missing:?}")));
        }
        let period = queue.get_timestamp_period() as f64;
        logwise::info_sync!(
            "wgpu timestamp period is {period}ns",
            period = logwise::privacy::LogIt(&period)
        );
        Ok(WgpuBackend {
            device,
            queue,
            period,
            labels: ShaderLabels::new(),
            host_encoder: None,
        })
    }

    /// Opens a device on `adapter` with the features timing needs.
    pub async fn from_adapter(adapter: &wgpu::Adapter) -> Result<Self, InitError> {
        let missing = REQUIRED_FEATURES.difference(adapter.features());
        if !missing.is_empty() {
            return Err(InitError::Unsupported(format!("{missing:?}")));
        }
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("render_timing"),
            required_features: REQUIRED_FEATURES,
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        };
        let (device, queue) = adapter
            .request_device(&descriptor)
            .await
            .map_err(|e| InitError::Query(QueryError::Backend(e.to_string())))?;
        Self::new(device, queue)
    }

    /// Names a shader handle in reports.
    pub fn label_shader(&mut self, handle: ShaderHandle, label: impl Into<String>) {
        self.labels.set(handle, label);
    }

    /**
    Records drawcall timestamps into `encoder` until it is detached.

    Returns the previously attached encoder, if any, as [Self::detach_encoder] would.
    */
    pub fn attach_encoder(&mut self, encoder: wgpu::CommandEncoder) -> Option<wgpu::CommandEncoder> {
        let previous = self.detach_encoder();
        self.host_encoder = Some(HostEncoder {
            encoder,
            recorded: Vec::new(),
        });
        previous
    }

    /// The attached encoder, for the host's own commands between timestamps.
    pub fn encoder_mut(&mut self) -> Option<&mut wgpu::CommandEncoder> {
        self.host_encoder.as_mut().map(|h| &mut h.encoder)
    }

    /// Hands the encoder back.  The host must submit it before the frame ends.
    pub fn detach_encoder(&mut self) -> Option<wgpu::CommandEncoder> {
        let host = self.host_encoder.take()?;
        for query in &host.recorded {
            query.encoder_finished();
        }
        Some(host.encoder)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl TimerBackend for WgpuBackend {
    type Query = WgpuQuery;
    type Validity = WgpuValidity;

    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_query_pair(&mut self) -> Result<QueryPair<WgpuQuery>, QueryError> {
        let start = WgpuQuery::new(&self.device)?;
        let end = WgpuQuery::new(&self.device)?;
        Ok(QueryPair::new(start, end))
    }

    fn create_validity_query(&mut self) -> Result<WgpuValidity, QueryError> {
        Ok(WgpuValidity::new())
    }

    fn write_timestamp(&mut self, query: &WgpuQuery) {
        match self.host_encoder.as_mut() {
            Some(host) => {
                let recorded = query.write_into(&mut host.encoder);
                host.recorded.push(recorded);
            }
            None => query.write_now(&self.device, &self.queue),
        }
    }

    fn write_frame_timestamp(&mut self, query: &WgpuQuery) {
        query.write_now(&self.device, &self.queue);
    }

    fn recycle_query(&mut self, query: &WgpuQuery) {
        query.reset();
    }

    fn begin_validity(&mut self, validity: &WgpuValidity) {
        validity.begin();
    }

    fn end_validity(&mut self, validity: &WgpuValidity) {
        if self.host_encoder.is_some() {
            logwise::warn_sync!(
                "frame ended with a host encoder still attached; its drawcalls will have no results"
            );
        }
        validity.end(&self.queue);
    }

    fn poll_validity(&mut self, validity: &WgpuValidity) -> Option<FrameValidity> {
        poll(&self.device, wgpu::PollType::Poll);
        if validity.is_complete() {
            Some(FrameValidity::valid(Timebase::NanosecondsPerTick(self.period)))
        } else {
            None
        }
    }

    fn wait_for_results(&mut self, _interval: Duration) {
        poll(&self.device, wgpu::PollType::Wait);
    }

    fn read_timestamp(&mut self, query: &WgpuQuery) -> Option<u64> {
        query.read(&self.device)
    }

    fn shader_name(&self, _stage: ShaderStage, handle: ShaderHandle) -> String {
        self.labels.resolve(handle)
    }
}

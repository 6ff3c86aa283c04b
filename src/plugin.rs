// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Host glue.

A host engine (a game engine's native plugin interface, a custom renderer) talks to the
timer through a [TimingPlugin]: it forwards device lifecycle signals, rendering events
and frame boundaries, and asks for the latest results.  The plugin owns at most one
engine, the one for the current graphics device.

Nothing here can fail from the host's point of view.  Problems are reported through the
plugin's [DebugSink] and the plugin carries on without timing data.

```
use render_timing::backends::manual::ManualDevice;
use render_timing::plugin::{Renderer, RenderingEvent, TimingPlugin};
use render_timing::shader::{ShaderCombinationKey, ShaderHandle};
use render_timing::debug::DebugSink;

let device = ManualDevice::new();
let mut plugin = TimingPlugin::new(DebugSink::silent());
plugin.device_initialized(Renderer::Null, Ok(device.backend()));

let key = ShaderCombinationKey::new(ShaderHandle::new(7), ShaderHandle::new(8));
plugin.on_rendering_event(RenderingEvent::BeforeDrawCall(key));
device.advance(1_500);
plugin.on_rendering_event(RenderingEvent::AfterDrawCall);
plugin.on_frame_end();

let timings = plugin.last_frame_shader_timings().unwrap();
assert_eq!(timings[0].time_ms, 1.5);
```
*/

use crate::backend::TimerBackend;
use crate::config::TimerConfig;
use crate::debug::DebugSink;
use crate::error::InitError;
use crate::shader::ShaderCombinationKey;
use crate::timer::DrawcallTimer;
use crate::timings::{ShaderTiming, sorted_by_time};
use std::fmt::{Display, Formatter};

pub use crate::timer::FrameTimer;

/// The graphics API a host renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Renderer {
    /// No device, as in batch mode.
    Null,
    Direct3D9,
    Direct3D11,
    Direct3D12,
    OpenGLCore,
    OpenGLES20,
    OpenGLES30,
    Metal,
    Vulkan,
    WebGpu,
    Other,
}

impl Display for Renderer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Renderer::Null => "null device (used in batch mode)",
            Renderer::Direct3D9 => "Direct3D 9",
            Renderer::Direct3D11 => "Direct3D 11",
            Renderer::Direct3D12 => "Direct3D 12",
            Renderer::OpenGLCore => "OpenGL core",
            Renderer::OpenGLES20 => "OpenGL ES 2.0",
            Renderer::OpenGLES30 => "OpenGL ES 3.0",
            Renderer::Metal => "Metal",
            Renderer::Vulkan => "Vulkan",
            Renderer::WebGpu => "WebGPU",
            Renderer::Other => "Unknown Device Type",
        };
        f.write_str(name)
    }
}

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
impl From<wgpu::Backend> for Renderer {
    fn from(backend: wgpu::Backend) -> Self {
        match backend {
            wgpu::Backend::Noop => Renderer::Null,
            wgpu::Backend::Vulkan => Renderer::Vulkan,
            wgpu::Backend::Metal => Renderer::Metal,
            wgpu::Backend::Dx12 => Renderer::Direct3D12,
            wgpu::Backend::Gl => Renderer::OpenGLCore,
            wgpu::Backend::BrowserWebGpu => Renderer::WebGpu,
        }
    }
}

/// What the host reports around each drawcall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingEvent {
    BeforeDrawCall(ShaderCombinationKey),
    AfterDrawCall,
}

/// The single entry point a host holds on to.
#[derive(Debug)]
pub struct TimingPlugin {
    timer: Option<Box<dyn FrameTimer>>,
    renderer: Renderer,
    debug: DebugSink,
    config: TimerConfig,
}

impl TimingPlugin {
    pub fn new(debug: DebugSink) -> Self {
        Self::with_config(TimerConfig::default(), debug)
    }

    pub fn with_config(config: TimerConfig, debug: DebugSink) -> Self {
        TimingPlugin {
            timer: None,
            renderer: Renderer::Null,
            debug,
            config,
        }
    }

    /**
    The host brought up a graphics device.

    `backend` is the outcome of preparing a timer backend for it.  A failure is reported
    and leaves the plugin inert until the next device.  Any previous engine is dropped
    first.
    */
    pub fn device_initialized<B>(&mut self, renderer: Renderer, backend: Result<B, InitError>)
    where
        B: TimerBackend + 'static,
    {
        self.timer = None;
        self.renderer = renderer;
        self.debug.emit(&format!("{renderer} device"));
        match backend {
            Ok(backend) => {
                let timer = DrawcallTimer::with_config(backend, self.config.clone(), self.debug.clone());
                if timer.is_functional() {
                    self.timer = Some(Box::new(timer));
                }
            }
            Err(e) => {
                logwise::warn_sync!(
                    "no drawcall timing on {renderer}: {error}",
                    renderer = renderer.to_string(),
                    error = e.to_string()
                );
                self.debug.emit(&format!("Can't time drawcalls on {renderer}: {e}"));
            }
        }
    }

    /// The host brought up a device this crate has no backend for.
    pub fn device_unsupported(&mut self, renderer: Renderer) {
        self.timer = None;
        self.renderer = renderer;
        self.debug.emit(&format!("Graphics api {renderer} not supported"));
    }

    /// The host tore its device down.  All query objects go with the engine.
    pub fn device_shutdown(&mut self) {
        if self.timer.take().is_some() {
            logwise::info_sync!("drawcall timer shut down");
        }
        self.renderer = Renderer::Null;
    }

    pub fn on_rendering_event(&mut self, event: RenderingEvent) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        match event {
            RenderingEvent::BeforeDrawCall(key) => timer.start(key),
            RenderingEvent::AfterDrawCall => timer.end(),
        }
    }

    pub fn on_frame_end(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.advance_frame();
        }
    }

    /// The last resolved frame's per-shader times, most expensive first.
    /// `None` when there is nothing to report.
    pub fn last_frame_shader_timings(&self) -> Option<Vec<ShaderTiming>> {
        let times = self.timer.as_ref()?.shader_times();
        if times.is_empty() {
            None
        } else {
            Some(sorted_by_time(times))
        }
    }

    /// The last resolved frame's GPU time in milliseconds, 0 when unknown.
    pub fn last_frame_gpu_time(&self) -> f32 {
        self.timer
            .as_ref()
            .map_or(0.0, |timer| timer.last_frame_gpu_time() as f32)
    }

    /// Replaces the diagnostic sink for the plugin and its current engine.
    pub fn set_debug_function(&mut self, debug: DebugSink) {
        if let Some(timer) = self.timer.as_mut() {
            timer.set_debug_function(debug.clone());
        }
        self.debug = debug;
    }

    pub fn renderer(&self) -> Renderer {
        self.renderer
    }

    /// Whether an engine is running.
    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_names() {
        assert_eq!(Renderer::Direct3D11.to_string(), "Direct3D 11");
        assert_eq!(Renderer::OpenGLES30.to_string(), "OpenGL ES 3.0");
        assert_eq!(Renderer::Null.to_string(), "null device (used in batch mode)");
    }

    #[test]
    fn inert_without_device() {
        let mut plugin = TimingPlugin::new(DebugSink::silent());
        plugin.on_rendering_event(RenderingEvent::AfterDrawCall);
        plugin.on_frame_end();
        assert!(!plugin.is_active());
        assert_eq!(plugin.last_frame_shader_timings(), None);
        assert_eq!(plugin.last_frame_gpu_time(), 0.0);
    }
}

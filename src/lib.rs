/*! render_timing measures how long each drawcall and each frame takes on the GPU, from
inside a real-time renderer, without stalling it.

Timings are grouped by shader combination: the vertex, geometry, hull, domain and
fragment shaders bound for a drawcall, plus the stereo eye.  Once per frame the host gets
a map from shader names to milliseconds, and the whole frame's GPU time.

Here is how this compares to other ways of finding out where GPU time goes:

| Strategy            | Examples                         | Granularity           | Runs in production | Overhead        | Needs a capture |
|---------------------|----------------------------------|-----------------------|--------------------|-----------------|-----------------|
| Frame capture       | RenderDoc, PIX, Xcode            | Every API call        | No                 | Stops the world | Yes             |
| Vendor counters     | Nsight, RGP                      | Hardware units        | Rarely             | Varies          | Usually         |
| Whole-frame timer   | most engines' stats overlay      | One number per frame  | Yes                | Negligible      | No              |
| Shader timing       | render_timing                    | Per shader combination | Yes               | Two queries per drawcall | No     |

# How it works

GPU timestamp queries are asynchronous: the result of a query issued this frame is not
readable until the GPU gets there, which is usually a frame later.  The engine therefore
keeps two frames in flight ([RING_DEPTH]).  Drawcalls of the active frame record query
pairs into that frame's table.  At the frame boundary the finished frame is resolved: the
engine waits, boundedly, until the backend knows whether the frame's measurements can be
trusted, then sums every drawcall per shader combination and publishes the result.

Query objects are pooled.  After warming up, steady-state rendering allocates nothing.

The engine is [timer::DrawcallTimer].  It is generic over a [backend::TimerBackend], which
wraps one graphics API's query primitives.

# Backends

* [backends::wgpu] (feature `backend_wgpu`, on by default) uses wgpu timestamp queries, so
  it works wherever wgpu does natively: DX12, Vulkan, Metal and GL.  It is not built for
  wasm32, where waiting on the GPU would stall the browser's event loop.
* [backends::manual] drives a software clock.  It stands in for devices without timestamp
  support and makes the engine deterministic under test.

# Hosts

Most hosts want [plugin::TimingPlugin], which follows a graphics device's lifecycle and
never lets a timing problem reach the render loop.  Diagnostics go to a
[debug::DebugSink], by default logwise.
*/

pub mod backend;
pub mod backends;
pub mod config;
pub mod debug;
pub mod error;
mod frame_ring;
pub mod plugin;
pub mod query_pool;
pub mod shader;
mod sys;
pub mod timer;
pub mod timings;

pub use config::TimerConfig;
pub use error::{InitError, QueryError};
pub use frame_ring::RING_DEPTH;

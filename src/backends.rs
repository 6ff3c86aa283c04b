// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! [crate::backend::TimerBackend] implementations.
//!
//! The manual backend is always available.  It drives a software clock and stands in for
//! a device without timestamp support, or for tests.

pub mod manual;

#[cfg(all(feature = "backend_wgpu", not(target_arch = "wasm32")))]
pub mod wgpu;

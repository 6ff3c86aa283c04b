// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error types.
//!
//! None of these cross the host boundary.  The engine reports them through its
//! [crate::debug::DebugSink] and degrades to "no timing data".

/// A backend could not create a query object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Timestamp queries are not supported by this device")]
    Unsupported,
    #[error("{0}")]
    Backend(String),
}

/// A timer could not be brought up for a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum InitError {
    #[error("Graphics device is null")]
    NoDevice,
    #[error("Timestamp queries are not supported (missing {0})")]
    Unsupported(String),
    #[error("Can't create frame queries: {0}")]
    Query(#[from] QueryError),
}

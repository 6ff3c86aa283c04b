// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

//! Platform shims.

pub mod time {
    //! Clocks and waiting.
    //!
    //! `std::time::Instant` panics on wasm32-unknown-unknown, so the browser build takes
    //! its clock from `web_time`.

    #[cfg(not(target_arch = "wasm32"))]
    pub use std::time::{Duration, Instant};

    #[cfg(target_arch = "wasm32")]
    pub use web_time::{Duration, Instant};

    /// Blocks the calling thread for roughly `duration`.
    ///
    /// The browser main thread may not park, so on wasm32 this spins instead.
    pub fn sleep(duration: Duration) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            std::thread::sleep(duration);
        }
        #[cfg(target_arch = "wasm32")]
        {
            let start = Instant::now();
            while start.elapsed() < duration {
                std::hint::spin_loop();
            }
        }
    }
}

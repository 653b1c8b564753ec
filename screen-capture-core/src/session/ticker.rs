use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::error::CaptureError;
use crate::traits::ticker::{TickCallback, TickHandle, Ticker};

/// Ticker backed by one named timer thread per tick.
///
/// The thread parks between ticks; cancelling the handle unparks it so it
/// exits without waiting out the period.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTicker;

impl ThreadTicker {
    pub fn new() -> Self {
        Self
    }
}

impl Ticker for ThreadTicker {
    fn start(&self, period: Duration, mut on_tick: TickCallback) -> Result<TickHandle, CaptureError> {
        let active = Arc::new(AtomicBool::new(true));
        let running = Arc::clone(&active);

        let handle = thread::Builder::new()
            .name("elapsed-ticker".into())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                while running.load(Ordering::SeqCst) {
                    let now = Instant::now();
                    if now < deadline {
                        thread::park_timeout(deadline - now);
                        continue;
                    }
                    on_tick();
                    deadline += period;
                }
                log::debug!("elapsed ticker stopped");
            })
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to spawn ticker thread: {}", e)))?;

        Ok(TickHandle::with_thread(active, handle.thread().clone()))
    }
}

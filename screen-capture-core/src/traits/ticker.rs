use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::models::error::CaptureError;

/// Callback fired on every tick.
pub type TickCallback = Box<dyn FnMut() + Send + 'static>;

/// Source of the recurring elapsed-time tick.
pub trait Ticker: Send + Sync {
    /// Fire `on_tick` every `period` until the returned handle is cancelled.
    fn start(&self, period: Duration, on_tick: TickCallback) -> Result<TickHandle, CaptureError>;
}

/// Cancellation handle for a running tick. Dropping it cancels the tick.
pub struct TickHandle {
    active: Arc<AtomicBool>,
    thread: Option<thread::Thread>,
}

impl TickHandle {
    pub fn new(active: Arc<AtomicBool>) -> Self {
        Self {
            active,
            thread: None,
        }
    }

    /// Handle whose cancellation also wakes a parked timer thread.
    pub fn with_thread(active: Arc<AtomicBool>, thread: thread::Thread) -> Self {
        Self {
            active,
            thread: Some(thread),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop further ticks. Never joins, so it is safe to call from inside
    /// the tick callback itself.
    pub fn cancel(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            if let Some(ref thread) = self.thread {
                thread.unpark();
            }
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

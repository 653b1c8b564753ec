pub mod capture;
pub mod ticker;

pub use capture::{CaptureRuntime, CaptureSession};
pub use ticker::ThreadTicker;

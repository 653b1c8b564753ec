pub mod prober;

pub use prober::{probe, BrowserFamily, BrowserWarning, CapabilityReport, WarningLevel};

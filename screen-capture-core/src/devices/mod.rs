pub mod enumerator;

pub use enumerator::{normalize_label, DeviceEnumerator};

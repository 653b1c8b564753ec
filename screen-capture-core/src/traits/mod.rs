pub mod capture_delegate;
pub mod encoder;
pub mod environment;
pub mod media_devices;
pub mod media_track;
pub mod ticker;

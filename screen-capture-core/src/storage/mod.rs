pub mod metadata;
pub mod pending;
pub mod preview;

pub mod mixer;
pub mod sample_queue;

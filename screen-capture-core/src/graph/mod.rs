pub mod mix_graph;

pub use mix_graph::{GainNode, MixDestination, MixGraph};

//! Embassy async tasks

pub mod sequence;

pub use sequence::sequence_task;

pub mod spatial;

pub use spatial::*;

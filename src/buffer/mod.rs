//! Thread-level producer/consumer queue.

mod bounded;

pub use bounded::BoundedBuffer;

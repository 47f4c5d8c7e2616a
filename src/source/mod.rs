//! Byte sources for RT files
//!
//! Decoding works over any [`StreamSource`]: a local file or a buffer
//! already in memory.

mod local;
mod memory;
mod traits;

pub use local::LocalSource;
pub use memory::MemorySource;
pub use traits::{BoxedSource, StreamSource};

//! Rolling-window and numeric helpers shared by the kernels.

mod ring_buffer;
pub mod regression;
pub mod window;

pub use regression::PolyFit;
pub use ring_buffer::{RingBuffer, RingBufferIter};

//! Port traits (interfaces)
//!
//! These traits define the boundaries between the demodulator core and its
//! external collaborators. Adapters implement them.

pub mod codec;
pub mod sink;
pub mod source;

pub use codec::*;
pub use sink::*;
pub use source::*;

//! Adapters - implementations of the port traits
//!
//! - `file_source` / `file_sink` - raw IQ recordings in, decoded bytes out
//! - `memory` - in-memory source and sink, for tests and embedding
//! - `passthrough` - identity decoder and deframer for uncoded or
//!   externally processed streams

pub mod file_sink;
pub mod file_source;
pub mod memory;
pub mod passthrough;

pub use file_sink::FileSink;
pub use file_source::{FileSource, SampleFormat};
pub use memory::{MemorySink, MemorySource};
pub use passthrough::{PassthroughDecoder, PassthroughDeframer};

//! Sample source port

use crate::domain::{DemodResult, Sample};

/// Producer of raw complex samples (file, device, memory)
pub trait SampleSource: Send {
    /// Fill up to `buf.len()` samples, returning how many were written.
    /// `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [Sample]) -> DemodResult<usize>;

    /// Fraction of the stream consumed so far, if the length is known
    fn progress(&self) -> Option<f32> {
        None
    }
}

//! Output sink port

use crate::domain::DemodResult;

/// Consumer of the final byte/frame stream
pub trait FrameSink: Send {
    fn write(&mut self, bytes: &[u8]) -> DemodResult<()>;

    /// Called once after the last write
    fn finish(&mut self) -> DemodResult<()> {
        Ok(())
    }
}

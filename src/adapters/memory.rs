//! In-memory source and sink

use std::sync::{Arc, Mutex};

use crate::domain::{DemodError, DemodResult, Sample};
use crate::ports::{FrameSink, SampleSource};

/// Source replaying a buffer of samples
pub struct MemorySource {
    samples: Vec<Sample>,
    position: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }
}

impl SampleSource for MemorySource {
    fn read(&mut self, buf: &mut [Sample]) -> DemodResult<usize> {
        let remaining = &self.samples[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }

    fn progress(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return Some(1.0);
        }
        Some(self.position as f32 / self.samples.len() as f32)
    }
}

/// Sink collecting output into a shared buffer.
///
/// Clones share the buffer, so a test can keep one handle while the
/// pipeline owns the other.
#[derive(Clone, Default)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
    finished: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Number of times `finish` was called
    pub fn finish_count(&self) -> usize {
        self.finished.lock().map(|n| *n).unwrap_or(0)
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> DemodResult<()> {
        self.bytes
            .lock()
            .map_err(|_| DemodError::Collaborator("memory sink poisoned".into()))?
            .extend_from_slice(bytes);
        Ok(())
    }

    fn finish(&mut self) -> DemodResult<()> {
        *self
            .finished
            .lock()
            .map_err(|_| DemodError::Collaborator("memory sink poisoned".into()))? += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_replays_in_chunks() {
        let samples: Vec<Sample> = (0..5).map(|i| Sample::new(i as f32, 0.0)).collect();
        let mut source = MemorySource::new(samples);
        let mut buf = [Sample::new(0.0, 0.0); 3];

        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(source.progress(), Some(0.6));
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(buf[1], Sample::new(4.0, 0.0));
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn sink_clones_share_buffer() {
        let handle = MemorySink::new();
        let mut sink = handle.clone();
        sink.write(b"HR").unwrap();
        sink.write(b"PT").unwrap();
        sink.finish().unwrap();
        assert_eq!(handle.contents(), b"HRPT");
        assert_eq!(handle.finish_count(), 1);
    }
}

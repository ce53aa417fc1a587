//! File sink for the decoded stream

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::DemodResult;
use crate::ports::FrameSink;

pub struct FileSink {
    writer: BufWriter<File>,
    written: u64,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> DemodResult<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl FrameSink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> DemodResult<()> {
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> DemodResult<()> {
        self.writer.flush()?;
        log::debug!("Output flushed, {} bytes", self.written);
        Ok(())
    }
}

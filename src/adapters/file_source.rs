//! Raw IQ file source
//!
//! Interleaved I/Q recordings as written by common SDR tools. The format is
//! always chosen explicitly, never guessed from the file name.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{DemodError, DemodResult, Sample};
use crate::ports::SampleSource;

/// On-disk sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 32-bit float pairs, little endian
    Cf32,
    /// 16-bit signed pairs, little endian
    Cs16,
    /// 8-bit unsigned pairs centred on 127.5 (RTL-SDR)
    Cu8,
    /// 8-bit signed pairs
    Cs8,
}

impl SampleFormat {
    /// Bytes per complex sample
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::Cf32 => 8,
            SampleFormat::Cs16 => 4,
            SampleFormat::Cu8 | SampleFormat::Cs8 => 2,
        }
    }

    /// Decode one complex sample from exactly `sample_size()` bytes
    pub fn decode(self, bytes: &[u8]) -> Sample {
        match self {
            SampleFormat::Cf32 => Sample::new(
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
                f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            ),
            SampleFormat::Cs16 => Sample::new(
                i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
                i16::from_le_bytes([bytes[2], bytes[3]]) as f32 / 32768.0,
            ),
            SampleFormat::Cu8 => Sample::new(
                (bytes[0] as f32 - 127.5) / 127.5,
                (bytes[1] as f32 - 127.5) / 127.5,
            ),
            SampleFormat::Cs8 => Sample::new(
                bytes[0] as i8 as f32 / 128.0,
                bytes[1] as i8 as f32 / 128.0,
            ),
        }
    }
}

impl FromStr for SampleFormat {
    type Err = DemodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cf32" | "f32" => Ok(SampleFormat::Cf32),
            "cs16" | "i16" => Ok(SampleFormat::Cs16),
            "cu8" | "u8" => Ok(SampleFormat::Cu8),
            "cs8" | "i8" => Ok(SampleFormat::Cs8),
            other => Err(DemodError::config(format!(
                "Unknown sample format '{other}', must be one of cf32, cs16, cu8, cs8"
            ))),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::Cf32 => "cf32",
            SampleFormat::Cs16 => "cs16",
            SampleFormat::Cu8 => "cu8",
            SampleFormat::Cs8 => "cs8",
        };
        f.write_str(name)
    }
}

/// Sample source backed by a raw IQ file
pub struct FileSource<R = BufReader<File>> {
    reader: R,
    format: SampleFormat,
    bytes: Vec<u8>,
    bytes_read: u64,
    total_bytes: Option<u64>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, format: SampleFormat) -> DemodResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let total = file.metadata()?.len();
        log::info!(
            "Opened {} ({format}, {} samples)",
            path.display(),
            total / format.sample_size() as u64
        );
        Ok(Self::with_length(BufReader::new(file), format, Some(total)))
    }
}

impl<R: Read + Send> FileSource<R> {
    /// Wrap any reader; `total_bytes` enables progress reporting
    pub fn with_length(reader: R, format: SampleFormat, total_bytes: Option<u64>) -> Self {
        Self {
            reader,
            format,
            bytes: Vec::new(),
            bytes_read: 0,
            total_bytes,
        }
    }

    /// Read until `want` bytes are buffered or the reader is exhausted
    fn fill(&mut self, want: usize) -> DemodResult<usize> {
        self.bytes.resize(want, 0);
        let mut filled = 0;
        while filled < want {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.bytes_read += filled as u64;
        Ok(filled)
    }
}

impl<R: Read + Send> SampleSource for FileSource<R> {
    fn read(&mut self, buf: &mut [Sample]) -> DemodResult<usize> {
        let size = self.format.sample_size();
        let filled = self.fill(buf.len() * size)?;

        // A trailing partial sample can only occur at end of file; drop it
        let count = filled / size;
        for (out, chunk) in buf.iter_mut().zip(self.bytes[..count * size].chunks_exact(size)) {
            *out = self.format.decode(chunk);
        }
        Ok(count)
    }

    fn progress(&self) -> Option<f32> {
        self.total_bytes
            .filter(|&total| total > 0)
            .map(|total| (self.bytes_read as f64 / total as f64) as f32)
    }
}

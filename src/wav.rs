//! Canonical 44-byte PCM WAV header and the reserve-then-patch writer.
//!
//! The data size is only known once capture stops, so the header region is
//! skipped before any audio is written and filled in afterwards.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

use crate::config::CaptureConfig;

pub const HEADER_SIZE: usize = 44;

const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_size: u32,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `config` with both size fields still zero.
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            riff_size: 0,
            num_channels: config.channels,
            sample_rate: config.sample_rate,
            byte_rate: config.byte_rate(),
            block_align: config.block_align(),
            bits_per_sample: config.bit_depth.bits(),
            data_size: 0,
        }
    }

    /// Fills in the size fields for `frames` captured frames.
    ///
    /// RIFF sizes are 32-bit; anything larger is clamped to `u32::MAX`.
    pub fn set_frames(&mut self, frames: u64) {
        let data_size = frames * self.block_align as u64;
        let riff_size = data_size + HEADER_SIZE as u64 - 8;
        if riff_size > u32::MAX as u64 {
            log::warn!("capture of {data_size} bytes exceeds the WAV size limit, header sizes clamped");
        }
        self.data_size = u32::try_from(data_size).unwrap_or(u32::MAX);
        self.riff_size = u32::try_from(riff_size).unwrap_or(u32::MAX);
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];

        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.riff_size.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        header[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_size.to_le_bytes());

        header
    }
}

/// Outputs that can drop bytes past the audio the header describes.
///
/// A write that fails part way through a block can leave a partial frame
/// on disk; it is cut off so the data chunk ends where the header says.
pub trait Truncate {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl<T: Truncate + ?Sized> Truncate for &mut T {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate(len)
    }
}

impl Truncate for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Seekable output with a header region reserved at offset 0.
pub struct WavWriter<W: Write + Seek + Truncate> {
    inner: W,
    header: WavHeader,
}

impl<W: Write + Seek + Truncate> WavWriter<W> {
    /// Positions `inner` just past the header so audio lands at the right offset.
    pub fn new(mut inner: W, header: WavHeader) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        Ok(Self { inner, header })
    }

    /// Sink for the raw PCM that follows the header.
    pub fn data(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Writes the completed header over the reserved region and drops
    /// anything written past the last whole frame.
    ///
    /// `frames` must only count frames that already reached `inner`; nothing
    /// is flushed before the seek, so a sink that just failed a write is not
    /// asked to write the same bytes again.
    pub fn finalize(mut self, frames: u64) -> io::Result<(W, WavHeader)> {
        self.header.set_frames(frames);
        self.inner.seek(SeekFrom::Start(0))?;
        self.inner.write_all(&self.header.to_bytes())?;
        self.inner.flush()?;
        let end = HEADER_SIZE as u64 + frames * self.header.block_align as u64;
        self.inner.truncate(end)?;
        Ok((self.inner, self.header))
    }
}

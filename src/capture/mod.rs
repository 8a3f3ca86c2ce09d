mod device;

pub use device::AlsaDevice;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{CaptureConfig, OutputMode};
use crate::error::Error;

/// A blocking source of interleaved PCM frames.
pub trait PcmSource {
    /// Frames requested per read; sizes the reusable buffer.
    fn buffer_frames(&self) -> usize;
    fn frame_bytes(&self) -> usize;
    /// Blocks until data is available and returns the number of frames read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}

/// State shared between the interrupt handler and the capture loop.
#[derive(Debug, Clone)]
pub struct CaptureContext {
    pub running: Arc<AtomicBool>,
    pub mode: OutputMode,
}

impl CaptureContext {
    pub fn new(running: Arc<AtomicBool>, mode: OutputMode) -> Self {
        Self { running, mode }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum StopReason {
    Interrupted,
    TimeLimit,
    Failed(Error),
}

#[derive(Debug)]
pub struct CaptureReport {
    /// Frames that made it to the output.
    pub frames: u64,
    pub stop: StopReason,
}

impl CaptureReport {
    pub fn into_result(self) -> Result<u64, Error> {
        match self.stop {
            StopReason::Failed(err) => Err(err),
            StopReason::Interrupted | StopReason::TimeLimit => Ok(self.frames),
        }
    }
}

/// Copies frames from `source` to `sink` until interrupted, the time limit
/// is reached, or a read/write fails.
///
/// The limit is checked once per buffer with integer seconds, so a capture
/// runs up to one buffer past the requested duration.
pub fn run<S, W>(
    source: &mut S,
    sink: &mut W,
    config: &CaptureConfig,
    ctx: &CaptureContext,
) -> Result<CaptureReport, Error>
where
    S: PcmSource + ?Sized,
    W: Write + ?Sized,
{
    let frame_bytes = source.frame_bytes();
    let size = source
        .buffer_frames()
        .checked_mul(frame_bytes)
        .ok_or(Error::Allocation { bytes: usize::MAX })?;
    let mut buffer: Vec<u8> = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| Error::Allocation { bytes: size })?;
    buffer.resize(size, 0);

    if ctx.mode.prints_info() {
        println!(
            "Capturing sample: {} ch, {} hz, {} bit",
            config.channels,
            config.sample_rate,
            config.bit_depth.bits()
        );
    }

    let rate = config.sample_rate as u64;
    let mut total_frames: u64 = 0;

    loop {
        if !ctx.is_running() {
            log::info!("interrupted after {total_frames} frames");
            return Ok(CaptureReport {
                frames: total_frames,
                stop: StopReason::Interrupted,
            });
        }

        let frames = match source.read(&mut buffer) {
            Ok(frames) => frames,
            Err(err) => {
                return Ok(CaptureReport {
                    frames: total_frames,
                    stop: StopReason::Failed(err),
                });
            }
        };

        let limit_reached = config
            .time_limit
            .is_some_and(|limit| (total_frames + frames as u64) / rate >= limit as u64);

        if let Err(err) = sink.write_all(&buffer[..frames * frame_bytes]) {
            return Ok(CaptureReport {
                frames: total_frames,
                stop: StopReason::Failed(Error::Write(err)),
            });
        }
        total_frames += frames as u64;

        if limit_reached {
            log::info!("time limit reached after {total_frames} frames");
            return Ok(CaptureReport {
                frames: total_frames,
                stop: StopReason::TimeLimit,
            });
        }
    }
}

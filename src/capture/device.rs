use super::PcmSource;
use crate::config::CaptureConfig;
use crate::error::Error;
use alsa::pcm::{Access, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};

/// A hardware capture PCM opened as `hw:<card>,<device>`.
///
/// Dropping it closes the device.
pub struct AlsaDevice {
    pcm: PCM,
    name: String,
    buffer_frames: usize,
    frame_bytes: usize,
    recoveries: u64,
}

impl AlsaDevice {
    pub fn open(config: &CaptureConfig) -> Result<Self, Error> {
        let name = config.device_name();
        let pcm = PCM::new(&name, Direction::Capture, false).map_err(|source| Error::DeviceOpen {
            device: name.clone(),
            source,
        })?;

        let not_ready = |err: alsa::Error| Error::DeviceConfig {
            device: name.clone(),
            reason: err.to_string(),
        };

        {
            let hwp = HwParams::any(&pcm).map_err(not_ready)?;
            hwp.set_access(Access::RWInterleaved).map_err(not_ready)?;
            hwp.set_format(config.bit_depth.alsa_format()).map_err(not_ready)?;
            hwp.set_channels(config.channels as u32).map_err(not_ready)?;
            hwp.set_rate_resample(false).map_err(not_ready)?;
            hwp.set_rate(config.sample_rate, ValueOr::Nearest).map_err(not_ready)?;
            hwp.set_period_size_near(config.period_size as Frames, ValueOr::Nearest)
                .map_err(not_ready)?;
            hwp.set_periods(config.period_count, ValueOr::Nearest).map_err(not_ready)?;
            pcm.hw_params(&hwp).map_err(not_ready)?;
        }

        let current = pcm.hw_params_current().map_err(not_ready)?;
        let rate = current.get_rate().map_err(not_ready)?;
        if rate != config.sample_rate {
            return Err(Error::DeviceConfig {
                device: name.clone(),
                reason: format!("requested {} Hz but the device runs at {rate} Hz", config.sample_rate),
            });
        }
        let buffer_size = current.get_buffer_size().map_err(not_ready)?;
        let period_size = current.get_period_size().map_err(not_ready)?;
        drop(current);

        {
            let swp = pcm.sw_params_current().map_err(not_ready)?;
            swp.set_start_threshold(1).map_err(not_ready)?;
            pcm.sw_params(&swp).map_err(not_ready)?;
        }
        pcm.prepare().map_err(not_ready)?;

        let frame_bytes = pcm.frames_to_bytes(1) as usize;
        log::debug!(
            "opened {name}: {} ch, {rate} Hz, {:?}, period {period_size}, buffer {buffer_size} frames",
            config.channels,
            config.bit_depth.alsa_format(),
        );

        Ok(Self {
            pcm,
            name,
            buffer_frames: buffer_size as usize,
            frame_bytes,
            recoveries: 0,
        })
    }
}

impl PcmSource for AlsaDevice {
    fn buffer_frames(&self) -> usize {
        self.buffer_frames
    }

    fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        loop {
            match self.pcm.io_bytes().readi(buf) {
                Ok(frames) => return Ok(frames),
                Err(err) => {
                    // Overruns and suspends are recovered by re-preparing the PCM.
                    let reason = err.to_string();
                    self.pcm
                        .try_recover(err, true)
                        .map_err(|_| Error::Read(reason.clone()))?;
                    self.recoveries += 1;
                    log::warn!("{}: recovered from {reason} ({} so far)", self.name, self.recoveries);
                }
            }
        }
    }
}

impl Drop for AlsaDevice {
    fn drop(&mut self) {
        if self.recoveries > 0 {
            log::info!("closing {} after {} overrun recoveries", self.name, self.recoveries);
        }
    }
}

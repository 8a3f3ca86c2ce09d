use std::path::PathBuf;

use crate::error::Error;

/// Sample formats the recorder knows how to describe in a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    S16,
    /// Packed 3-byte samples, so the file's block alignment matches the header.
    S24,
    S32,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::S16 => 16,
            BitDepth::S24 => 24,
            BitDepth::S32 => 32,
        }
    }

    pub fn bytes_per_sample(self) -> u16 {
        self.bits() / 8
    }

    pub fn alsa_format(self) -> alsa::pcm::Format {
        match self {
            BitDepth::S16 => alsa::pcm::Format::S16LE,
            BitDepth::S24 => alsa::pcm::Format::S243LE,
            BitDepth::S32 => alsa::pcm::Format::S32LE,
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            16 => Ok(BitDepth::S16),
            24 => Ok(BitDepth::S24),
            32 => Ok(BitDepth::S32),
            other => Err(Error::UnsupportedBitDepth(other)),
        }
    }
}

/// Fully determines how the capture device is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub card: u32,
    pub device: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
    pub period_size: u32,
    pub period_count: u32,
    /// Seconds; `None` captures until interrupted.
    pub time_limit: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            card: 0,
            device: 0,
            channels: 2,
            sample_rate: 48000,
            bit_depth: BitDepth::S16,
            period_size: 1024,
            period_count: 4,
            time_limit: None,
        }
    }
}

impl CaptureConfig {
    /// Checks that the derived WAV fields fit their on-disk widths.
    pub fn validate(self) -> Result<Self, Error> {
        if self.channels == 0 {
            return Err(Error::InvalidConfig("channel count must be at least 1".into()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be at least 1 Hz".into()));
        }
        if self.period_size == 0 || self.period_count == 0 {
            return Err(Error::InvalidConfig(
                "period size and period count must be at least 1".into(),
            ));
        }

        let block_align = self
            .channels
            .checked_mul(self.bit_depth.bytes_per_sample())
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{} channels of {}-bit audio exceed the WAV block size",
                    self.channels,
                    self.bit_depth.bits()
                ))
            })?;
        self.sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "{} Hz at {block_align} bytes per frame exceeds the WAV byte rate",
                    self.sample_rate
                ))
            })?;

        Ok(self)
    }

    /// ALSA device string for the configured card and device.
    pub fn device_name(&self) -> String {
        format!("hw:{},{}", self.card, self.device)
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth.bytes_per_sample()
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Where captured audio goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

/// Token that selects standard output instead of a file.
pub const STDOUT_TOKEN: &str = "--";

impl OutputTarget {
    pub fn from_arg(arg: &str) -> Self {
        if arg == STDOUT_TOKEN {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Seekable file: header is written, progress is printed.
    File,
    /// Raw PCM on stdout: no header and nothing else on stdout.
    Stream,
}

impl OutputMode {
    pub fn prints_info(self) -> bool {
        self == OutputMode::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_bit_depths() {
        assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::S16);
        assert_eq!(BitDepth::try_from(24).unwrap(), BitDepth::S24);
        assert_eq!(BitDepth::try_from(32).unwrap(), BitDepth::S32);
    }

    #[test]
    fn other_bit_depths_are_rejected() {
        for bits in [0, 8, 20, 64] {
            let err = BitDepth::try_from(bits).unwrap_err();
            assert!(matches!(err, Error::UnsupportedBitDepth(b) if b == bits));
            assert_eq!(err.to_string(), format!("{bits} bits is not supported"));
        }
    }

    #[test]
    fn derived_sizes() {
        let config = CaptureConfig::default();
        assert_eq!(config.block_align(), 4);
        assert_eq!(config.byte_rate(), 192_000);

        let config = CaptureConfig {
            channels: 6,
            sample_rate: 44100,
            bit_depth: BitDepth::S24,
            ..CaptureConfig::default()
        };
        assert_eq!(config.block_align(), 18);
        assert_eq!(config.byte_rate(), 44100 * 18);
    }

    #[test]
    fn validate_rejects_zero_rate_and_channels() {
        let zero_rate = CaptureConfig {
            sample_rate: 0,
            ..CaptureConfig::default()
        };
        assert!(matches!(zero_rate.validate(), Err(Error::InvalidConfig(_))));

        let zero_channels = CaptureConfig {
            channels: 0,
            ..CaptureConfig::default()
        };
        assert!(matches!(zero_channels.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_oversized_frames() {
        let config = CaptureConfig {
            channels: u16::MAX,
            bit_depth: BitDepth::S32,
            ..CaptureConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = CaptureConfig {
            channels: 1024,
            sample_rate: u32::MAX / 1000,
            ..CaptureConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn device_name_uses_hw_plugin() {
        let config = CaptureConfig {
            card: 1,
            device: 3,
            ..CaptureConfig::default()
        };
        assert_eq!(config.device_name(), "hw:1,3");
    }

    #[test]
    fn dash_dash_selects_stdout() {
        let target = OutputTarget::from_arg("--");
        assert_eq!(target, OutputTarget::Stdout);

        let target = OutputTarget::from_arg("take1.wav");
        assert_eq!(target, OutputTarget::File(PathBuf::from("take1.wav")));

        assert!(OutputMode::File.prints_info());
        assert!(!OutputMode::Stream.prints_info());
    }
}

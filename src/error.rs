use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can end a capture run early.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no file specified")]
    NoOutput,

    #[error("{0} bits is not supported")]
    UnsupportedBitDepth(u32),

    #[error("invalid capture configuration: {0}")]
    InvalidConfig(String),

    #[error("unable to open PCM device {device} ({source})")]
    DeviceOpen {
        device: String,
        #[source]
        source: alsa::Error,
    },

    #[error("PCM device {device} is not ready ({reason})")]
    DeviceConfig { device: String, reason: String },

    #[error("unable to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    #[error("unable to create file '{}': {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error capturing sample: {0}")]
    Read(String),

    #[error("error capturing sample: {0}")]
    Write(#[source] io::Error),

    #[error("failed to write WAV header: {0}")]
    Header(#[source] io::Error),

    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

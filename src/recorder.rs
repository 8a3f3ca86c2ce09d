use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::capture::{self, CaptureContext, CaptureReport, PcmSource, StopReason};
use crate::config::{CaptureConfig, OutputMode, OutputTarget};
use crate::error::Error;
use crate::wav::{Truncate, WavHeader, WavWriter};

/// Captures from `source` into `target`.
///
/// Files get a header reserved up front and patched once capture stops,
/// even when it stopped on a read or write failure. Stdout gets raw PCM only.
pub fn record<S: PcmSource + ?Sized>(
    source: &mut S,
    config: &CaptureConfig,
    target: &OutputTarget,
    running: &Arc<AtomicBool>,
) -> Result<CaptureReport, Error> {
    match target {
        OutputTarget::Stdout => {
            let mut out = BufWriter::new(io::stdout().lock());
            record_stream(source, config, &mut out, running)
        }
        OutputTarget::File(path) => {
            let file = File::create(path).map_err(|source| Error::CreateOutput {
                path: path.clone(),
                source,
            })?;
            log::debug!("recording to {}", path.display());
            // Unbuffered: every block is a whole device buffer, and a frame only
            // counts once the write that carried it returned.
            record_wav(source, config, file, running)
        }
    }
}

/// Raw PCM with no header and no informational output.
fn record_stream<S, W>(
    source: &mut S,
    config: &CaptureConfig,
    out: &mut W,
    running: &Arc<AtomicBool>,
) -> Result<CaptureReport, Error>
where
    S: PcmSource + ?Sized,
    W: Write + ?Sized,
{
    let ctx = CaptureContext::new(running.clone(), OutputMode::Stream);
    let mut report = capture::run(source, out, config, &ctx)?;
    if let Err(err) = out.flush() {
        if !matches!(report.stop, StopReason::Failed(_)) {
            report.stop = StopReason::Failed(Error::Write(err));
        }
    }
    Ok(report)
}

/// WAV with the header patched from the frames that reached `sink`.
///
/// A capture failure stays the reported error; a header failure after it is
/// only logged.
fn record_wav<S, W>(
    source: &mut S,
    config: &CaptureConfig,
    sink: W,
    running: &Arc<AtomicBool>,
) -> Result<CaptureReport, Error>
where
    S: PcmSource + ?Sized,
    W: Write + Seek + Truncate,
{
    let ctx = CaptureContext::new(running.clone(), OutputMode::File);
    let mut wav = WavWriter::new(sink, WavHeader::new(config)).map_err(Error::Header)?;

    let report = capture::run(source, wav.data(), config, &ctx)?;

    match wav.finalize(report.frames) {
        Ok((_, header)) => {
            log::debug!("wrote header for {} data bytes", header.data_size);
        }
        Err(err) if matches!(report.stop, StopReason::Failed(_)) => {
            log::error!("failed to write WAV header: {err}");
        }
        Err(err) => return Err(Error::Header(err)),
    }

    println!("Captured {} frames.", report.frames);
    Ok(report)
}

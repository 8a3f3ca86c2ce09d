//! Command-line interface for tinycap
//!
//! Flag parsing, the `--` stdout sentinel and logging setup.

use std::ffi::OsString;

use clap::{ArgAction, CommandFactory, Parser};

use crate::config::{BitDepth, CaptureConfig, OutputTarget, STDOUT_TOKEN};
use crate::error::Error;

/// tinycap - capture PCM audio from an ALSA device
#[derive(Parser, Debug)]
#[command(name = "tinycap", disable_help_flag = true, disable_version_flag = true)]
#[command(after_help = "The output argument may be a path to a file or stdout, indicated by '--'.")]
pub struct Args {
    /// Sound card index
    #[arg(short = 'D', long, default_value_t = 0)]
    pub card: u32,

    /// PCM device index on the card
    #[arg(short = 'd', long, default_value_t = 0)]
    pub device: u32,

    /// Number of channels
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..))]
    pub channels: u16,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 48000, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate: u32,

    /// Bits per sample (16, 24 or 32)
    #[arg(short, long, default_value_t = 16)]
    pub bits: u32,

    /// Frames per period
    #[arg(short = 'p', long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    pub period_size: u32,

    /// Number of periods in the device buffer
    #[arg(short = 'P', long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub period_count: u32,

    /// Stop after this many seconds (default: until interrupted)
    #[arg(short, long)]
    pub time: Option<u32>,

    /// Print usage
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub help: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    pub version: bool,

    /// Output WAV file, or '--' for raw PCM on stdout
    pub output: Option<String>,
}

/// What the process was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Version,
    Capture {
        config: CaptureConfig,
        target: OutputTarget,
    },
}

impl Args {
    pub fn into_invocation(self) -> Result<Invocation, Error> {
        if self.help {
            return Ok(Invocation::Help);
        }
        if self.version {
            return Ok(Invocation::Version);
        }

        let output = self.output.ok_or(Error::NoOutput)?;
        let config = CaptureConfig {
            card: self.card,
            device: self.device,
            channels: self.channels,
            sample_rate: self.rate,
            bit_depth: BitDepth::try_from(self.bits)?,
            period_size: self.period_size,
            period_count: self.period_count,
            time_limit: self.time,
        }
        .validate()?;

        Ok(Invocation::Capture {
            config,
            target: OutputTarget::from_arg(&output),
        })
    }
}

/// clap consumes the first `--` as the end of options, so a lone trailing
/// `--` is doubled to reach the parser as the output argument.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let terminators = args
        .iter()
        .skip(1)
        .filter(|a| a.as_os_str() == STDOUT_TOKEN)
        .count();
    if terminators == 1 && args.last().is_some_and(|a| a.as_os_str() == STDOUT_TOKEN) {
        args.push(STDOUT_TOKEN.into());
    }
    args
}

pub fn print_help() {
    eprintln!("{}", Args::command().render_help());
}

pub fn print_version() {
    eprintln!("tinycap {}", env!("CARGO_PKG_VERSION"));
}

/// Logs go to stderr so they never mix with PCM on stdout.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let args = std::iter::once("tinycap")
            .chain(args.iter().copied())
            .map(OsString::from);
        Args::try_parse_from(normalize_args(args))
    }

    fn capture(args: &[&str]) -> (CaptureConfig, OutputTarget) {
        match parse(args).unwrap().into_invocation().unwrap() {
            Invocation::Capture { config, target } => (config, target),
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let (config, target) = capture(&["out.wav"]);
        assert_eq!(config, CaptureConfig::default());
        assert_eq!(target, OutputTarget::File(PathBuf::from("out.wav")));
    }

    #[test]
    fn short_flags() {
        let (config, _) = capture(&[
            "-D", "1", "-d", "2", "-c", "1", "-r", "16000", "-b", "24", "-p", "256", "-P", "8",
            "-t", "10", "out.wav",
        ]);
        assert_eq!(
            config,
            CaptureConfig {
                card: 1,
                device: 2,
                channels: 1,
                sample_rate: 16000,
                bit_depth: BitDepth::S24,
                period_size: 256,
                period_count: 8,
                time_limit: Some(10),
            }
        );
    }

    #[test]
    fn long_flags() {
        let (config, _) = capture(&[
            "--card=3",
            "--device",
            "1",
            "--channels",
            "4",
            "--rate",
            "44100",
            "--bits",
            "32",
            "--period-size",
            "512",
            "--period-count",
            "2",
            "--time",
            "5",
            "out.wav",
        ]);
        assert_eq!(config.card, 3);
        assert_eq!(config.device, 1);
        assert_eq!(config.channels, 4);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.bit_depth, BitDepth::S32);
        assert_eq!(config.period_size, 512);
        assert_eq!(config.period_count, 2);
        assert_eq!(config.time_limit, Some(5));
    }

    #[test]
    fn lone_dash_dash_selects_stdout() {
        let (_, target) = capture(&["-r", "8000", "--"]);
        assert_eq!(target, OutputTarget::Stdout);

        let (_, target) = capture(&["--", "--"]);
        assert_eq!(target, OutputTarget::Stdout);
    }

    #[test]
    fn missing_output() {
        let err = parse(&["-r", "8000"]).unwrap().into_invocation().unwrap_err();
        assert!(matches!(err, Error::NoOutput));
        assert_eq!(err.to_string(), "no file specified");
    }

    #[test]
    fn malformed_number_fails_without_creating_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let path_arg = path.to_str().unwrap();

        let err = parse(&["--rate", "abc", path_arg]).unwrap_err();
        assert!(err.to_string().contains("abc"));
        assert!(!path.exists());

        assert!(parse(&["-c", "-1", path_arg]).is_err());
        assert!(parse(&["-t", "1.5", path_arg]).is_err());
        assert!(parse(&["-p", "0", path_arg]).is_err());
    }

    #[test]
    fn unsupported_bit_depth() {
        let err = parse(&["-b", "8", "out.wav"]).unwrap().into_invocation().unwrap_err();
        assert!(matches!(err, Error::UnsupportedBitDepth(8)));
    }

    #[test]
    fn help_and_version_win_over_capture() {
        let invocation = parse(&["-h", "out.wav"]).unwrap().into_invocation().unwrap();
        assert_eq!(invocation, Invocation::Help);

        let invocation = parse(&["--version"]).unwrap().into_invocation().unwrap();
        assert_eq!(invocation, Invocation::Version);
    }

    #[test]
    fn help_mentions_stdout_sentinel() {
        let help = Args::command().render_help().to_string();
        assert!(help.contains("--period-count"));
        assert!(help.contains("indicated by '--'"));
    }
}

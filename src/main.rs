mod capture;
mod cli;
mod config;
mod error;
mod recorder;
mod signal;
mod wav;

use capture::AlsaDevice;
use clap::Parser;
use cli::Invocation;
use error::Error;

fn main() {
    let args = match cli::Args::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    cli::init_logging();

    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: cli::Args) -> Result<(), Error> {
    let (config, target) = match args.into_invocation()? {
        Invocation::Help => {
            cli::print_help();
            std::process::exit(1);
        }
        Invocation::Version => {
            cli::print_version();
            std::process::exit(1);
        }
        Invocation::Capture { config, target } => (config, target),
    };

    let running = signal::install_stop_handler()?;

    // Open the device first so a device failure leaves no file behind.
    let mut device = AlsaDevice::open(&config)?;
    let report = recorder::record(&mut device, &config, &target, &running)?;
    drop(device);

    report.into_result()?;
    Ok(())
}

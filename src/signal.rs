use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// Installs a SIGINT handler that only clears the returned flag.
///
/// The flag starts out `true` ("capturing"); the capture loop polls it
/// between reads.
pub fn install_stop_handler() -> Result<Arc<AtomicBool>, Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}

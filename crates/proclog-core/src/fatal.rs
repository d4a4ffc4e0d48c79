//! Handling of terminal-severity events.
//!
//! The writer only *requests* termination; what that means is decided by the
//! [`FatalHandler`] the logger was built with.

use std::io::Write;

/// Receives FATAL lines after they have been written (or failed to be).
pub trait FatalHandler: Send + Sync {
    /// Echo the encoded line somewhere a human will see it.
    fn mirror(&self, line: &[u8]);

    /// Stop the process. Implementations used outside tests should not return.
    fn terminate(&self);
}

/// Mirrors to stderr and exits with status 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitProcess;

impl FatalHandler for ExitProcess {
    fn mirror(&self, line: &[u8]) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line);
        let _ = stderr.flush();
    }

    fn terminate(&self) {
        std::process::exit(1);
    }
}

//! Cooperative shutdown flag shared by the long-running components
//! (Design Notes "Signal handling"; §5 "SIGINT/SIGTERM request a
//! drain").
//!
//! One flag per component, flipped by a signal handler; every
//! blocking loop checks it between iterations. A second signal
//! escalates to a hard exit with code 1, mirroring
//! `blockarchiver.py`'s `gogently` handler.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// A flag a run loop polls between suspension points, plus a counter
/// of how many termination signals have arrived.
#[derive(Clone)]
pub struct ShutdownFlag {
    go: Arc<AtomicBool>,
    signals_received: Arc<AtomicU8>,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            go: Arc::new(AtomicBool::new(true)),
            signals_received: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Whether the run loop should keep going.
    pub fn should_continue(&self) -> bool {
        self.go.load(Ordering::SeqCst)
    }

    /// Requests a cooperative stop. The first call lets the current
    /// unit of work finish; a second call hard-exits with code 1
    /// (§6 Exit codes).
    pub fn stop(&self) {
        let previous = self.signals_received.fetch_add(1, Ordering::SeqCst);
        self.go.store(false, Ordering::SeqCst);
        if previous >= 1 {
            std::process::exit(1);
        }
    }

    /// Installs SIGINT/SIGTERM handlers that call [`Self::stop`].
    /// Spawns a background task for the lifetime of the process.
    pub fn install(&self) {
        let flag = self.clone();
        tokio::spawn(async move {
            let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("could not install SIGTERM handler: {e}");
                    return;
                }
            };
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => flag.stop(),
                    _ = sigterm.recv() => flag.stop(),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_stop_is_cooperative() {
        let flag = ShutdownFlag::new();
        assert!(flag.should_continue());
        flag.stop();
        assert!(!flag.should_continue());
    }
}

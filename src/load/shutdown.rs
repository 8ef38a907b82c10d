//! Signal-driven cooperative shutdown with a two-stage interrupt policy.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::warn;

/// Exit status for a forced (second-interrupt) shutdown, distinct from the
/// status configuration and provisioning failures produce.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Signals that request a graceful stop.
const TERMINATION_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGHUP, SIGQUIT];

/// What a delivered signal means for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Stop starting new work, let in-flight requests finish.
    Drain,
    /// Abandon in-flight work and exit immediately.
    ForceExit,
}

/// Cancellation flag polled by every worker before each iteration.
///
/// Monotonic: once set it never reverts, so a stale read only delays a
/// worker's exit by one iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn is_terminating(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Set the flag, returning whether this call flipped it.
    pub fn request(&self) -> bool {
        !self.0.swap(true, Ordering::Release)
    }
}

/// Decides what each delivered signal means and owns the watcher thread.
///
/// The decision logic lives in [`on_signal`](Self::on_signal), separate from
/// handler installation, so the escalation policy is testable without
/// raising real signals.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    flag: ShutdownFlag,
    interrupts: AtomicUsize,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flag workers poll.
    pub fn flag(&self) -> ShutdownFlag {
        self.flag.clone()
    }

    /// First receipt of any termination signal requests a drain and logs a
    /// one-time notice. A second interrupt escalates to a forced exit;
    /// repeats of every other signal only ever set the flag.
    pub fn on_signal(&self, signal: i32) -> SignalAction {
        if signal == SIGINT && self.interrupts.fetch_add(1, Ordering::SeqCst) >= 1 {
            return SignalAction::ForceExit;
        }
        if self.flag.request() {
            warn!(
                signal,
                "Shutdown requested, finishing in-flight orders (interrupt again to abort)"
            );
        }
        SignalAction::Drain
    }

    /// Install handlers for interrupt, terminate, hangup and quit, and spawn
    /// the thread that applies the policy. A forced exit terminates the
    /// process from that thread with [`FORCED_EXIT_CODE`].
    pub fn install(self: Arc<Self>) -> io::Result<()> {
        let mut signals = Signals::new(TERMINATION_SIGNALS)?;
        thread::spawn(move || {
            for signal in signals.forever() {
                if self.on_signal(signal) == SignalAction::ForceExit {
                    warn!("Second interrupt, aborting with in-flight orders unfinished");
                    std::process::exit(FORCED_EXIT_CODE);
                }
            }
        });
        Ok(())
    }
}

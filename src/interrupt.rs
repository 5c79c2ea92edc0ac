//! Process-level interrupt handling.
//!
//! SIGINT and SIGTERM are routed through a single `ctrlc` handler. When no
//! playback pipeline is alive the handler stops any open selector, restores
//! the terminal and exits right away. While a pipeline is alive it only
//! raises a flag; the playback controller notices the flag, tears the
//! pipeline down and unwinds to exit, so the process group is never orphaned.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::terminal;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static PIPELINE_LIVE: AtomicBool = AtomicBool::new(false);
/// Pid of the selector currently holding the terminal, 0 when none
static SELECTOR_PID: AtomicI32 = AtomicI32::new(0);

const SELECTOR_GRACE: Duration = Duration::from_millis(500);

/// Install the SIGINT/SIGTERM handler. Call once at startup.
pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        INTERRUPTED.store(true, Ordering::SeqCst);
        if !PIPELINE_LIVE.load(Ordering::SeqCst) {
            let selector = SELECTOR_PID.swap(0, Ordering::SeqCst);
            if selector > 0 {
                stop_selector(Pid::from_raw(selector));
            }
            terminal::restore();
            println!("\nInterrupted. Exiting cleanly.");
            std::process::exit(0);
        }
        log::info!("Interrupt received while a pipeline is live, deferring exit");
    })
}

/// The process-wide flag raised by the handler
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

/// True once SIGINT or SIGTERM has been received
pub fn requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Record that a pipeline is starting or has stopped. Set before the first
/// process is spawned so the handler never exits past a half-started group.
pub(crate) fn set_pipeline_live(live: bool) {
    PIPELINE_LIVE.store(live, Ordering::SeqCst);
}

#[cfg(test)]
pub(crate) fn pipeline_live() -> bool {
    PIPELINE_LIVE.load(Ordering::SeqCst)
}

/// Marks a selector process as holding the terminal until dropped
pub(crate) struct SelectorRegistration;

pub(crate) fn register_selector(pid: u32) -> SelectorRegistration {
    SELECTOR_PID.store(pid as i32, Ordering::SeqCst);
    SelectorRegistration
}

impl Drop for SelectorRegistration {
    fn drop(&mut self) {
        SELECTOR_PID.store(0, Ordering::SeqCst);
    }
}

/// Terminate and reap a selector so it gives the terminal back.
/// Escalates to SIGKILL if it outlives a short grace period.
fn stop_selector(pid: Pid) {
    if signal::kill(pid, Signal::SIGTERM).is_err() {
        return;
    }

    let deadline = Instant::now() + SELECTOR_GRACE;
    loop {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {}
            _ => return,
        }
        if Instant::now() >= deadline {
            let _ = signal::kill(pid, Signal::SIGKILL);
            let _ = waitpid(pid, None);
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_not_interrupted_by_default() {
        assert!(!requested());
        assert!(!flag().load(Ordering::SeqCst));
    }

    #[test]
    fn test_stop_selector_reaps_child() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);

        stop_selector(pid);

        // reaped, so the pid no longer names a process of ours
        assert!(signal::kill(pid, None::<Signal>).is_err());
    }

    #[test]
    fn test_stop_selector_kills_child_ignoring_sigterm() {
        let child = Command::new("sh")
            .args(["-c", "trap '' TERM; exec sleep 30"])
            .spawn()
            .unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        // give sh time to install the trap
        thread::sleep(Duration::from_millis(100));

        let started = Instant::now();
        stop_selector(pid);

        assert!(started.elapsed() >= SELECTOR_GRACE);
        assert!(signal::kill(pid, None::<Signal>).is_err());
    }
}

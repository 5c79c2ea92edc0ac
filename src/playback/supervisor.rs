//! Process group supervisor for the decode → play pipeline.
//!
//! The decoder and the player run as two processes joined by a pipe. Both
//! are placed in one new process group so that stop, continue and terminate
//! signals reach them together. The group handle is owned by whoever called
//! `start` and is consumed by `terminate`, so only one session can drive a
//! pipeline at a time.

use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;

use crate::config::Config;
use crate::constants::URL_PLACEHOLDER;
use crate::error::{PlayerError, Result};
use crate::interrupt;

const REAP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Cleanly,
    Forcibly,
}

/// Lifecycle operations on a pipeline. `poll` never blocks; `terminate`
/// returns only once every process of the pipeline has exited.
pub trait Supervisor {
    type Handle;

    fn start(&mut self, locator: &str, title: &str, artist: &str) -> Result<Self::Handle>;

    fn suspend(&mut self, handle: &Self::Handle);

    fn resume(&mut self, handle: &Self::Handle);

    fn terminate(&mut self, handle: Self::Handle, timeout: Duration) -> Termination;

    fn poll(&mut self, handle: &mut Self::Handle) -> Liveness;
}

/// A running decoder + player process group
pub struct ProcessGroup {
    pgid: Pid,
    decoder: Child,
    player: Child,
    decoder_done: bool,
    player_done: bool,
}

impl ProcessGroup {
    /// OS process group id
    pub fn id(&self) -> i32 {
        self.pgid.as_raw()
    }

    fn finished(&self) -> bool {
        self.decoder_done && self.player_done
    }

    /// Reap whichever members have exited, without blocking
    fn reap(&mut self) {
        if !self.player_done {
            self.player_done = reap_child(&mut self.player, "player");
        }
        if !self.decoder_done {
            self.decoder_done = reap_child(&mut self.decoder, "decoder");
        }
    }

    /// Block until every member has exited
    fn wait_all(&mut self) {
        for (child, done, name) in [
            (&mut self.player, &mut self.player_done, "player"),
            (&mut self.decoder, &mut self.decoder_done, "decoder"),
        ] {
            if !*done {
                if let Err(e) = child.wait() {
                    log::warn!("Waiting for {name} failed: {e}");
                }
                *done = true;
            }
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.finished() {
            log::warn!("Pipeline group {} dropped while running, killing it", self.pgid);
            signal_group(self.pgid, Signal::SIGKILL);
            self.wait_all();
        }
        interrupt::set_pipeline_live(false);
    }
}

fn reap_child(child: &mut Child, name: &str) -> bool {
    match child.try_wait() {
        Ok(Some(status)) => {
            log::debug!("{name} exited: {status}");
            true
        }
        Ok(None) => false,
        Err(e) => {
            log::warn!("Could not check {name}: {e}");
            true
        }
    }
}

/// Signal the whole group. Failures (usually a group that already exited)
/// are logged and ignored.
fn signal_group(pgid: Pid, signal: Signal) {
    if let Err(e) = killpg(pgid, signal) {
        log::debug!("{signal} to group {pgid}: {}", PlayerError::from(e));
    }
}

/// Starts pipelines from the configured decoder and player commands
pub struct ProcessGroupSupervisor {
    decoder: String,
    decoder_args: Vec<String>,
    player: String,
    player_args: Vec<String>,
}

impl ProcessGroupSupervisor {
    pub fn new(
        decoder: impl Into<String>,
        decoder_args: Vec<String>,
        player: impl Into<String>,
        player_args: Vec<String>,
    ) -> Self {
        Self {
            decoder: decoder.into(),
            decoder_args,
            player: player.into(),
            player_args,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.decoder.clone(),
            config.decoder_args.clone(),
            config.player.clone(),
            config.player_args.clone(),
        )
    }

    fn decoder_args_for(&self, locator: &str) -> Vec<String> {
        self.decoder_args
            .iter()
            .map(|arg| arg.replace(URL_PLACEHOLDER, locator))
            .collect()
    }
}

impl Supervisor for ProcessGroupSupervisor {
    type Handle = ProcessGroup;

    fn start(&mut self, locator: &str, title: &str, artist: &str) -> Result<ProcessGroup> {
        interrupt::set_pipeline_live(true);

        let mut decoder = Command::new(&self.decoder)
            .args(self.decoder_args_for(locator))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|source| {
                interrupt::set_pipeline_live(false);
                PlayerError::Spawn {
                    program: self.decoder.clone(),
                    source,
                }
            })?;
        let pgid = Pid::from_raw(decoder.id() as i32);

        let audio = match decoder.stdout.take() {
            Some(stdout) => Stdio::from(stdout),
            None => Stdio::null(),
        };

        let player = Command::new(&self.player)
            .args(&self.player_args)
            .stdin(audio)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(pgid.as_raw())
            .spawn();

        let player = match player {
            Ok(player) => player,
            Err(source) => {
                signal_group(pgid, Signal::SIGKILL);
                let _ = decoder.wait();
                interrupt::set_pipeline_live(false);
                return Err(PlayerError::Spawn {
                    program: self.player.clone(),
                    source,
                });
            }
        };

        log::info!("Started pipeline group {pgid} for '{title}' by {artist}");

        Ok(ProcessGroup {
            pgid,
            decoder,
            player,
            decoder_done: false,
            player_done: false,
        })
    }

    fn suspend(&mut self, handle: &ProcessGroup) {
        signal_group(handle.pgid, Signal::SIGSTOP);
    }

    fn resume(&mut self, handle: &ProcessGroup) {
        signal_group(handle.pgid, Signal::SIGCONT);
    }

    fn terminate(&mut self, mut handle: ProcessGroup, timeout: Duration) -> Termination {
        handle.reap();
        if handle.finished() {
            return Termination::Cleanly;
        }

        signal_group(handle.pgid, Signal::SIGTERM);
        // stopped processes only act on SIGTERM once continued
        signal_group(handle.pgid, Signal::SIGCONT);

        let deadline = Instant::now() + timeout;
        loop {
            handle.reap();
            if handle.finished() {
                log::info!("Pipeline group {} terminated", handle.pgid);
                return Termination::Cleanly;
            }
            if Instant::now() >= deadline {
                let err = PlayerError::TerminationTimeout(timeout.as_millis() as u64);
                log::warn!("{err}, killing group {}", handle.pgid);
                signal_group(handle.pgid, Signal::SIGKILL);
                handle.wait_all();
                return Termination::Forcibly;
            }
            thread::sleep(REAP_INTERVAL);
        }
    }

    fn poll(&mut self, handle: &mut ProcessGroup) -> Liveness {
        handle.reap();
        // the player owns the audio device; once it is gone playback is over
        if handle.player_done {
            Liveness::Exited
        } else {
            Liveness::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // Tests that start pipelines share the process-wide live flag
    static PIPELINE_MUTEX: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        PIPELINE_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn shell(decoder_script: &str, player_script: &str) -> ProcessGroupSupervisor {
        ProcessGroupSupervisor::new(
            "sh",
            vec!["-c".to_string(), decoder_script.to_string()],
            "sh",
            vec!["-c".to_string(), player_script.to_string()],
        )
    }

    fn group_gone(pgid: i32) -> bool {
        killpg(Pid::from_raw(pgid), None::<Signal>).is_err()
    }

    fn wait_for_exit(supervisor: &mut ProcessGroupSupervisor, handle: &mut ProcessGroup) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if supervisor.poll(handle) == Liveness::Exited {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_locator_substituted_into_decoder_args() {
        let supervisor = ProcessGroupSupervisor::new(
            "ffmpeg",
            vec!["-i".to_string(), URL_PLACEHOLDER.to_string()],
            "ffplay",
            Vec::new(),
        );
        assert_eq!(
            supervisor.decoder_args_for("http://jf/a"),
            vec!["-i".to_string(), "http://jf/a".to_string()]
        );
    }

    #[test]
    fn test_missing_decoder_is_spawn_error() {
        let _serial = serial();
        let mut supervisor =
            ProcessGroupSupervisor::new("jly-fin-no-such-decoder", Vec::new(), "cat", Vec::new());
        match supervisor.start("x", "t", "a") {
            Err(PlayerError::Spawn { program, .. }) => assert_eq!(program, "jly-fin-no-such-decoder"),
            other => panic!("expected spawn error, got {:?}", other.map(|g| g.id())),
        }
    }

    #[test]
    fn test_missing_player_kills_decoder() {
        let _serial = serial();
        let mut supervisor = ProcessGroupSupervisor::new(
            "sh",
            vec!["-c".to_string(), "exec sleep 30".to_string()],
            "jly-fin-no-such-player",
            Vec::new(),
        );
        match supervisor.start("x", "t", "a") {
            Err(PlayerError::Spawn { program, .. }) => assert_eq!(program, "jly-fin-no-such-player"),
            other => panic!("expected spawn error, got {:?}", other.map(|g| g.id())),
        }
    }

    #[test]
    fn test_natural_end_is_reported_by_poll() {
        let _serial = serial();
        let mut supervisor = shell("echo audio", "cat > /dev/null");
        let mut handle = supervisor.start("x", "t", "a").unwrap();
        assert!(wait_for_exit(&mut supervisor, &mut handle));
        assert_eq!(
            supervisor.terminate(handle, Duration::from_secs(1)),
            Termination::Cleanly
        );
    }

    #[test]
    fn test_both_members_share_one_group() {
        let _serial = serial();
        let mut supervisor = shell("exec sleep 30", "exec sleep 30");
        let handle = supervisor.start("x", "t", "a").unwrap();
        let pgid = handle.id();
        assert_eq!(handle.decoder.id() as i32, pgid);
        let player_pgid = nix::unistd::getpgid(Some(Pid::from_raw(handle.player.id() as i32))).unwrap();
        assert_eq!(player_pgid.as_raw(), pgid);
        supervisor.terminate(handle, Duration::from_secs(2));
    }

    #[test]
    fn test_pause_resume_keeps_pipeline_running() {
        let _serial = serial();
        let mut supervisor = shell("exec sleep 30", "exec sleep 30");
        let mut handle = supervisor.start("x", "t", "a").unwrap();

        assert_eq!(supervisor.poll(&mut handle), Liveness::Running);
        supervisor.suspend(&handle);
        supervisor.suspend(&handle);
        assert_eq!(supervisor.poll(&mut handle), Liveness::Running);
        supervisor.resume(&handle);
        assert_eq!(supervisor.poll(&mut handle), Liveness::Running);

        let pgid = handle.id();
        supervisor.terminate(handle, Duration::from_secs(2));
        assert!(group_gone(pgid));
    }

    #[test]
    fn test_terminate_while_paused_leaves_no_process() {
        let _serial = serial();
        let mut supervisor = shell("exec sleep 30", "exec sleep 30");
        let handle = supervisor.start("x", "t", "a").unwrap();
        let pgid = handle.id();

        supervisor.suspend(&handle);
        let termination = supervisor.terminate(handle, Duration::from_secs(2));

        assert_eq!(termination, Termination::Cleanly);
        assert!(group_gone(pgid));
    }

    #[test]
    fn test_terminate_escalates_when_sigterm_ignored() {
        let _serial = serial();
        let mut supervisor = shell("trap '' TERM; exec sleep 30", "exec sleep 30");
        let handle = supervisor.start("x", "t", "a").unwrap();
        let pgid = handle.id();
        // give the shell time to install its trap and exec
        thread::sleep(Duration::from_millis(200));

        let termination = supervisor.terminate(handle, Duration::from_millis(300));

        assert_eq!(termination, Termination::Forcibly);
        assert!(group_gone(pgid));
    }

    #[test]
    fn test_signals_after_exit_are_swallowed() {
        let _serial = serial();
        let mut supervisor = shell("true", "true");
        let mut handle = supervisor.start("x", "t", "a").unwrap();
        assert!(wait_for_exit(&mut supervisor, &mut handle));
        supervisor.terminate(handle, Duration::from_secs(1));

        let mut handle = supervisor.start("x", "t", "a").unwrap();
        assert!(wait_for_exit(&mut supervisor, &mut handle));
        handle.wait_all();
        supervisor.suspend(&handle);
        supervisor.resume(&handle);
        assert_eq!(supervisor.poll(&mut handle), Liveness::Exited);
    }

    #[test]
    fn test_failed_start_clears_live_flag() {
        let _serial = serial();
        let mut supervisor =
            ProcessGroupSupervisor::new("jly-fin-no-such-decoder", Vec::new(), "cat", Vec::new());
        assert!(supervisor.start("x", "t", "a").is_err());
        assert!(!interrupt::pipeline_live());

        let mut supervisor = ProcessGroupSupervisor::new(
            "sh",
            vec!["-c".to_string(), "exec sleep 30".to_string()],
            "jly-fin-no-such-player",
            Vec::new(),
        );
        assert!(supervisor.start("x", "t", "a").is_err());
        assert!(!interrupt::pipeline_live());
    }

    #[test]
    fn test_live_flag_spans_pipeline_lifetime() {
        let _serial = serial();
        let mut supervisor = shell("exec sleep 30", "exec sleep 30");
        let handle = supervisor.start("x", "t", "a").unwrap();
        assert!(interrupt::pipeline_live());

        supervisor.terminate(handle, Duration::from_secs(2));
        assert!(!interrupt::pipeline_live());
    }
}

//! Playback session controller.
//!
//! Drives one track from pipeline start to a terminal outcome. The loop
//! checks pipeline liveness, and only while the pipeline is alive does it
//! open the command menu. The menu itself is watched against liveness, so a
//! track that ends on its own is noticed without waiting for user input.

use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::command::PlaybackCommand;
use super::supervisor::{Liveness, Supervisor, Termination};
use crate::catalog::Track;
use crate::error::PlayerError;
use crate::interrupt;
use crate::selector::{Menu, Selection, Selector};

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// User skipped to the next track
    Advanced,
    ReturnedToContext,
    ReturnedToMenu,
    TerminatedByUser,
    /// The pipeline finished the track on its own
    Completed,
    /// The pipeline could not be started
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Playing,
    Paused,
}

/// What a command does to a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay(SessionState),
    Finish(PlaybackOutcome),
}

impl SessionState {
    pub fn on_command(self, command: PlaybackCommand) -> Transition {
        match command {
            PlaybackCommand::Pause => Transition::Stay(SessionState::Paused),
            PlaybackCommand::Resume => Transition::Stay(SessionState::Playing),
            PlaybackCommand::Next => Transition::Finish(PlaybackOutcome::Advanced),
            PlaybackCommand::Back => Transition::Finish(PlaybackOutcome::ReturnedToContext),
            PlaybackCommand::MainMenu => Transition::Finish(PlaybackOutcome::ReturnedToMenu),
            PlaybackCommand::Quit => Transition::Finish(PlaybackOutcome::TerminatedByUser),
        }
    }
}

/// Anything that can play one track to an outcome
pub trait Play {
    fn play(&mut self, locator: &str, track: &Track) -> PlaybackOutcome;
}

pub struct PlaybackController<'a, S: Supervisor, M: Selector> {
    supervisor: &'a mut S,
    selector: &'a mut M,
    terminate_timeout: Duration,
    back_label: String,
    interrupted: &'static AtomicBool,
}

impl<'a, S: Supervisor, M: Selector> PlaybackController<'a, S, M> {
    pub fn new(
        supervisor: &'a mut S,
        selector: &'a mut M,
        terminate_timeout: Duration,
        back_label: impl Into<String>,
    ) -> Self {
        Self {
            supervisor,
            selector,
            terminate_timeout,
            back_label: back_label.into(),
            interrupted: interrupt::flag(),
        }
    }

    /// Watch `flag` instead of the process-wide interrupt flag
    pub fn with_interrupt_flag(mut self, flag: &'static AtomicBool) -> Self {
        self.interrupted = flag;
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Play one track and report how it ended
    pub fn run(&mut self, locator: &str, title: &str, artist: &str) -> PlaybackOutcome {
        let mut state = SessionState::Starting;
        log::debug!("Session {state:?} for '{title}'");

        if self.interrupted() {
            return PlaybackOutcome::TerminatedByUser;
        }

        println!(
            "\n{}{}{}{}\n",
            "▶ Now Playing: ".green().bold(),
            title.yellow().bold(),
            " - ".white(),
            artist.magenta().bold()
        );

        let mut handle = match self.supervisor.start(locator, title, artist) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Could not start playback of '{title}': {e}");
                if self.interrupted() {
                    return PlaybackOutcome::TerminatedByUser;
                }
                eprintln!("{} {e}", "Error playing stream:".red());
                return PlaybackOutcome::Failed;
            }
        };
        state = SessionState::Playing;

        let options = PlaybackCommand::menu(&self.back_label);
        let prompt = "Playback Command > ".cyan().bold().to_string();

        loop {
            if self.interrupted() {
                log::info!("Interrupted during playback of '{title}'");
                self.stop(handle);
                return PlaybackOutcome::TerminatedByUser;
            }

            if self.supervisor.poll(&mut handle) == Liveness::Exited {
                log::info!("'{title}' finished");
                self.stop(handle);
                return PlaybackOutcome::Completed;
            }

            let supervisor = &mut *self.supervisor;
            let selection = self.selector.select_watching(
                &Menu::single(&prompt, &options),
                &mut || supervisor.poll(&mut handle) == Liveness::Running,
            );

            let text = match selection {
                Ok(Selection::Chosen(lines)) => match lines.into_iter().next() {
                    Some(text) => text,
                    None => continue,
                },
                // loop head sorts out exit, interrupt or a plain re-prompt
                Ok(Selection::Cancelled) | Ok(Selection::Aborted) => continue,
                Err(PlayerError::Interrupted) => continue,
                Err(e) => {
                    log::error!("Playback menu failed: {e}");
                    eprintln!("{} {e}", "Error:".red().bold());
                    self.stop(handle);
                    return PlaybackOutcome::ReturnedToMenu;
                }
            };

            let command = match text.parse::<PlaybackCommand>() {
                Ok(command) => command,
                Err(e) => {
                    log::debug!("{e}");
                    println!("{}", "Unknown option.".yellow());
                    continue;
                }
            };

            match state.on_command(command) {
                Transition::Stay(next) => {
                    match command {
                        PlaybackCommand::Pause => {
                            self.supervisor.suspend(&handle);
                            println!("{}", "Paused.".yellow());
                        }
                        PlaybackCommand::Resume => {
                            self.supervisor.resume(&handle);
                            println!("{}", "Resumed.".green());
                        }
                        other => log::warn!("{other:?} kept the session in {next:?}"),
                    }
                    log::debug!("Session {state:?} -> {next:?}");
                    state = next;
                }
                Transition::Finish(outcome) => {
                    self.stop(handle);
                    if outcome == PlaybackOutcome::TerminatedByUser {
                        println!("{}", "Goodbye!".magenta().bold());
                    }
                    return outcome;
                }
            }
        }
    }

    fn stop(&mut self, handle: S::Handle) {
        match self.supervisor.terminate(handle, self.terminate_timeout) {
            Termination::Cleanly => log::debug!("Pipeline stopped cleanly"),
            Termination::Forcibly => log::info!("Pipeline had to be killed"),
        }
    }
}

impl<S: Supervisor, M: Selector> Play for PlaybackController<'_, S, M> {
    fn play(&mut self, locator: &str, track: &Track) -> PlaybackOutcome {
        self.run(locator, &track.title, &track.artist)
    }
}

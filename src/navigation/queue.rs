//! The user's selected tracks and the walker that plays them in order.

use super::NavigationContext;
use super::unwind::{self, Action, Decision, Event, Level};
use crate::catalog::{Catalog, Track};
use crate::playback::{Play, PlaybackOutcome};

/// Ordered tracks plus a cursor in `[0, len]`; `cursor == len` means exhausted.
#[derive(Debug, Clone, Default)]
pub struct SelectionQueue {
    tracks: Vec<Track>,
    cursor: usize,
}

impl SelectionQueue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks, cursor: 0 }
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor)
    }

    /// Move past the current track. Never moves beyond `len`.
    pub fn advance(&mut self) {
        if self.cursor < self.tracks.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.tracks.len()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

/// Runs a queue through a player until it is exhausted or an outcome
/// unwinds out of the track level.
pub struct QueueWalker<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    context: &'a NavigationContext,
}

impl<'a, C: Catalog + ?Sized> QueueWalker<'a, C> {
    pub fn new(catalog: &'a C, context: &'a NavigationContext) -> Self {
        Self { catalog, context }
    }

    /// Play from the cursor onward. Returns the first decision that leaves
    /// the queue; `ContinueQueue` is never returned.
    pub fn run<P: Play>(&self, queue: &mut SelectionQueue, player: &mut P) -> Decision {
        loop {
            let Some(track) = queue.current() else {
                log::info!("Queue of {} track(s) exhausted", queue.len());
                return unwind::decide(Event::QueueExhausted, Level::Tracks, Some(self.context));
            };

            let outcome = match self.catalog.stream_locator(&track.id) {
                Ok(locator) => player.play(&locator, track),
                Err(e) => {
                    log::warn!("No stream for '{}': {e}", track.title);
                    PlaybackOutcome::Failed
                }
            };
            log::info!(
                "Track {}/{} '{}' ended: {outcome:?}",
                queue.cursor() + 1,
                queue.len(),
                track.title
            );

            let decision = unwind::decide(Event::Playback(outcome), Level::Tracks, Some(self.context));
            match decision.action {
                Action::ContinueQueue => queue.advance(),
                _ => return decision,
            }
        }
    }
}

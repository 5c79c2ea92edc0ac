//! Maps playback and fetch events to the navigation level that regains control.

use super::NavigationContext;
use crate::playback::PlaybackOutcome;

/// Menu levels, outermost last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Picking tracks from a derived list
    Tracks,
    /// Picking an album, artist, genre or search query
    Context,
    MainMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Playback(PlaybackOutcome),
    /// The queue walker ran past the last selected track
    QueueExhausted,
    /// A catalog request made from the given level failed
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Play the track at the queue cursor
    ContinueQueue,
    /// Derive the track list again from the carried context and pick tracks
    ReselectTracks,
    /// Drop the context and show the main menu
    MainMenu,
    /// Release temporary credentials and exit successfully
    Exit,
    /// Report and re-prompt at the level that made the failing request
    Reenter(Level),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub context: Option<NavigationContext>,
}

impl Decision {
    fn carry(action: Action, context: Option<&NavigationContext>) -> Self {
        Self {
            action,
            context: context.cloned(),
        }
    }

    fn drop_context(action: Action) -> Self {
        Self {
            action,
            context: None,
        }
    }
}

/// Decide where control goes after `event` at navigation depth `depth`.
pub fn decide(event: Event, depth: Level, context: Option<&NavigationContext>) -> Decision {
    use PlaybackOutcome::*;

    match event {
        // a failed track is skipped like an advanced one
        Event::Playback(Advanced | Completed | Failed) => {
            Decision::carry(Action::ContinueQueue, context)
        }
        Event::Playback(ReturnedToContext) | Event::QueueExhausted => match context {
            Some(_) => Decision::carry(Action::ReselectTracks, context),
            None => Decision::drop_context(Action::MainMenu),
        },
        Event::Playback(ReturnedToMenu) => Decision::drop_context(Action::MainMenu),
        Event::Playback(TerminatedByUser) => Decision::drop_context(Action::Exit),
        Event::FetchFailed => Decision::carry(Action::Reenter(depth), context),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album() -> NavigationContext {
        NavigationContext::Album {
            album_id: "al".to_string(),
            name: "Blue".to_string(),
        }
    }

    #[test]
    fn test_progress_outcomes_continue_with_context() {
        for outcome in [
            PlaybackOutcome::Advanced,
            PlaybackOutcome::Completed,
            PlaybackOutcome::Failed,
        ] {
            let decision = decide(Event::Playback(outcome), Level::Tracks, Some(&album()));
            assert_eq!(decision.action, Action::ContinueQueue);
            assert_eq!(decision.context, Some(album()));
        }
    }

    #[test]
    fn test_exhausted_queue_behaves_like_back() {
        let exhausted = decide(Event::QueueExhausted, Level::Tracks, Some(&album()));
        let back = decide(
            Event::Playback(PlaybackOutcome::ReturnedToContext),
            Level::Tracks,
            Some(&album()),
        );
        assert_eq!(exhausted, back);
        assert_eq!(back.action, Action::ReselectTracks);
        assert_eq!(back.context, Some(album()));
    }

    #[test]
    fn test_back_without_context_goes_to_main_menu() {
        let decision = decide(
            Event::Playback(PlaybackOutcome::ReturnedToContext),
            Level::Tracks,
            None,
        );
        assert_eq!(decision.action, Action::MainMenu);
    }

    #[test]
    fn test_main_menu_discards_context() {
        let decision = decide(
            Event::Playback(PlaybackOutcome::ReturnedToMenu),
            Level::Tracks,
            Some(&album()),
        );
        assert_eq!(decision.action, Action::MainMenu);
        assert!(decision.context.is_none());
    }

    #[test]
    fn test_quit_exits_from_any_depth() {
        for depth in [Level::Tracks, Level::Context, Level::MainMenu] {
            let decision = decide(
                Event::Playback(PlaybackOutcome::TerminatedByUser),
                depth,
                Some(&album()),
            );
            assert_eq!(decision.action, Action::Exit);
            assert!(decision.context.is_none());
        }
    }

    #[test]
    fn test_fetch_failure_reenters_same_level() {
        let decision = decide(Event::FetchFailed, Level::Context, Some(&album()));
        assert_eq!(decision.action, Action::Reenter(Level::Context));
        assert_eq!(decision.context, Some(album()));

        let decision = decide(Event::FetchFailed, Level::MainMenu, None);
        assert_eq!(decision.action, Action::Reenter(Level::MainMenu));
    }
}

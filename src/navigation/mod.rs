//! Navigation state: where the current queue came from, how it is walked,
//! and which menu level takes over when playback ends.

pub mod context;
pub mod queue;
pub mod unwind;

pub use context::NavigationContext;
pub use queue::{QueueWalker, SelectionQueue};
pub use unwind::{Action, Decision, Event, Level, decide};

//! Pipeline supervision and the per-track playback session.

pub mod command;
pub mod session;
pub mod supervisor;

pub use command::PlaybackCommand;
pub use session::{Play, PlaybackController, PlaybackOutcome, SessionState, Transition};
pub use supervisor::{Liveness, ProcessGroup, ProcessGroupSupervisor, Supervisor, Termination};

//! Error types shared by the playback core and its collaborators.
//!
//! Most of these never reach the user as failures: spawn errors skip a track,
//! signal errors are logged and swallowed, termination timeouts escalate to a
//! forced kill. Only upstream and selector errors are reported before the
//! enclosing menu re-prompts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// The decoder or player process could not be started
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Signal delivery to a process group failed (usually already gone)
    #[error("signal delivery failed: {0}")]
    Signal(#[from] nix::Error),

    /// Graceful termination did not finish in time
    #[error("pipeline did not exit within {0} ms")]
    TerminationTimeout(u64),

    /// Playback menu input outside the known command set
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// Catalog or authentication request failed
    #[error("server request failed: {0}")]
    Upstream(String),

    /// The selector process could not be run
    #[error("selector failed: {0}")]
    Selector(String),

    /// SIGINT or SIGTERM arrived while waiting
    #[error("interrupted")]
    Interrupted,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<ureq::Error> for PlayerError {
    fn from(err: ureq::Error) -> Self {
        PlayerError::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;

//! Constants shared by the catalog client, config defaults and the CLI.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Placeholder in `decoder_args` replaced by the stream locator
pub const URL_PLACEHOLDER: &str = "{url}";

/// Client name sent in the MediaBrowser authorization header
pub const CLIENT_NAME: &str = "JellyfinFZF";

/// Client version sent in the MediaBrowser authorization header
pub const CLIENT_VERSION: &str = "1.0.0";

/// Fallback display values for incomplete catalog entries
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

use owo_colors::OwoColorize;
use std::str::FromStr;

use crate::error::PlayerError;

/// Commands offered in the playback menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Pause,
    Resume,
    Next,
    Back,
    MainMenu,
    Quit,
}

impl PlaybackCommand {
    pub const ALL: [PlaybackCommand; 6] = [
        PlaybackCommand::Pause,
        PlaybackCommand::Resume,
        PlaybackCommand::Next,
        PlaybackCommand::Back,
        PlaybackCommand::MainMenu,
        PlaybackCommand::Quit,
    ];

    /// Plain menu label; `back_label` names the context ("album", "genre", ...)
    pub fn label(&self, back_label: &str) -> String {
        match self {
            PlaybackCommand::Pause => "Pause".to_string(),
            PlaybackCommand::Resume => "Resume".to_string(),
            PlaybackCommand::Next => "Next".to_string(),
            PlaybackCommand::Back => format!("Back to {back_label}"),
            PlaybackCommand::MainMenu => "Main menu".to_string(),
            PlaybackCommand::Quit => "Quit".to_string(),
        }
    }

    /// Colored menu line for the selector
    pub fn menu_line(&self, back_label: &str) -> String {
        let label = self.label(back_label);
        match self {
            PlaybackCommand::Pause => label.yellow().to_string(),
            PlaybackCommand::Resume => label.green().to_string(),
            PlaybackCommand::Next => label.cyan().to_string(),
            PlaybackCommand::Back => label.magenta().to_string(),
            PlaybackCommand::MainMenu => label.blue().to_string(),
            PlaybackCommand::Quit => label.red().bold().to_string(),
        }
    }

    pub fn menu(back_label: &str) -> Vec<String> {
        Self::ALL
            .iter()
            .map(|command| command.menu_line(back_label))
            .collect()
    }
}

impl FromStr for PlaybackCommand {
    type Err = PlayerError;

    /// Matches on the leading word, case-insensitive, ignoring ANSI color
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean = console::strip_ansi_codes(s).trim().to_lowercase();
        let command = if clean.starts_with("pause") {
            PlaybackCommand::Pause
        } else if clean.starts_with("resume") {
            PlaybackCommand::Resume
        } else if clean.starts_with("next") {
            PlaybackCommand::Next
        } else if clean.starts_with("back") {
            PlaybackCommand::Back
        } else if clean.starts_with("main") {
            PlaybackCommand::MainMenu
        } else if clean.starts_with("quit") {
            PlaybackCommand::Quit
        } else {
            return Err(PlayerError::UnrecognizedCommand(clean));
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_lines_parse_back_to_their_command() {
        for command in PlaybackCommand::ALL {
            let line = command.menu_line("genre");
            assert_eq!(line.parse::<PlaybackCommand>().unwrap(), command);
        }
    }

    #[test]
    fn test_back_label_names_context() {
        assert_eq!(PlaybackCommand::Back.label("album"), "Back to album");
        assert_eq!(PlaybackCommand::Back.label("search"), "Back to search");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("  PAUSE ".parse::<PlaybackCommand>().unwrap(), PlaybackCommand::Pause);
        assert_eq!("main menu".parse::<PlaybackCommand>().unwrap(), PlaybackCommand::MainMenu);
    }

    #[test]
    fn test_unknown_text_is_rejected() {
        match "dance".parse::<PlaybackCommand>() {
            Err(PlayerError::UnrecognizedCommand(text)) => assert_eq!(text, "dance"),
            other => panic!("unexpected {other:?}"),
        }
        assert!("".parse::<PlaybackCommand>().is_err());
    }
}

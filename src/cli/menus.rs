//! Menu lines for the selector and mapping chosen lines back to items.

use owo_colors::OwoColorize;
use std::collections::HashSet;

use jly_fin::catalog::{Album, Artist, Genre, Track};
use jly_fin::error::Result;
use jly_fin::selector::{Menu, Selection, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuItem {
    Albums,
    Artists,
    Genres,
    SearchSongs,
    SwitchServer,
    Quit,
}

impl MainMenuItem {
    /// Menu order
    pub const ALL: [MainMenuItem; 6] = [
        MainMenuItem::Albums,
        MainMenuItem::Artists,
        MainMenuItem::Genres,
        MainMenuItem::SearchSongs,
        MainMenuItem::SwitchServer,
        MainMenuItem::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MainMenuItem::Albums => "Albums",
            MainMenuItem::Artists => "Artists",
            MainMenuItem::Genres => "Genres",
            MainMenuItem::SearchSongs => "Search songs",
            MainMenuItem::SwitchServer => "Switch server",
            MainMenuItem::Quit => "Quit",
        }
    }

    pub fn lines() -> Vec<String> {
        Self::ALL.iter().map(|item| item.label().to_string()).collect()
    }

    /// Item shown at `index` of `lines()`
    pub fn at(index: usize) -> Option<MainMenuItem> {
        Self::ALL.get(index).copied()
    }
}

pub const ADD_SERVER: &str = "Add another server";
pub const ALL_TRACKS: &str = "All tracks";

pub fn album_line(album: &Album) -> String {
    format!(
        "{}{}{}",
        album.artist.yellow().bold(),
        " - ".white(),
        album.name.green().bold()
    )
}

pub fn artist_line(artist: &Artist) -> String {
    artist.name.yellow().bold().to_string()
}

pub fn genre_line(genre: &Genre) -> String {
    genre.name.cyan().bold().to_string()
}

/// "NN. Title - Artist" inside one album, "Title - Artist [Album]" elsewhere
pub fn track_line(track: &Track, numbered: bool) -> String {
    if numbered {
        let index = match track.index {
            Some(n) => format!("{n:02}"),
            None => "?".to_string(),
        };
        format!(
            "{}{}{}{}",
            format!("{index}. ").blue(),
            track.title.green().bold(),
            " - ".white(),
            track.artist.magenta()
        )
    } else {
        format!(
            "{}{}{}{}",
            track.title.green().bold(),
            " - ".white(),
            track.artist.magenta(),
            format!(" [{}]", track.album).cyan()
        )
    }
}

/// Make every line distinct once ANSI codes are stripped, by numbering
/// repeats " (2)", " (3)", ... Chosen lines map back by exact text, so two
/// equal lines would otherwise both resolve to the first one.
pub fn unique_lines(lines: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .map(|line| {
            let text = plain(&line);
            if seen.insert(text.clone()) {
                return line;
            }
            let mut n = 2;
            while !seen.insert(format!("{text} ({n})")) {
                n += 1;
            }
            format!("{line}{}", format!(" ({n})").bright_black())
        })
        .collect()
}

fn plain(line: &str) -> String {
    console::strip_ansi_codes(line).trim().to_string()
}

/// Single choice; `None` when the user backed out of the menu
pub fn pick_one<M: Selector>(
    selector: &mut M,
    prompt: &str,
    lines: &[String],
) -> Result<Option<usize>> {
    match selector.select(&Menu::single(prompt, lines))? {
        Selection::Chosen(chosen) => Ok(chosen
            .first()
            .and_then(|choice| position(lines, choice))),
        Selection::Cancelled | Selection::Aborted => Ok(None),
    }
}

fn position(lines: &[String], choice: &str) -> Option<usize> {
    let choice = plain(choice);
    lines.iter().position(|line| plain(line) == choice)
}

/// Map chosen lines back to tracks, keeping the order they were chosen in.
///
/// Returns the resolved tracks and the lines that matched nothing.
pub fn resolve_tracks(
    chosen: &[String],
    lines: &[String],
    tracks: &[Track],
) -> (Vec<Track>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut unresolved = Vec::new();

    for choice in chosen {
        match position(lines, choice).and_then(|i| tracks.get(i)) {
            Some(track) => resolved.push(track.clone()),
            None => unresolved.push(choice.clone()),
        }
    }

    (resolved, unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, title: &str, index: Option<u32>) -> Track {
        Track {
            id: id.to_string(),
            title: title.to_string(),
            artist: "Band".to_string(),
            album: "Record".to_string(),
            album_id: Some("al".to_string()),
            index,
        }
    }

    #[test]
    fn test_track_line_formats() {
        let t = track("1", "Intro", Some(3));
        assert_eq!(plain(&track_line(&t, true)), "03. Intro - Band");
        assert_eq!(plain(&track_line(&t, false)), "Intro - Band [Record]");

        let unnumbered = track("2", "Outro", None);
        assert_eq!(plain(&track_line(&unnumbered, true)), "?. Outro - Band");
    }

    #[test]
    fn test_album_line() {
        let album = Album {
            id: "a".to_string(),
            name: "Record".to_string(),
            artist: "Band".to_string(),
        };
        assert_eq!(plain(&album_line(&album)), "Band - Record");
    }

    #[test]
    fn test_resolve_keeps_chosen_order() {
        let tracks = vec![track("1", "A", Some(1)), track("2", "B", Some(2)), track("3", "C", Some(3))];
        let lines: Vec<String> = tracks.iter().map(|t| track_line(t, true)).collect();
        let chosen = vec!["03. C - Band".to_string(), "01. A - Band".to_string()];

        let (resolved, unresolved) = resolve_tracks(&chosen, &lines, &tracks);
        let ids: Vec<&str> = resolved.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_identical_tracks_resolve_to_the_one_chosen() {
        let tracks = vec![track("disc1-t1", "Intro", Some(1)), track("disc2-t1", "Intro", Some(1))];
        let lines = unique_lines(tracks.iter().map(|t| track_line(t, true)).collect());
        assert_eq!(plain(&lines[0]), "01. Intro - Band");
        assert_eq!(plain(&lines[1]), "01. Intro - Band (2)");

        let chosen = vec!["01. Intro - Band (2)".to_string()];
        let (resolved, unresolved) = resolve_tracks(&chosen, &lines, &tracks);
        assert!(unresolved.is_empty());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "disc2-t1");
    }

    #[test]
    fn test_unique_lines_skips_taken_suffixes() {
        let lines = vec!["A".to_string(), "A (2)".to_string(), "A".to_string()];
        let unique: Vec<String> = unique_lines(lines).iter().map(|l| plain(l)).collect();
        assert_eq!(unique, vec!["A", "A (2)", "A (3)"]);
    }

    #[test]
    fn test_pick_one_distinguishes_identical_albums() {
        let album = Album {
            id: "a".to_string(),
            name: "Live".to_string(),
            artist: "Band".to_string(),
        };
        let lines = unique_lines(vec![album_line(&album), album_line(&album)]);
        let mut second = Fixed(Selection::Chosen(vec!["Band - Live (2)".to_string()]));
        assert_eq!(pick_one(&mut second, "> ", &lines).unwrap(), Some(1));
    }

    #[test]
    fn test_resolve_reports_unmatched_lines() {
        let tracks = vec![track("1", "A", Some(1))];
        let lines: Vec<String> = tracks.iter().map(|t| track_line(t, true)).collect();
        let chosen = vec!["01. A - Band".to_string(), "99. Ghost - Nobody".to_string()];

        let (resolved, unresolved) = resolve_tracks(&chosen, &lines, &tracks);
        assert_eq!(resolved.len(), 1);
        assert_eq!(unresolved, vec!["99. Ghost - Nobody".to_string()]);
    }

    struct Fixed(Selection);

    impl Selector for Fixed {
        fn select_watching(
            &mut self,
            _menu: &Menu<'_>,
            _watch: &mut dyn FnMut() -> bool,
        ) -> Result<Selection> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_pick_one() {
        let lines = MainMenuItem::lines();

        let mut chosen = Fixed(Selection::Chosen(vec!["Genres".to_string()]));
        let index = pick_one(&mut chosen, "> ", &lines).unwrap();
        assert_eq!(index.and_then(MainMenuItem::at), Some(MainMenuItem::Genres));

        let mut cancelled = Fixed(Selection::Cancelled);
        assert_eq!(pick_one(&mut cancelled, "> ", &lines).unwrap(), None);
    }

    #[test]
    fn test_main_menu_labels_map_back_to_items() {
        for (index, line) in MainMenuItem::lines().iter().enumerate() {
            let item = MainMenuItem::at(index).unwrap();
            assert_eq!(item.label(), line);
        }
        assert_eq!(MainMenuItem::at(6), None);
    }
}

use dialoguer::{Input, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;
use std::fs::File;
use std::time::Duration;

use jly_fin::catalog::{Catalog, JellyfinClient};
use jly_fin::config::Config;
use jly_fin::error::PlayerError;
use jly_fin::interrupt;
use jly_fin::navigation::{
    Action, Decision, Event, Level, NavigationContext, QueueWalker, SelectionQueue, decide,
};
use jly_fin::playback::{PlaybackController, ProcessGroupSupervisor, Supervisor};
use jly_fin::selector::{FzfSelector, Menu, Selection, Selector};
use jly_fin::servers::{Credentials, ServerStore};
use jly_fin::terminal::TerminalGuard;
use jly_fin::utils::progress::with_spinner;

use super::menus::{
    ADD_SERVER, ALL_TRACKS, MainMenuItem, album_line, artist_line, genre_line, pick_one,
    resolve_tracks, track_line, unique_lines,
};
use super::servers::add_server_interactive;

/// How a session with one server ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    SwitchServer,
    Quit,
}

/// Where control goes when a menu level gives it up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Context,
    MainMenu,
    Exit,
}

pub fn handle_play(server: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    if let Err(e) = init_logging(&config) {
        eprintln!(
            "{} logging disabled: {e}",
            "Warning:".yellow().bold()
        );
    }
    log::info!("Starting jly-fin");

    interrupt::install()?;
    let _terminal = TerminalGuard::new();

    println!(
        "{}",
        "jly-fin a cli jellyfin music player".magenta().bold()
    );

    let mut store = ServerStore::load(config.servers_path());
    let mut selector = FzfSelector::from_config(&config);
    let mut supervisor = ProcessGroupSupervisor::from_config(&config);
    let mut requested = server.map(str::to_string);

    loop {
        let credentials = match choose_server(&mut store, &mut selector, requested.take())? {
            Some(credentials) => credentials,
            None => {
                println!("{}", "No server chosen, exiting.".red());
                return Ok(());
            }
        };

        println!(
            "{}",
            format!("Logging in to {}...", credentials.display_name()).blue()
        );
        let client = match with_spinner("Authenticating...", || {
            JellyfinClient::connect(&config, credentials.entry())
        }) {
            Ok(client) => client,
            Err(e) => {
                log::error!("Login to {} failed: {e}", credentials.entry().url);
                eprintln!("{} {e}", "Login failed:".red().bold());
                credentials.release();
                continue;
            }
        };

        let end = Browser {
            catalog: &client,
            selector: &mut selector,
            supervisor: &mut supervisor,
            terminate_timeout: config.terminate_timeout(),
        }
        .run();
        credentials.release();

        // an interrupt that lands between pipelines surfaces as a menu error
        let end = match end {
            Err(e) if interrupt::requested() => {
                log::info!("Session ended by interrupt: {e}");
                SessionEnd::Quit
            }
            other => other?,
        };

        match end {
            SessionEnd::SwitchServer => continue,
            SessionEnd::Quit => {
                if interrupt::requested() {
                    println!("\nInterrupted. Exiting cleanly.");
                }
                log::info!("Exiting");
                return Ok(());
            }
        }
    }
}

fn init_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    use simplelog::{ConfigBuilder, WriteLogger};

    let level = config.log_level_filter()?;
    WriteLogger::init(
        level,
        ConfigBuilder::new().build(),
        File::create(&config.log_file)?,
    )?;

    Ok(())
}

fn choose_server<M: Selector>(
    store: &mut ServerStore,
    selector: &mut M,
    requested: Option<String>,
) -> Result<Option<Credentials>, Box<dyn Error>> {
    if let Some(name) = requested {
        let entry = store
            .get(&name)
            .cloned()
            .ok_or_else(|| format!("No server named '{name}'"))?;
        return Ok(Some(Credentials::Saved { name, entry }));
    }

    if store.is_empty() {
        println!("{}", "No servers configured, please add one.".yellow());
        return add_server_interactive(store).map(Some);
    }

    let names = store.names();
    let mut lines: Vec<String> = names.iter().map(|n| n.green().bold().to_string()).collect();
    lines.push(ADD_SERVER.yellow().to_string());

    let prompt = "Select Server > ".cyan().bold().to_string();
    match pick_one(selector, &prompt, &lines)? {
        None => Ok(None),
        Some(i) if i == names.len() => add_server_interactive(store).map(Some),
        Some(i) => {
            let name = names[i].clone();
            let entry = store
                .get(&name)
                .cloned()
                .ok_or_else(|| format!("No server named '{name}'"))?;
            Ok(Some(Credentials::Saved { name, entry }))
        }
    }
}

/// Menu levels for one logged-in server
struct Browser<'a, C: Catalog, M: Selector, S: Supervisor> {
    catalog: &'a C,
    selector: &'a mut M,
    supervisor: &'a mut S,
    terminate_timeout: Duration,
}

impl<C: Catalog, M: Selector, S: Supervisor> Browser<'_, C, M, S> {
    fn run(&mut self) -> Result<SessionEnd, Box<dyn Error>> {
        let lines = MainMenuItem::lines();
        let prompt = "Main Menu > ".cyan().bold().to_string();

        loop {
            let choice = pick_one(&mut *self.selector, &prompt, &lines)?.and_then(MainMenuItem::at);
            let next = match choice {
                None | Some(MainMenuItem::SwitchServer) => return Ok(SessionEnd::SwitchServer),
                Some(MainMenuItem::Albums) => self.browse_albums()?,
                Some(MainMenuItem::Artists) => self.browse_artists()?,
                Some(MainMenuItem::Genres) => self.browse_genres()?,
                Some(MainMenuItem::SearchSongs) => self.search_songs()?,
                Some(MainMenuItem::Quit) => {
                    println!("{}", "Goodbye!".magenta().bold());
                    return Ok(SessionEnd::Quit);
                }
            };
            if next == Next::Exit {
                return Ok(SessionEnd::Quit);
            }
        }
    }

    fn fetch<T>(
        &self,
        message: &str,
        request: impl FnOnce(&C) -> Result<T, PlayerError>,
    ) -> Result<T, PlayerError> {
        let catalog = self.catalog;
        with_spinner(message, || request(catalog))
    }

    fn browse_albums(&mut self) -> Result<Next, Box<dyn Error>> {
        let prompt = "Select Album > ".cyan().bold().to_string();
        loop {
            let albums = match self.fetch("Fetching albums...", |c| c.albums()) {
                Ok(albums) => albums,
                Err(e) => return Ok(fetch_failed(&e, Level::MainMenu, None)),
            };
            if albums.is_empty() {
                println!("{}", "No albums found.".yellow());
                return Ok(Next::MainMenu);
            }

            let lines = unique_lines(albums.iter().map(album_line).collect());
            let Some(i) = pick_one(&mut *self.selector, &prompt, &lines)? else {
                println!("{}", "No album selected.".yellow());
                return Ok(Next::MainMenu);
            };

            let context = NavigationContext::Album {
                album_id: albums[i].id.clone(),
                name: albums[i].name.clone(),
            };
            match self.browse_tracks(context)? {
                Next::Context => continue,
                next => return Ok(next),
            }
        }
    }

    fn browse_artists(&mut self) -> Result<Next, Box<dyn Error>> {
        let prompt = "Select Artist > ".cyan().bold().to_string();
        loop {
            let artists = match self.fetch("Fetching artists...", |c| c.artists()) {
                Ok(artists) => artists,
                Err(e) => return Ok(fetch_failed(&e, Level::MainMenu, None)),
            };
            if artists.is_empty() {
                println!("{}", "No artists found.".yellow());
                return Ok(Next::MainMenu);
            }

            let lines = unique_lines(artists.iter().map(artist_line).collect());
            let Some(i) = pick_one(&mut *self.selector, &prompt, &lines)? else {
                return Ok(Next::MainMenu);
            };
            let artist = &artists[i];

            loop {
                let albums = match self.fetch("Fetching albums...", |c| {
                    c.albums_by_artist(&artist.id)
                }) {
                    Ok(albums) => albums,
                    Err(e) => {
                        fetch_failed(&e, Level::Context, None);
                        break;
                    }
                };

                let mut lines = vec![ALL_TRACKS.yellow().bold().to_string()];
                lines.extend(albums.iter().map(|a| a.name.green().bold().to_string()));
                let lines = unique_lines(lines);
                let prompt = format!("{} > ", artist.name).cyan().bold().to_string();

                let context = match pick_one(&mut *self.selector, &prompt, &lines)? {
                    None => break,
                    Some(0) => NavigationContext::Artist {
                        artist_id: artist.id.clone(),
                        name: artist.name.clone(),
                    },
                    Some(j) => NavigationContext::ArtistAlbum {
                        artist_id: artist.id.clone(),
                        album_id: albums[j - 1].id.clone(),
                        name: albums[j - 1].name.clone(),
                    },
                };
                match self.browse_tracks(context)? {
                    Next::Context => continue,
                    next => return Ok(next),
                }
            }
        }
    }

    fn browse_genres(&mut self) -> Result<Next, Box<dyn Error>> {
        let prompt = "Select Genre > ".cyan().bold().to_string();
        loop {
            let genres = match self.fetch("Fetching genres...", |c| c.genres()) {
                Ok(genres) => genres,
                Err(e) => return Ok(fetch_failed(&e, Level::MainMenu, None)),
            };
            if genres.is_empty() {
                println!("{}", "No genres found.".yellow());
                return Ok(Next::MainMenu);
            }

            let lines = unique_lines(genres.iter().map(genre_line).collect());
            let Some(i) = pick_one(&mut *self.selector, &prompt, &lines)? else {
                return Ok(Next::MainMenu);
            };

            let context = NavigationContext::Genre {
                genre_id: genres[i].id.clone(),
                name: genres[i].name.clone(),
            };
            match self.browse_tracks(context)? {
                Next::Context => continue,
                next => return Ok(next),
            }
        }
    }

    fn search_songs(&mut self) -> Result<Next, Box<dyn Error>> {
        let query: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Search songs")
            .allow_empty(true)
            .interact_text()?;
        let query = query.trim().to_string();
        if query.is_empty() {
            return Ok(Next::MainMenu);
        }

        match self.browse_tracks(NavigationContext::SongSearch { query })? {
            Next::Exit => Ok(Next::Exit),
            _ => Ok(Next::MainMenu),
        }
    }

    /// Pick tracks from the context's list and play them until something
    /// sends control back out of this level.
    fn browse_tracks(&mut self, context: NavigationContext) -> Result<Next, Box<dyn Error>> {
        let numbered = context.is_single_album();
        let prompt = "Select Tracks > ".cyan().bold().to_string();

        loop {
            let tracks = match self.fetch("Fetching tracks...", |c| context.derive_tracks(c)) {
                Ok(tracks) => tracks,
                Err(e) => return Ok(fetch_failed(&e, Level::Context, Some(&context))),
            };
            if tracks.is_empty() {
                println!("{}", "No tracks found.".yellow());
                return Ok(Next::Context);
            }

            let lines = unique_lines(tracks.iter().map(|t| track_line(t, numbered)).collect());
            let chosen = match self.selector.select(&Menu::multi(&prompt, &lines))? {
                Selection::Chosen(chosen) => chosen,
                Selection::Cancelled | Selection::Aborted => {
                    println!("{}", "No track selected.".yellow());
                    return Ok(Next::Context);
                }
            };

            let (selected, unresolved) = resolve_tracks(&chosen, &lines, &tracks);
            for line in &unresolved {
                log::warn!("Dropping selection that matches no track: {line}");
                println!("{} skipping '{line}'", "Warning:".yellow().bold());
            }
            if selected.is_empty() {
                continue;
            }

            log::info!(
                "Queued {} track(s) from {} context '{}'",
                selected.len(),
                context.kind(),
                context.title()
            );
            let mut queue = SelectionQueue::new(selected);
            let mut controller = PlaybackController::new(
                &mut *self.supervisor,
                &mut *self.selector,
                self.terminate_timeout,
                context.back_label(),
            );
            let decision = QueueWalker::new(self.catalog, &context).run(&mut queue, &mut controller);

            match next_level(&decision) {
                Some(next) => return Ok(next),
                None => continue,
            }
        }
    }
}

/// `None` means stay at the tracks level and pick again
fn next_level(decision: &Decision) -> Option<Next> {
    match decision.action {
        Action::ContinueQueue | Action::ReselectTracks => None,
        Action::MainMenu | Action::Reenter(Level::MainMenu) => Some(Next::MainMenu),
        Action::Reenter(Level::Context | Level::Tracks) => Some(Next::Context),
        Action::Exit => Some(Next::Exit),
    }
}

fn fetch_failed(error: &PlayerError, depth: Level, context: Option<&NavigationContext>) -> Next {
    log::error!("Catalog request failed at {depth:?}: {error}");
    eprintln!("{} {error}", "Error:".red().bold());
    next_level(&decide(Event::FetchFailed, depth, context)).unwrap_or(Next::Context)
}

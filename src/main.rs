//! jly-fin - an interactive terminal client for a Jellyfin music server.
//!
//! Browsing happens in `fzf` menus: albums, artists, genres or a free song
//! search lead to a track list, and the picked tracks play one after another
//! through an `ffmpeg | ffplay` pipeline. While a track plays, a command menu
//! pauses, resumes, skips, or unwinds back to the track list or main menu.
//!
//! Server credentials are kept in a small JSON file readable only by its
//! owner, and the pipeline programs, timings and logging are configurable in
//! `~/.config/jly-fin/config.toml`.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

mod cli;

#[derive(Parser)]
#[command(name = "jly-fin")]
#[command(about = "Terminal Jellyfin music player driven by fzf")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse a server and play music (the default)
    Play {
        /// Stored server to log in to without asking
        #[arg(short, long)]
        server: Option<String>,
    },
    /// Manage stored servers
    Servers {
        #[command(subcommand)]
        action: ServersAction,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ServersAction {
    /// List stored servers
    List,
    /// Add a server interactively
    Add,
    /// Remove a stored server
    Remove {
        /// Server name
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new([
            "decoder",
            "player",
            "selector",
            "selector_height",
            "terminate_timeout_ms",
            "poll_interval_ms",
            "audio_bitrate",
            "device_name",
            "verify_tls",
            "request_timeout_secs",
            "servers_file",
            "log_file",
            "log_level",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Play { server: None }) {
        Commands::Play { server } => {
            cli::play::handle_play(server.as_deref())?;
        }
        Commands::Servers { action } => match action {
            ServersAction::List => {
                cli::servers::handle_servers_list()?;
            }
            ServersAction::Add => {
                cli::servers::handle_servers_add()?;
            }
            ServersAction::Remove { name } => {
                cli::servers::handle_servers_remove(&name)?;
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

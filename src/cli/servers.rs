use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;

use jly_fin::config::Config;
use jly_fin::servers::{Credentials, ServerEntry, ServerStore};
use jly_fin::utils::validation::{normalize_url, validate_server_name};

pub fn handle_servers_list() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let store = ServerStore::load(config.servers_path());

    if store.is_empty() {
        println!("{}", "No servers configured.".yellow());
        println!("Add one with: {}", "jly-fin servers add".cyan());
        return Ok(());
    }

    println!("Servers in {}:", store.path().display().to_string().cyan());
    for (name, entry) in store.iter() {
        println!(
            "  {} {} {}",
            name.bold(),
            entry.url.bright_black(),
            format!("({})", entry.username).bright_black()
        );
    }

    Ok(())
}

pub fn handle_servers_add() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut store = ServerStore::load(config.servers_path());

    let credentials = add_server_interactive(&mut store)?;
    if credentials.is_temporary() {
        println!("{}", "Server not saved.".yellow());
    }
    credentials.release();

    Ok(())
}

pub fn handle_servers_remove(name: &str) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut store = ServerStore::load(config.servers_path());

    if store.remove(name).is_none() {
        return Err(format!("No server named '{name}'").into());
    }
    store.save()?;

    println!("{} {}", "Removed server".green(), name.bold());
    Ok(())
}

/// Ask for a server and optionally save it.
///
/// A server the user declines to save comes back as temporary credentials.
pub fn add_server_interactive(store: &mut ServerStore) -> Result<Credentials, Box<dyn Error>> {
    let theme = ColorfulTheme::default();

    let url: String = Input::with_theme(&theme)
        .with_prompt("Jellyfin server URL (e.g. http://192.168.1.10:8096)")
        .interact_text()?;
    let username: String = Input::with_theme(&theme)
        .with_prompt("Username")
        .interact_text()?;
    let password = Password::with_theme(&theme)
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;

    let entry = ServerEntry {
        url: normalize_url(&url),
        username: username.trim().to_string(),
        password,
    };

    let save = Confirm::with_theme(&theme)
        .with_prompt("Save this server for future use?")
        .default(true)
        .interact()?;

    if !save {
        log::info!("Using temporary server {}", entry.url);
        return Ok(Credentials::Temporary(entry));
    }

    let name = loop {
        let name: String = Input::with_theme(&theme)
            .with_prompt("Friendly name for this server")
            .interact_text()?;
        let name = name.trim().to_string();

        if let Err(e) = validate_server_name(&name) {
            eprintln!("{} {e}", "Error:".red().bold());
            continue;
        }
        if store.contains(&name) {
            eprintln!(
                "{} a server named '{}' already exists",
                "Error:".red().bold(),
                name.yellow()
            );
            continue;
        }
        break name;
    };

    store.add(&name, entry.clone())?;
    store.save()?;
    println!("{} {}", "Saved server".green(), name.bold());

    Ok(Credentials::Saved { name, entry })
}

use jly_fin::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current jly-fin configuration:");
    println!("  decoder: {}", config.decoder);
    println!("  decoder_args: {:?}", config.decoder_args);
    println!("  player: {}", config.player);
    println!("  player_args: {:?}", config.player_args);
    println!("  selector: {}", config.selector);
    println!("  selector_args: {:?}", config.selector_args);
    println!("  selector_height: {}", config.selector_height);
    println!("  terminate_timeout_ms: {}", config.terminate_timeout_ms);
    println!("  poll_interval_ms: {}", config.poll_interval_ms);
    println!("  audio_bitrate: {}", config.audio_bitrate);
    println!("  device_name: {}", config.device_name);
    println!("  verify_tls: {}", config.verify_tls);
    println!("  request_timeout_secs: {}", config.request_timeout_secs);
    println!("  servers_file: {}", config.servers_file);
    println!("  log_file: {}", config.log_file);
    println!("  log_level: {}", config.log_level);

    if !Config::exists()? {
        println!();
        println!(
            "{} no config file yet, showing defaults",
            "Note:".yellow()
        );
    }

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    // Write defaults first so there is something to edit
    if !Config::exists()? {
        Config::default().save()?;
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    match Config::load() {
        Ok(config) => {
            config.log_level_filter()?;
            println!("Configuration saved successfully");
        }
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}

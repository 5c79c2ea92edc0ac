use tempfile::TempDir;

#[test]
fn test_config_lifecycle() {
    // Create a temporary directory for test config
    let temp_dir = TempDir::new().unwrap();

    // Override the config path for testing
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    // Missing config means defaults
    assert!(!jly_fin::config::Config::exists().unwrap());
    let defaults = jly_fin::config::Config::load().unwrap();
    assert_eq!(defaults.selector, "fzf");

    let config = jly_fin::config::Config::new();
    config.save().unwrap();
    assert!(jly_fin::config::Config::exists().unwrap());

    let loaded = jly_fin::config::Config::load().unwrap();
    assert_eq!(loaded.decoder, "ffmpeg");
    assert_eq!(loaded.terminate_timeout_ms, 2000);
    assert!(loaded.verify_tls);

    let mut config = jly_fin::config::Config::load().unwrap();
    config.set_value("player", "mpv").unwrap();
    config.set_value("terminate_timeout_ms", "750").unwrap();
    config.save().unwrap();

    let reloaded = jly_fin::config::Config::load().unwrap();
    assert_eq!(reloaded.player, "mpv");
    assert_eq!(reloaded.terminate_timeout().as_millis(), 750);

    let mut config = jly_fin::config::Config::load().unwrap();
    assert!(config.set_value("invalid_key", "value").is_err());
    assert!(config.set_value("verify_tls", "maybe").is_err());
}

use smtpd_exporter::config::Config;

#[test]
fn test_config_load() {
    // This assumes config/Default.toml exists relative to where cargo test is run
    let config_res = Config::load("config/Default.toml");
    assert!(config_res.is_ok(), "Failed to load default config");

    let config = config_res.unwrap();
    assert_eq!(config.fields.len(), 3);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    // Given: A path that does not exist
    // When: Loading configuration
    let config = Config::load("config/does-not-exist.toml").expect("Missing file is optional");

    // Then: Built-in defaults apply
    assert_eq!(config.server.port, 9967);
    assert_eq!(config.sampler.command, "smtpctl");
    assert_eq!(config.fields.len(), 3);
}

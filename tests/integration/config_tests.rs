use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use ftwin::cli::Cli;
use ftwin::config::Config;
use std::fs;
use std::path::PathBuf;
use clap::Parser;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config.io_threads, 4);
    assert_eq!(config.separator, '\n');
    assert!(config.exclude.is_empty());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("FTWINTEST_IO_THREADS", "16");
    std::env::set_var("FTWINTEST_SEPARATOR", ";");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("FTWINTEST_"))
        .extract()
        .unwrap();

    assert_eq!(config.io_threads, 16);
    assert_eq!(config.separator, ';');

    std::env::remove_var("FTWINTEST_IO_THREADS");
    std::env::remove_var("FTWINTEST_SEPARATOR");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
cache_path = "/var/tmp/ftwin-test.db"
io_threads = 8
min_size = 4096
exclude = ['\.git/', '~$']
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(config.cache_path, Some(PathBuf::from("/var/tmp/ftwin-test.db")));
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.min_size, Some(4096));
    assert_eq!(config.exclude.len(), 2);
    assert_eq!(config.separator, '\n');
}

#[test]
fn test_env_overrides_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\n").unwrap();
    std::env::set_var("FTWINLAYER_IO_THREADS", "2");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("FTWINLAYER_"))
        .extract()
        .unwrap();
    assert_eq!(config.io_threads, 2);

    std::env::remove_var("FTWINLAYER_IO_THREADS");
}

#[test]
fn test_config_invalid_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = [").unwrap();

    assert!(Config::load_from(&config_path).is_err());
}

#[test]
fn test_cli_flags_override_config() {
    let config = Config {
        separator: ';',
        min_size: Some(100),
        exclude: vec![r"\.tmp$".to_string()],
        ..Config::default()
    };

    let cli = Cli::try_parse_from(["ftwin", "-s", ",", "-e", r"\.bak$", "/p"]).unwrap();
    assert_eq!(cli.options(config.separator).sep, ',');
    assert_eq!(cli.exclude_regexes(&config.exclude).unwrap().len(), 2);

    let cli = Cli::try_parse_from(["ftwin", "/p"]).unwrap();
    assert_eq!(cli.options(config.separator).sep, ';');
    assert_eq!(cli.min_size.or(config.min_size), Some(100));
}

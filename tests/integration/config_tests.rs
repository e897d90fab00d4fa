use dupehunter::cli::OutputFormat;
use dupehunter::config::{Config, ConfigError};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::{Figment, Jail};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_defaults_extract() {
    // Figment without Env, so the process environment cannot interfere
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 4);
}

#[test]
fn test_config_from_toml_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
io_threads = 8
follow_symlinks = true
include_empty = true
max_size = 1048576
output = "json"
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.io_threads, 8);
    assert!(config.follow_symlinks);
    assert!(config.include_empty);
    assert_eq!(config.max_size, Some(1_048_576));
    assert_eq!(config.output, OutputFormat::Json);
}

#[test]
fn test_config_layers_in_order() {
    Jail::expect_with(|jail| {
        jail.create_file("dh.toml", "io_threads = 8\nverify = true\noutput = \"json\"")?;
        jail.set_env("DUPEHUNTER_OUTPUT", "text");

        let config = Config::load_from("dh.toml".as_ref()).map_err(|e| e.to_string())?;

        assert_eq!(config.io_threads, 8);
        assert!(config.verify);
        assert_eq!(config.output, OutputFormat::Text);
        Ok(())
    });
}

#[test]
fn test_config_env_only() {
    Jail::expect_with(|jail| {
        jail.set_env("DUPEHUNTER_IO_THREADS", "16");

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("DUPEHUNTER_"));
        let config: Config = figment.extract()?;

        assert_eq!(config.io_threads, 16);
        Ok(())
    });
}

#[test]
fn test_config_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = [").unwrap();

    let result = Config::load_from(&config_path);

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_to_toml_is_loadable() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let config = Config {
        io_threads: 2,
        skip_hidden: true,
        ignore_patterns: vec!["*.iso".to_string()],
        ..Config::default()
    };

    fs::write(&config_path, config.to_toml().unwrap()).unwrap();
    let saved = fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("io_threads = 2"));

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let loaded: Config = figment.extract().unwrap();
    assert_eq!(loaded, config);
}

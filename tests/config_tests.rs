use std::io::Write;

use rust_decimal_macros::dec;
use spreadwatch::domain::{BlacklistWindow, PairSymbol};
use spreadwatch::error::{ConfigError, Error};
use spreadwatch::infrastructure::config::settings::Config;
use spreadwatch::port::OpportunityWriteMode;

fn write_temp_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("spreadwatch-config-test-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn example_config_is_valid() {
    let content = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml"))
        .expect("read example config");
    let config = Config::parse_toml_with_secret(&content, Some("secret".into())).unwrap();

    assert_eq!(config.pairs.len(), 5);
    assert_eq!(config.pairs[0], PairSymbol::new("BTCUSDT"));
    assert_eq!(config.fees.futures_taker_percent, dec!(0.02));
    assert_eq!(config.blacklist.window, BlacklistWindow::OneHour);
    assert_eq!(config.sync.mode, OpportunityWriteMode::Refresh);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("absent.toml"));

    assert!(
        matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))),
        "expected read error, got {result:?}"
    );
}

#[test]
fn malformed_file_is_a_parse_error() {
    let file = write_temp_config("pairs = [\"BTCUSDT\"\n[exchange");
    let result = Config::load(file.path());

    assert!(
        matches!(result, Err(Error::Config(ConfigError::Parse(_)))),
        "expected parse error, got {result:?}"
    );
}

#[test]
fn wrong_url_scheme_is_rejected() {
    let toml = r#"
pairs = ["BTCUSDT"]

[exchange]
spot_ws_url = "https://spot.example.com/ws"
futures_ws_url = "wss://futures.example.com/ws"

[sync]
url = "https://store.example.com"
"#;
    let result = Config::parse_toml_with_secret(toml, Some("secret".into()));

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "spot_ws_url",
            ..
        }))
    ));
}

#[test]
fn negative_fee_override_is_rejected() {
    let toml = r#"
pairs = ["BTCUSDT"]

[exchange]
spot_ws_url = "wss://spot.example.com/ws"
futures_ws_url = "wss://futures.example.com/ws"

[sync]
url = "https://store.example.com"

[fees.overrides.BTCUSDT]
futures_taker_percent = -0.01
"#;
    let result = Config::parse_toml_with_secret(toml, Some("secret".into()));

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue { field: "fees", .. }))
    ));
}

#[test]
fn unknown_window_is_a_parse_error() {
    let toml = r#"
pairs = ["BTCUSDT"]

[blacklist]
window = "2h"
"#;
    let result = Config::parse_toml_with_secret(toml, Some("secret".into()));
    assert!(matches!(result, Err(Error::Config(ConfigError::Parse(_)))));
}

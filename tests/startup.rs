//! Startup from a config directory.

use std::path::PathBuf;
use std::time::Duration;

use ping_server::config::ConfigError;
use ping_server::lifecycle::{startup, StartupError};
use ping_server::{Shutdown, ShutdownOutcome};

fn config_dir(name: &str, contents: Option<&str>) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ping-server-startup-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    if let Some(contents) = contents {
        std::fs::write(dir.join("app.toml"), contents).unwrap();
    }
    dir
}

#[tokio::test]
async fn test_missing_config_file_fails_before_serving() {
    let dir = config_dir("missing", None);
    let shutdown = Shutdown::new();

    let err = startup::run(&dir, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Config(ConfigError::NotFound(_))));
    assert!(err.to_string().contains("config file not found"));
}

#[tokio::test]
async fn test_unparseable_config_fails_before_serving() {
    let dir = config_dir("garbage", Some("SERVE_ADDRESS = [oops"));
    let shutdown = Shutdown::new();

    let err = startup::run(&dir, shutdown.subscribe()).await.unwrap_err();
    assert!(matches!(err, StartupError::Config(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_valid_config_serves_until_shutdown() {
    let dir = config_dir("valid", Some("SERVE_ADDRESS = \"127.0.0.1:0\"\n"));
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { startup::run(&dir, server_shutdown).await });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished(), "server should still be serving");

    shutdown.trigger();
    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, ShutdownOutcome::Graceful);
}

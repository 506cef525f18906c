use std::path::PathBuf;
use std::time::Duration;

use switchyard::config::{CONFIG_ENV, Config, MAX_CONNECTIONS_ENV, PORT_ENV, ROOT_ENV};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 80);
    assert_eq!(cfg.server.max_connections, 1);
    assert_eq!(cfg.server.tick_interval(), Duration::from_millis(10));
    assert_eq!(cfg.server.server_name, "switchyard");
    assert_eq!(cfg.static_files.root, PathBuf::from("www"));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml_str(
        "server:\n  port: 8080\n  max_connections: 4\nstatic_files:\n  root: /srv/www\n",
    )
    .unwrap();

    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.max_connections, 4);
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.request_timeout(), Duration::from_secs(2));
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml_str("{}").unwrap();

    assert_eq!(cfg.server.port, 80);
    assert_eq!(cfg.server.max_request_head, 4096);
}

#[test]
fn test_config_rejects_wrong_types() {
    assert!(Config::from_yaml_str("server:\n  port: eighty\n").is_err());
}

#[test]
fn test_config_rejects_tiny_request_head() {
    assert!(Config::from_yaml_str("server:\n  max_request_head: 4\n").is_err());
}

#[test]
fn test_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchyard.yaml");
    std::fs::write(&path, "server:\n  server_name: lamp\n  close_linger_ms: 5\n").unwrap();

    let cfg = Config::from_file(&path).unwrap();

    assert_eq!(cfg.server.server_name, "lamp");
    assert_eq!(cfg.server.close_linger(), Duration::from_millis(5));
}

#[test]
fn test_config_missing_file() {
    let err = Config::from_file("/nonexistent/switchyard.yaml").unwrap_err();

    assert!(err.to_string().contains("failed to read config file"));
}

// Environment variables are process-wide, so every env-dependent case lives
// in this one test.
#[test]
fn test_config_env_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchyard.yaml");
    std::fs::write(&path, "server:\n  port: 9000\n  max_connections: 2\n").unwrap();

    unsafe {
        std::env::set_var(CONFIG_ENV, &path);
        std::env::remove_var(PORT_ENV);
        std::env::remove_var(ROOT_ENV);
        std::env::remove_var(MAX_CONNECTIONS_ENV);
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.max_connections, 2);

    unsafe {
        std::env::set_var(PORT_ENV, "3000");
        std::env::set_var(ROOT_ENV, "/data/www");
        std::env::set_var(MAX_CONNECTIONS_ENV, "8");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.port, 3000);
    assert_eq!(cfg.server.max_connections, 8);
    assert_eq!(cfg.static_files.root, PathBuf::from("/data/www"));

    unsafe {
        std::env::set_var(PORT_ENV, "not-a-port");
    }
    assert!(Config::load().is_err());

    unsafe {
        std::env::remove_var(CONFIG_ENV);
        std::env::remove_var(PORT_ENV);
        std::env::remove_var(ROOT_ENV);
        std::env::remove_var(MAX_CONNECTIONS_ENV);
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.port, 80);
}

// ============================
// crates/backend-lib/src/config/config_tests.rs
// ============================
use super::*;
use figment::Jail;

const KEY: &str = "0123456789abcdef0123456789abcdef";

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.storage.max_read_connections, 8);
    assert_eq!(settings.auth.token_ttl_secs, 60 * 60 * 24 * 7);
    assert!(settings.auth.signing_key.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_validation() {
    let settings = Settings::default();

    let mut invalid = settings.clone();
    invalid.logging.level = "loud".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.server.port = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.auth.signing_key = Some("short".to_string());
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.auth.previous_signing_keys = vec!["short".to_string()];
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.auth.login_max_attempts = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password.min_length = 200;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password.scrypt_r = 0;
    assert!(invalid.validate().is_err());

    let mut valid = settings;
    valid.auth.signing_key = Some(KEY.to_string());
    assert!(valid.validate().is_ok());
}

#[test]
fn test_token_ttl_bounds() {
    let mut settings = Settings::default();

    settings.auth.token_ttl_secs = 0;
    assert!(settings.validate().is_ok());

    settings.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
    assert!(settings.validate().is_ok());

    for ttl in [MAX_TOKEN_TTL_SECS + 1, i64::MAX as u64, u64::MAX] {
        settings.auth.token_ttl_secs = ttl;
        assert!(settings.validate().is_err(), "ttl {ttl} accepted");
    }
}

#[test]
fn test_in_memory_database_rejected() {
    let mut settings = Settings::default();

    for url in ["sqlite::memory:", "sqlite://:memory:", "sqlite://file.db?mode=memory"] {
        settings.storage.database_url = url.to_string();
        assert!(settings.validate().is_err(), "{url} accepted");
    }

    settings.storage.database_url = "sqlite://companion.db?mode=rwc".to_string();
    assert!(settings.validate().is_ok());
}

#[test]
fn test_debug_redacts_signing_keys() {
    let mut settings = Settings::default();
    settings.auth.signing_key = Some(KEY.to_string());
    settings.auth.previous_signing_keys = vec![KEY.to_string()];

    let rendered = format!("{settings:?}");
    assert!(!rendered.contains(KEY));
    assert!(rendered.contains("<redacted>"));
}

#[test]
fn test_bind_addr() {
    let mut settings = Settings::default();
    settings.server.host = "0.0.0.0".to_string();
    settings.server.port = 9000;
    assert_eq!(settings.bind_addr().unwrap().to_string(), "0.0.0.0:9000");

    settings.server.host = "not a host".to_string();
    assert!(settings.bind_addr().is_err());
}

#[test]
fn test_load_settings_file_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [server]
            host = "192.168.1.1"
            port = 8888

            [storage]
            database_url = "sqlite://test.db"

            [auth]
            signing_key = "0123456789abcdef0123456789abcdef"
            token_ttl_secs = 3600
            "#,
        )?;
        jail.set_env("COMPANION_SERVER__PORT", "9999");
        jail.set_env("COMPANION_LOGGING__LEVEL", "debug");

        let settings = Settings::load().map_err(|e| e.to_string())?;
        assert_eq!(settings.server.host, "192.168.1.1");
        // Environment variable takes precedence
        assert_eq!(settings.server.port, 9999);
        assert_eq!(settings.storage.database_url, "sqlite://test.db");
        assert_eq!(settings.auth.signing_key.as_deref(), Some(KEY));
        assert_eq!(settings.auth.token_ttl_secs, 3600);
        assert_eq!(settings.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(settings.password.min_length, 8);
        Ok(())
    });
}

#[test]
fn test_load_rejects_invalid_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
            [auth]
            signing_key = "too-short"
            "#,
        )?;

        assert!(Settings::load_from("custom.toml").is_err());
        Ok(())
    });
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    Jail::expect_with(|_jail| {
        let settings = Settings::load_from("does-not-exist.toml").map_err(|e| e.to_string())?;
        assert_eq!(settings.server.port, 8000);
        Ok(())
    });
}

use super::*;
use figment::Jail;
use std::path::PathBuf;

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.session.timeout_secs, 120);
    assert_eq!(settings.session.timeout(), Duration::from_secs(120));
    assert_eq!(settings.admin.username, "admin");
    assert_eq!(settings.storage.namespace, "board");
    assert_eq!(settings.data_root(), PathBuf::from("data").join("board"));
    assert!(settings.admin.path_secret.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_validation() {
    let settings = Settings::default();

    let mut invalid = settings.clone();
    invalid.log_level = "loud".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.session.timeout_secs = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password.min_length = 4;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.password.hash_cost = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.admin.path_secret = Some("not/a/segment".to_string());
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.storage.namespace = "../escape".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = settings.clone();
    invalid.secret_key = Some("short".to_string());
    assert!(invalid.validate().is_err());

    let mut valid = settings;
    valid.admin.path_secret = Some("s3cr3t-panel".to_string());
    valid.secret_key = Some("a-long-enough-secret-key".to_string());
    assert!(valid.validate().is_ok());
}

#[test]
fn test_load_settings_from_file_and_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "board.toml",
            r#"
            bind_addr = "0.0.0.0:8080"
            log_level = "debug"

            [session]
            timeout_secs = 300

            [admin]
            username = "root"
            path_secret = "hidden"
            "#,
        )?;

        // Environment variables take precedence over the file
        jail.set_env("BOARD_LOG_LEVEL", "warn");
        jail.set_env("BOARD_SESSION__TIMEOUT_SECS", "90");

        let settings: Settings = Settings::figment("board.toml").extract()?;
        assert_eq!(settings.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.session.timeout_secs, 90);
        assert_eq!(settings.admin.username, "root");
        assert_eq!(settings.admin.path_secret.as_deref(), Some("hidden"));

        // Untouched keys keep their defaults
        assert_eq!(settings.admin.email, "admin@example.com");
        assert_eq!(settings.session.cookie_name, "board_session");
        Ok(())
    });
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    Jail::expect_with(|_jail| {
        let settings: Settings = Settings::figment("does-not-exist.toml").extract()?;
        assert_eq!(settings.session.timeout_secs, 120);
        assert_eq!(settings.log_level, "info");
        Ok(())
    });
}

#[test]
fn test_load_from_rejects_invalid_values() {
    Jail::expect_with(|jail| {
        jail.create_file("board.toml", "[session]\ntimeout_secs = 0\n")?;
        assert!(Settings::load_from("board.toml").is_err());
        Ok(())
    });
}

use std::io::Write;

use serial_test::serial;

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["satchel"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "satchel",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--caching-enabled=true",
        "--caching-max-age-seconds",
        "60",
        "--jsonp-enabled",
        "false",
    ]);

    let Command::Serve(serve) = args.command.expect("serve command");
    assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
    assert_eq!(serve.overrides.caching_enabled, Some(true));
    assert_eq!(serve.overrides.caching_max_age_seconds, Some(60));
    assert_eq!(serve.overrides.jsonp_enabled, Some(false));
}

#[test]
fn defaults_are_applied_when_nothing_is_configured() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.api.version, VersionSpec::new(1..=1));
    assert!(settings.api.serializers_enabled);
    assert!(!settings.caching.enabled);
    assert_eq!(settings.caching.max_age, Duration::from_secs(900));
    assert_eq!(settings.caching.store_limit.get(), 10_000);
    assert!(!settings.jsonp.enabled);
    assert_eq!(settings.jsonp.parameter, "callback");
    assert_eq!(settings.errors.environment, "development");
    assert!(settings.errors.show_exception_message);
}

#[test]
fn production_hides_exception_messages_by_default() {
    let mut raw = RawSettings::default();
    raw.errors.environment = Some("Production".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.errors.environment, "production");
    assert!(!settings.errors.show_exception_message);
    assert!(!settings.errors.is_development_like());
}

#[test]
fn explicit_exception_message_flag_wins_over_environment() {
    let mut raw = RawSettings::default();
    raw.errors.environment = Some("production".to_string());
    raw.errors.show_exception_message = Some(true);

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(settings.errors.show_exception_message);
}

#[test]
fn version_range_must_be_ordered() {
    let mut raw = RawSettings::default();
    raw.api.version_minimum = Some(3);
    raw.api.version_maximum = Some(2);

    let err = Settings::from_raw(raw).expect_err("inverted range rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "api.version_maximum",
            ..
        }
    ));
}

#[test]
fn version_prefix_is_parsed() {
    let mut raw = RawSettings::default();
    raw.api.version_maximum = Some(3);
    raw.api.version_prefix = Some(" v ".to_string());
    raw.api.version_prefix_required = Some(true);

    let settings = Settings::from_raw(raw).expect("valid settings");

    let expected = VersionSpec::new(1..=3).with_prefix(VersionPrefix::required("v"));
    assert_eq!(settings.api.version, expected);
}

#[test]
fn version_prefix_rejects_digits() {
    let mut raw = RawSettings::default();
    raw.api.version_prefix = Some("v1".to_string());

    let err = Settings::from_raw(raw).expect_err("digit prefix rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "api.version_prefix",
            ..
        }
    ));
}

#[test]
fn zero_store_limit_is_rejected() {
    let mut raw = RawSettings::default();
    raw.caching.store_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit rejected");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "caching.store_limit",
            ..
        }
    ));
}

#[test]
fn blank_jsonp_parameter_is_rejected() {
    let mut raw = RawSettings::default();
    raw.jsonp.parameter = Some("   ".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level rejected");
    assert!(err.to_string().contains("logging.level"));
}

#[test]
#[serial]
fn config_file_is_layered_below_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        r#"
[server]
port = 8088

[caching]
enabled = true
max_age_secs = 120

[jsonp]
enabled = true
parameter = "cb"
"#
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "satchel",
        "--config-file",
        file.path().to_str().expect("utf8 path"),
        "serve",
        "--caching-max-age-seconds",
        "30",
    ]);

    let settings = load(&args).expect("settings load");

    assert_eq!(settings.server.addr.port(), 8088);
    assert!(settings.caching.enabled);
    assert_eq!(settings.caching.max_age, Duration::from_secs(30));
    assert!(settings.jsonp.enabled);
    assert_eq!(settings.jsonp.parameter, "cb");
}

#[test]
#[serial]
fn environment_name_falls_back_to_satchel_env() {
    let args = CliArgs::parse_from(["satchel"]);

    // SAFETY: serialised with every other test reading process environment.
    unsafe { env::set_var(ENVIRONMENT_VARIABLE, "production") };
    let result = load(&args);
    unsafe { env::remove_var(ENVIRONMENT_VARIABLE) };

    let settings = result.expect("settings load");
    assert_eq!(settings.errors.environment, "production");
    assert!(!settings.errors.show_exception_message);
}

#[test]
#[serial]
fn cli_environment_overrides_satchel_env() {
    let args = CliArgs::parse_from(["satchel", "serve", "--environment", "test"]);

    // SAFETY: serialised with every other test reading process environment.
    unsafe { env::set_var(ENVIRONMENT_VARIABLE, "production") };
    let result = load(&args);
    unsafe { env::remove_var(ENVIRONMENT_VARIABLE) };

    let settings = result.expect("settings load");
    assert_eq!(settings.errors.environment, "test");
    assert!(settings.errors.show_exception_message);
}

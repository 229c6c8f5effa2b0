use super::*;
use serial_test::serial;

#[test]
fn defaults_match_lambda_deployment() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.server.addr.to_string(), "0.0.0.0:8080");
    assert_eq!(settings.server.body_limit(), 4 * 1024 * 1024);
    assert_eq!(settings.graphviz.dot_path, PathBuf::from("dot"));
    assert_eq!(
        settings.graphviz.active_cache_dir(),
        Some(PathBuf::from(DEFAULT_GRAPHVIZ_CACHE_DIR))
    );
    assert_eq!(
        settings.browser.target_server.as_str(),
        "http://localhost:8080/static"
    );
    assert_eq!(settings.browser.viewport, (1280, 800));
    assert!(settings.browser.no_sandbox);
    assert_eq!(settings.browser.mermaid_wait, Duration::from_millis(1000));
}

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
fn disabling_cache_drops_cache_dir() {
    let mut raw = RawSettings::default();
    raw.apply_graphviz_overrides(&GraphvizOverrides {
        cache_enabled: Some(false),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.graphviz.active_cache_dir(), None);
}

#[test]
fn invalid_values_name_their_key() {
    let cases: [(&str, fn(&mut RawSettings)); 5] = [
        ("server.port", |raw| raw.server.port = Some(0)),
        ("server.max_request_bytes", |raw| {
            raw.server.max_request_bytes = Some(0)
        }),
        ("logging.level", |raw| raw.logging.level = Some("loud".to_string())),
        ("browser.target_server", |raw| {
            raw.browser.target_server = Some("file:///etc".to_string())
        }),
        ("browser.viewport_width", |raw| {
            raw.browser.viewport_width = Some(0)
        }),
    ];
    for (expected_key, mutate) in cases {
        let mut raw = RawSettings::default();
        mutate(&mut raw);
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected invalid `{expected_key}`, got {other:?}"),
        }
    }
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["mgraph-serverless"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_render_dot_arguments() {
    let args = CliArgs::parse_from([
        "mgraph-serverless",
        "render-dot",
        "--input",
        "graph.dot",
        "--output",
        "graph.svg",
        "--engine",
        "neato",
        "--graphviz-cache-enabled",
        "false",
    ]);

    match args.command.expect("render-dot command") {
        Command::RenderDot(render) => {
            assert_eq!(render.input, PathBuf::from("graph.dot"));
            assert_eq!(render.engine, crate::domain::types::LayoutEngine::Neato);
            assert_eq!(
                render.resolved_format(),
                crate::domain::types::OutputFormat::Svg
            );
            assert_eq!(render.graphviz.cache_enabled, Some(false));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
#[serial]
fn environment_overrides_file_defaults() {
    // SAFETY: env mutation is serialized with every other env-reading test.
    unsafe {
        std::env::set_var("MGRAPH__GRAPHVIZ__DOT_PATH", "/opt/graphviz/bin/dot");
        std::env::set_var("MGRAPH__BROWSER__MERMAID_WAIT_MS", "250");
    }
    let args = CliArgs::parse_from(["mgraph-serverless"]);
    let result = load(&args);
    unsafe {
        std::env::remove_var("MGRAPH__GRAPHVIZ__DOT_PATH");
        std::env::remove_var("MGRAPH__BROWSER__MERMAID_WAIT_MS");
    }

    let settings = result.expect("settings load");
    assert_eq!(
        settings.graphviz.dot_path,
        PathBuf::from("/opt/graphviz/bin/dot")
    );
    assert_eq!(settings.browser.mermaid_wait, Duration::from_millis(250));
}

#[test]
#[serial]
fn cli_beats_environment() {
    unsafe {
        std::env::set_var("MGRAPH__SERVER__PORT", "9000");
    }
    let args = CliArgs::parse_from(["mgraph-serverless", "serve", "--server-port", "9100"]);
    let result = load(&args);
    unsafe {
        std::env::remove_var("MGRAPH__SERVER__PORT");
    }

    assert_eq!(result.expect("settings load").server.addr.port(), 9100);
}

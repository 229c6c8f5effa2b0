use std::{process, sync::Arc};

use mgraph_serverless::{
    application::{
        browser::{ChromiumCapture, ChromiumSettings, WebRootRender, WebRootSettings},
        error::AppError,
        graphviz::GraphvizRenderer,
        plot::PlotRenderer,
        version,
    },
    config::{self, RenderDotArgs},
    domain::render::RenderDotRequest,
    infra::{
        assets,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::RenderDot(args) => run_render_dot(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let graphviz = GraphvizRenderer::new(
        settings.graphviz.dot_path.clone(),
        settings.graphviz.active_cache_dir(),
    )?;

    let capture = ChromiumCapture::new(ChromiumSettings {
        executable: settings.browser.executable.clone(),
        viewport: settings.browser.viewport,
        no_sandbox: settings.browser.no_sandbox,
        launch_timeout: settings.browser.launch_timeout,
    });
    let web_root = WebRootRender::new(
        Arc::new(capture),
        WebRootSettings {
            target_server: settings.browser.target_server.clone(),
            mermaid_wait: settings.browser.mermaid_wait,
        },
    );

    let state = AppState::new(graphviz, PlotRenderer::new(), web_root);
    let router = http::build_router(state, settings.server.body_limit());

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mgraph::serve",
        addr = %settings.server.addr,
        version = version::version(),
        dot_path = %settings.graphviz.dot_path.display(),
        graphviz_cache = settings.graphviz.cache_enabled,
        target_server = %settings.browser.target_server,
        static_root = assets::static_root(),
        "HTTP service listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "mgraph::serve", "HTTP service stopped");
    Ok(())
}

async fn run_render_dot(settings: config::Settings, args: RenderDotArgs) -> Result<(), AppError> {
    let dot_source = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let request = RenderDotRequest {
        dot_source,
        output_format: args.resolved_format(),
        engine: args.engine,
    };

    let renderer = GraphvizRenderer::new(
        settings.graphviz.dot_path.clone(),
        settings.graphviz.active_cache_dir(),
    )?;
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&request))
        .await
        .map_err(|err| AppError::unexpected(format!("graphviz render task failed: {err}")))??;

    tokio::fs::write(&args.output, &bytes)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "mgraph::render_dot",
        input = %args.input.display(),
        output = %args.output.display(),
        format = %args.resolved_format(),
        engine = %args.engine,
        output_bytes = bytes.len(),
        "DOT file rendered"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "mgraph::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "mgraph::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target = "mgraph::serve", "shutdown signal received");
}

//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU64, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    CliArgs, Command, GraphvizOverrides, RenderDotArgs, ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "mgraph";
const ENV_PREFIX: &str = "MGRAPH";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_REQUEST_BYTES: u64 = 4 * 1024 * 1024;
pub(crate) const DEFAULT_DOT_PATH: &str = "dot";
pub(crate) const DEFAULT_GRAPHVIZ_CACHE_DIR: &str = "/tmp/mgraph-graphviz";
pub(crate) const DEFAULT_TARGET_SERVER: &str = "http://localhost:8080/static";
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;
const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;
const DEFAULT_LAUNCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MERMAID_WAIT_MS: u64 = 1000;
const MAX_VIEWPORT_SIDE: u32 = 8192;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub graphviz: GraphvizSettings,
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub max_request_bytes: NonZeroU64,
}

impl ServerSettings {
    pub fn body_limit(&self) -> usize {
        // Validated to fit in usize during load.
        usize::try_from(self.max_request_bytes.get()).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct GraphvizSettings {
    pub dot_path: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_enabled: bool,
}

impl GraphvizSettings {
    /// Cache directory, or `None` when caching is switched off.
    pub fn active_cache_dir(&self) -> Option<PathBuf> {
        self.cache_enabled.then(|| self.cache_dir.clone())
    }
}

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub target_server: Url,
    pub viewport: (u32, u32),
    pub no_sandbox: bool,
    pub launch_timeout: Duration,
    pub mermaid_wait: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::RenderDot(args)) => raw.apply_graphviz_overrides(&args.graphviz),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    graphviz: RawGraphvizSettings,
    browser: RawBrowserSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(limit) = overrides.server_max_request_bytes {
            self.server.max_request_bytes = Some(limit);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.browser_executable.as_ref() {
            self.browser.executable = Some(path.clone());
        }
        if let Some(url) = overrides.browser_target_server.as_ref() {
            self.browser.target_server = Some(url.clone());
        }
        if let Some(no_sandbox) = overrides.browser_no_sandbox {
            self.browser.no_sandbox = Some(no_sandbox);
        }

        self.apply_graphviz_overrides(&overrides.graphviz);
    }

    fn apply_graphviz_overrides(&mut self, overrides: &GraphvizOverrides) {
        if let Some(path) = overrides.dot_path.as_ref() {
            self.graphviz.dot_path = Some(path.clone());
        }
        if let Some(dir) = overrides.cache_dir.as_ref() {
            self.graphviz.cache_dir = Some(dir.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.graphviz.cache_enabled = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            graphviz,
            browser,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            graphviz: build_graphviz_settings(graphviz)?,
            browser: build_browser_settings(browser)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let max_request_bytes_value = server
        .max_request_bytes
        .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("server.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "server.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(ServerSettings {
        addr,
        max_request_bytes,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_graphviz_settings(graphviz: RawGraphvizSettings) -> Result<GraphvizSettings, LoadError> {
    let dot_path = graphviz
        .dot_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOT_PATH));
    if dot_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "graphviz.dot_path",
            "path must not be empty",
        ));
    }

    let cache_dir = graphviz
        .cache_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_GRAPHVIZ_CACHE_DIR));
    if cache_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "graphviz.cache_dir",
            "path must not be empty",
        ));
    }

    Ok(GraphvizSettings {
        dot_path,
        cache_dir,
        cache_enabled: graphviz.cache_enabled.unwrap_or(true),
    })
}

fn build_browser_settings(browser: RawBrowserSettings) -> Result<BrowserSettings, LoadError> {
    let executable = browser
        .executable
        .filter(|path| !path.as_os_str().is_empty());

    let target_server_value = browser
        .target_server
        .unwrap_or_else(|| DEFAULT_TARGET_SERVER.to_string());
    let target_server = Url::parse(target_server_value.trim()).map_err(|err| {
        LoadError::invalid(
            "browser.target_server",
            format!("invalid URL `{target_server_value}`: {err}"),
        )
    })?;
    if !matches!(target_server.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "browser.target_server",
            "scheme must be http or https",
        ));
    }

    let width = viewport_side(browser.viewport_width, DEFAULT_VIEWPORT_WIDTH, "browser.viewport_width")?;
    let height = viewport_side(
        browser.viewport_height,
        DEFAULT_VIEWPORT_HEIGHT,
        "browser.viewport_height",
    )?;

    let launch_timeout_secs = browser
        .launch_timeout_seconds
        .unwrap_or(DEFAULT_LAUNCH_TIMEOUT_SECS);
    if launch_timeout_secs == 0 {
        return Err(LoadError::invalid(
            "browser.launch_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(BrowserSettings {
        executable,
        target_server,
        viewport: (width, height),
        no_sandbox: browser.no_sandbox.unwrap_or(true),
        launch_timeout: Duration::from_secs(launch_timeout_secs),
        mermaid_wait: Duration::from_millis(
            browser.mermaid_wait_ms.unwrap_or(DEFAULT_MERMAID_WAIT_MS),
        ),
    })
}

fn viewport_side(value: Option<u32>, default: u32, key: &'static str) -> Result<u32, LoadError> {
    let value = value.unwrap_or(default);
    if value == 0 || value > MAX_VIEWPORT_SIDE {
        return Err(LoadError::invalid(
            key,
            format!("must be within 1..={MAX_VIEWPORT_SIDE}"),
        ));
    }
    Ok(value)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGraphvizSettings {
    dot_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    cache_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBrowserSettings {
    executable: Option<PathBuf>,
    target_server: Option<String>,
    viewport_width: Option<u32>,
    viewport_height: Option<u32>,
    no_sandbox: Option<bool>,
    launch_timeout_seconds: Option<u64>,
    mermaid_wait_ms: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

#[cfg(test)]
mod tests;

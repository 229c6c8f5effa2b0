use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::types::{LayoutEngine, OutputFormat};

/// Command-line arguments for the mgraph binary.
#[derive(Debug, Parser)]
#[command(
    name = "mgraph-serverless",
    version,
    about = "Graph rendering service (Graphviz, layout plots, headless browser)"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MGRAPH_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Render a DOT file to disk without starting the service.
    #[command(name = "render-dot")]
    RenderDot(RenderDotArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GraphvizOverrides {
    /// Override the Graphviz executable used for DOT rendering.
    #[arg(long = "graphviz-dot-path", value_name = "PATH")]
    pub dot_path: Option<PathBuf>,

    /// Override the directory used to cache rendered DOT output.
    #[arg(long = "graphviz-cache-dir", value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Toggle the on-disk render cache.
    #[arg(
        long = "graphviz-cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub graphviz: GraphvizOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the maximum accepted request body in bytes.
    #[arg(long = "server-max-request-bytes", value_name = "BYTES")]
    pub server_max_request_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Chromium executable used for page captures.
    #[arg(long = "browser-executable", value_name = "PATH")]
    pub browser_executable: Option<PathBuf>,

    /// Override the base URL the browser loads static pages from.
    #[arg(long = "browser-target-server", value_name = "URL")]
    pub browser_target_server: Option<String>,

    /// Toggle Chromium's `--no-sandbox` flag.
    #[arg(
        long = "browser-no-sandbox",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub browser_no_sandbox: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderDotArgs {
    #[command(flatten)]
    pub graphviz: GraphvizOverrides,

    /// DOT source file to render.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Destination file for the rendered output.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Output format (png|svg|pdf); inferred from the output extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Graphviz layout engine.
    #[arg(long, value_name = "ENGINE", default_value = "dot")]
    pub engine: LayoutEngine,
}

impl RenderDotArgs {
    pub fn resolved_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| {
            self.output
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
                .unwrap_or_default()
        })
    }
}

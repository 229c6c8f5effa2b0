//! DOT rendering through the Graphviz command line tools.

use std::{
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    time::Instant,
};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    domain::{
        error::DomainError,
        render::RenderDotRequest,
        types::{LayoutEngine, OutputFormat},
    },
    infra::telemetry,
};

const TARGET: &str = "application::graphviz";

#[derive(Debug, Error)]
pub enum GraphvizError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("failed to prepare cache directory: {0}")]
    CacheInit(io::Error),
    #[error("failed to stage graphviz files: {0}")]
    Io(io::Error),
    #[error("graphviz exited with code {exit_code:?}: {stderr}")]
    Cli {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("graphviz executable unavailable: {0}")]
    Unavailable(io::Error),
    #[error("failed to read rendered output: {0}")]
    Read(io::Error),
}

#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    dot_path: PathBuf,
    cache_dir: Option<PathBuf>,
}

impl GraphvizRenderer {
    /// `cache_dir` of `None` renders every request through the executable.
    pub fn new(dot_path: PathBuf, cache_dir: Option<PathBuf>) -> Result<Self, GraphvizError> {
        if let Some(dir) = &cache_dir {
            fs::create_dir_all(dir).map_err(GraphvizError::CacheInit)?;
        }
        Ok(Self {
            dot_path,
            cache_dir,
        })
    }

    pub fn dot_path(&self) -> &Path {
        &self.dot_path
    }

    /// Blocking; call from `spawn_blocking` inside the runtime.
    pub fn render(&self, request: &RenderDotRequest) -> Result<Vec<u8>, GraphvizError> {
        request.validate()?;
        let started_at = Instant::now();
        let format = request.output_format;

        let cache_path = self.cache_dir.as_ref().map(|dir| {
            let key = cache_key(request.engine, format, &request.dot_source);
            dir.join(format!("{key}.{}", format.extension()))
        });

        if let Some(path) = &cache_path {
            match fs::read(path) {
                Ok(bytes) => {
                    telemetry::record_graphviz_cache_hit();
                    info!(
                        target = TARGET,
                        op = "graphviz::render",
                        result = "cache_hit",
                        elapsed_ms = started_at.elapsed().as_millis() as u64,
                        cache_path = %path.display(),
                        output_bytes = bytes.len(),
                        "DOT graph served from cache"
                    );
                    return Ok(bytes);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(
                        target = TARGET,
                        op = "graphviz::render",
                        result = "cache_read_error",
                        cache_path = %path.display(),
                        error = %err,
                        "Failed to read cached DOT output; re-rendering"
                    );
                }
            }
        }

        let mut input_file = NamedTempFile::new().map_err(GraphvizError::Io)?;
        input_file
            .write_all(request.dot_source.as_bytes())
            .map_err(GraphvizError::Io)?;
        input_file.flush().map_err(GraphvizError::Io)?;

        let suffix = format!(".{}", format.extension());
        let mut builder = tempfile::Builder::new();
        builder.suffix(&suffix);
        let output_file = match &self.cache_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(GraphvizError::Io)?;

        let cli_started_at = Instant::now();
        let output = Command::new(&self.dot_path)
            .arg(format!("-K{}", request.engine))
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(output_file.path())
            .arg(input_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| {
                warn!(
                    target = TARGET,
                    op = "graphviz::render",
                    result = "error",
                    error_code = "spawn_cli",
                    dot_path = %self.dot_path.display(),
                    error = %err,
                    "Failed to spawn Graphviz"
                );
                if err.kind() == ErrorKind::NotFound {
                    GraphvizError::Unavailable(err)
                } else {
                    GraphvizError::Io(err)
                }
            })?;

        if !output.status.success() {
            let exit_code = output.status.code();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                target = TARGET,
                op = "graphviz::render",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                cli_elapsed_ms = cli_started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                error_code = "graphviz_cli",
                stderr = %stderr,
                "Graphviz invocation failed"
            );
            return Err(GraphvizError::Cli { exit_code, stderr });
        }

        let bytes = match &cache_path {
            Some(path) => {
                match output_file.persist(path) {
                    Ok(_) => {}
                    // A concurrent render of the same graph got there first.
                    Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {}
                    Err(err) => return Err(GraphvizError::Io(err.error)),
                }
                fs::read(path).map_err(GraphvizError::Read)?
            }
            None => fs::read(output_file.path()).map_err(GraphvizError::Read)?,
        };

        info!(
            target = TARGET,
            op = "graphviz::render",
            result = "rendered",
            engine = %request.engine,
            format = %format,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            cli_elapsed_ms = cli_started_at.elapsed().as_millis() as u64,
            output_bytes = bytes.len(),
            "DOT graph rendered via Graphviz"
        );

        Ok(bytes)
    }
}

fn cache_key(engine: LayoutEngine, format: OutputFormat, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(engine.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(format.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

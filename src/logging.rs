use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for console output
    pub console_level: Level,
    /// Log level for file output
    pub file_level: Level,
    /// Directory where log files should be written
    pub log_dir: Option<PathBuf>,
    /// Whether to enable JSON formatted logs for structured output
    pub json_format: bool,
    /// Disables console output entirely
    pub quiet: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::WARN,
            file_level: Level::DEBUG,
            log_dir: Some(Self::default_log_dir()),
            json_format: false,
            quiet: false,
        }
    }
}

impl LoggingConfig {
    /// Get the OS-appropriate default log directory
    pub fn default_log_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "drone-scm") {
            // On Linux: ~/.cache/drone-scm
            proj_dirs.cache_dir().to_path_buf()
        } else {
            PathBuf::from("drone-scm-logs")
        }
    }

    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("DRONE_SCM_LOG_LEVEL") {
            config.apply_level(&level);
        }

        if let Ok(log_dir) = std::env::var("DRONE_SCM_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(log_dir));
        }

        if std::env::var("DRONE_SCM_NO_FILE_LOGS").is_ok() {
            config.log_dir = None;
        }

        if std::env::var("DRONE_SCM_JSON_LOGS").is_ok() {
            config.json_format = true;
        }

        config
    }

    /// Applies a level name; `Off` silences both console and file output
    pub fn apply_level(&mut self, level: &str) {
        if level.eq_ignore_ascii_case("off") {
            self.log_dir = None;
            self.quiet = true;
        } else if let Ok(parsed_level) = level.parse::<Level>() {
            self.console_level = parsed_level;
            self.file_level = parsed_level;
        }
    }
}

/// Initialize the logging system with the given configuration
///
/// Console output goes to stderr; stdout carries command output only.
pub fn init_logging(
    config: LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "drone-scm.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(config.file_level.into())
                        .from_env_lossy(),
                )
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(config.file_level.into())
                        .from_env_lossy(),
                )
                .boxed()
        };

        layers.push(file_layer);
    }

    if !config.quiet {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(
                EnvFilter::builder()
                    .with_default_directive(config.console_level.into())
                    .from_env_lossy(),
            )
            .boxed();

        layers.push(console_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}

use std::io;

use time::macros::format_description;
use tracing::level_filters::LevelFilter;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::cli::types::{LogFormat, LogLevel};

const LOG_DIR: &str = "./logs";
const DEFAULT_MAX_LOG_FILES: usize = 7;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;
type Timer = LocalTime<&'static [time::format_description::BorrowedFormatItem<'static>]>;

pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub file_path: Option<String>,
    pub max_log_files: Option<usize>,
}

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must live as long as the process logs.
pub fn configure_global_tracing(
    config: LogConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let timer: Timer = LocalTime::new(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format, timer.clone())];
    let mut guard = None;

    if let Some(file_path) = &config.file_path {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(file_path)
            .filename_suffix("log")
            .max_log_files(config.max_log_files.unwrap_or(DEFAULT_MAX_LOG_FILES))
            .build(LOG_DIR)?;
        let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

        layers.push(file_layer(config.format, timer, non_blocking_file));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(config.level))
        .try_init()?;

    Ok(guard)
}

fn build_filter(level: LogLevel) -> EnvFilter {
    let directives = [
        format!("edge_cache={}", LevelFilter::from(level)),
        "hyper=warn".to_string(),
        "hyper_util=warn".to_string(),
        "h2=warn".to_string(),
        "reqwest=warn".to_string(),
        "tokio=warn".to_string(),
    ];

    directives
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        })
}

fn console_layer(format: LogFormat, timer: Timer) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_thread_ids(true)
            .with_line_number(false)
            .with_file(true)
            .with_timer(timer)
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(timer)
            .with_writer(io::stdout)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_timer(timer)
            .with_writer(io::stdout)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, timer: Timer, writer: NonBlocking) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_thread_ids(true)
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(false)
            .with_timer(timer)
            .with_writer(writer)
            .boxed(),
    }
}

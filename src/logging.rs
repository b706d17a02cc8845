use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

use crate::{InitializationError, LogFormat, LoggingConfig, ProberError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ProberError> {
    // Validate logging config before proceeding
    config
        .validate()
        .map_err(|e| InitializationError::logging(e.to_string()))?;

    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        time::format_description::well_known::Rfc3339,
    );

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_names)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_timer(timer.clone());

    layers.push(match config.format {
        LogFormat::Pretty => console.pretty().with_filter(env_filter(config)).boxed(),
        LogFormat::Compact => console.compact().with_filter(env_filter(config)).boxed(),
        LogFormat::Json => console.json().with_filter(env_filter(config)).boxed(),
    });

    // Daily rotated file output
    let guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ping-pacer.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(timer)
                    .with_filter(env_filter(config))
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    if config.journald {
        let journald = tracing_journald::layer().map_err(|e| {
            InitializationError::logging(format!("Failed to connect to journald: {}", e))
        })?;
        layers.push(journald.with_filter(env_filter(config)).boxed());
    }

    Registry::default().with(layers).try_init().map_err(|e| {
        ProberError::Init(InitializationError::logging(format!(
            "Failed to initialize logging: {}",
            e
        )))
    })?;

    Ok(guard)
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::default().add_directive(config.get_level_filter().into())
}

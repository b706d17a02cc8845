use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};

use super::{LoggingConfig, ProbeConfig, ScheduleConfig};

/// Main application configuration
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Probe transport configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Scheduling and reporting configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default configuration directory
    pub const CONFIG_DIR: &'static str = "config";

    /// Environment variable prefix
    const ENV_PREFIX: &'static str = "PING_PACER";

    /// Build configuration using the following priority (highest to lowest):
    /// 1. Environment variables (PING_PACER_<SECTION>__<KEY>)
    /// 2. Local configuration file (config/local.yaml)
    /// 3. Environment specific file (config/{env}.yaml)
    /// 4. Default configuration (config/default.yaml)
    /// 5. Built-in defaults
    pub fn new() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Start with built-in defaults
        let defaults = Config::default();

        let mut builder = ConfigBuilder::builder();

        builder = builder
            // Probe configuration
            .set_default("probe.program", defaults.probe.program)?
            .set_default(
                "probe.timeout",
                format!("{}ms", defaults.probe.timeout.as_millis()),
            )?
            .set_default("probe.payload_size", defaults.probe.payload_size as i64)?
            .set_default("probe.max_in_flight", defaults.probe.max_in_flight as i64)?
            .set_default("probe.overflow", defaults.probe.overflow.to_string())?
            // Schedule configuration
            .set_default("schedule.rate_hz", defaults.schedule.rate_hz)?
            .set_default(
                "schedule.min_report_elapsed",
                format!("{}ms", defaults.schedule.min_report_elapsed.as_millis()),
            )?
            .set_default(
                "schedule.report_buffer",
                defaults.schedule.report_buffer as i64,
            )?
            // Logging configuration
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format.to_string())?
            .set_default(
                "logging.include_location",
                defaults.logging.include_location,
            )?;

        let config = builder
            // Load default config file
            .add_source(
                File::new(&format!("{}/default", Self::CONFIG_DIR), FileFormat::Yaml)
                    .required(false),
            )
            // Load environment specific config
            .add_source(
                File::new(
                    &format!("{}/{}", Self::CONFIG_DIR, environment),
                    FileFormat::Yaml,
                )
                .required(false),
            )
            // Load local overrides
            .add_source(
                File::new(&format!("{}/local", Self::CONFIG_DIR), FileFormat::Yaml).required(false),
            )
            // Add environment variables
            .add_source(Self::environment())
            .build()?;

        // Deserialize and validate
        let config = config.try_deserialize()?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            // Load the specified config file
            .add_source(File::from(path))
            // Add env vars as overrides
            .add_source(Self::environment())
            .build()?;

        let config = config.try_deserialize()?;
        Self::validate(&config)?;

        Ok(config)
    }

    fn environment() -> Environment {
        Environment::with_prefix(Self::ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Validate configuration
    pub fn validate(config: &Self) -> Result<(), ConfigError> {
        // Helper to convert validation errors
        fn validation_error(msg: &str) -> ConfigError {
            ConfigError::Message(msg.to_string())
        }

        // Validate probe configuration
        if config.probe.program.trim().is_empty() {
            return Err(validation_error("Probe program must not be empty"));
        }
        if config.probe.timeout.is_zero() {
            return Err(validation_error("Probe timeout must be non-zero"));
        }
        if config.probe.payload_size == 0 {
            return Err(validation_error("Probe payload size must be non-zero"));
        }
        if config.probe.max_in_flight == 0 {
            return Err(validation_error("max_in_flight must be non-zero"));
        }

        // Validate schedule configuration
        if !config.schedule.rate_hz.is_finite() || config.schedule.rate_hz <= 0.0 {
            return Err(validation_error("Probe rate must be a positive number"));
        }
        if config.schedule.report_buffer == 0 {
            return Err(validation_error("Report buffer must be non-zero"));
        }

        // Validate logging configuration
        config
            .logging
            .validate()
            .map_err(|err| ConfigError::Message(err.to_string()))?;

        Ok(())
    }
}

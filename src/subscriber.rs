//! Tracing subscriber setup for processes embedding the store.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};

use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{ConfigError, ConfigResult};
use crate::settings::{LogFormat, LoggingConfig};

/// Install a global tracing subscriber built from `config`.
///
/// Fails if the filter does not parse, the log file cannot be opened, or a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> ConfigResult<()> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::Logging(format!("invalid log filter: {}", e)))?;

    let (writer, ansi) = make_writer(&config.output)?;
    let layer = fmt::layer()
        .with_ansi(ansi && config.color)
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (config.format, config.timestamps) {
        (LogFormat::Text, true) => layer.boxed(),
        (LogFormat::Text, false) => layer.without_time().boxed(),
        (LogFormat::Json, true) => layer.json().boxed(),
        (LogFormat::Json, false) => layer.json().without_time().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Writer for `output`, and whether it is a terminal that may take colors.
fn make_writer(output: &str) -> ConfigResult<(BoxMakeWriter, bool)> {
    match output {
        "stdout" => Ok((BoxMakeWriter::new(io::stdout), io::stdout().is_terminal())),
        "stderr" => Ok((BoxMakeWriter::new(io::stderr), io::stderr().is_terminal())),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::io(path, e))?;
            Ok((BoxMakeWriter::new(file), false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter() {
        let config = LoggingConfig {
            level: "yarss_config=loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_unopenable_log_file() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let output = dir.path().join("missing").join("yarss2.log");
        let result = make_writer(&output.to_string_lossy());
        assert!(result.is_err_and(|e| e.is_io()));
        Ok(())
    }
}

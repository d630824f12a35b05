//! CLI error types.

use std::fmt;
use std::io;
use std::process;

use movingmap::aircraft_position::TelemetryError;
use movingmap::config::ConfigFileError;
use movingmap::service::ServiceError;

/// Errors that end a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Configuration error
    Config(ConfigFileError),
    /// Invalid command-line argument
    InvalidArgument(String),
    /// Failed to build the async runtime
    Runtime(io::Error),
    /// Failed to create the tile service
    ServiceCreation(ServiceError),
    /// Telemetry feed error
    Telemetry(TelemetryError),
    /// Failed to install the Ctrl-C handler
    SignalHandler(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Telemetry(TelemetryError::Connect { address, .. }) => {
                eprintln!();
                eprintln!("Is the simulator running and publishing telemetry?");
                eprintln!("  Expected feed at: {}", address);
                eprintln!("  Override with --address or [telemetry] address in config.ini");
            }
            CliError::ServiceCreation(ServiceError::CacheDirectory { path, .. }) => {
                eprintln!();
                eprintln!("Check that {} is writable,", path.display());
                eprintln!("or set [cache] directory in config.ini");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::ServiceCreation(e) => write!(f, "Failed to create tile service: {}", e),
            CliError::Telemetry(e) => write!(f, "Telemetry error: {}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Telemetry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::ServiceCreation(e)
    }
}

impl From<TelemetryError> for CliError {
    fn from(e: TelemetryError) -> Self {
        CliError::Telemetry(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::InvalidArgument("latitude 91 is outside -90..=90".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid argument: latitude 91 is outside -90..=90"
        );

        let err = CliError::SignalHandler("already set".to_string());
        assert_eq!(err.to_string(), "Failed to set signal handler: already set");
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err = CliError::Runtime(io::Error::new(io::ErrorKind::Other, "no threads"));
        assert!(err.source().is_some());
        assert!(CliError::InvalidArgument("x".to_string()).source().is_none());
    }
}

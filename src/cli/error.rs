//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("no match: {0}")]
    NoMatch(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::NoMatch(_) => crate::exitcode::NOINPUT,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Http { .. } => crate::exitcode::CONFIG,
                InfraError::Json { .. } => crate::exitcode::DATAERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. }
                    | ApplicationError::ConfigFile { .. }
                    | ApplicationError::Domain(_) => crate::exitcode::CONFIG,
                    ApplicationError::RateLimited { .. } => crate::exitcode::TEMPFAIL,
                    ApplicationError::Fetch { .. } => crate::exitcode::UNAVAILABLE,
                    ApplicationError::NotFound(_) => crate::exitcode::NOINPUT,
                },
            },
        }
    }
}

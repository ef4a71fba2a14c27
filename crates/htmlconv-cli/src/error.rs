//! CLI error types.

use htmlconv::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Rule-file errors name the offending path.
    #[error("{path}: {source}")]
    Rules {
        path: String,
        source: ConvertError,
    },

    #[error("{0}")]
    Convert(#[from] ConvertError),
}

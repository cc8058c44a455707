use std::io;
use std::num::ParseFloatError;
use thiserror::Error;

/// Errors raised while turning command-line flags into a [`RunConfig`].
///
/// [`RunConfig`]: crate::config::RunConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid percentile '{text}': {source}")]
    Percentile {
        text: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("refresh rate must be at least 1 second, got {0}")]
    RefreshRate(u64),
}

/// Errors raised while reading values from the input stream. Both are fatal.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("an error occurred parsing user input at line {line} ('{text}'): {source}")]
    Parse {
        line: usize,
        text: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),
}

/// Reasons the reporting loop stops.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("failed to write snapshot: {0}")]
    Output(#[source] io::Error),

    #[error("failed to start value source thread: {0}")]
    Spawn(#[source] io::Error),
}

//! Error taxonomy for the sampling engine.
//!
//! Every variant is fatal to a run: a statistic built from a partial or
//! silently skewed sample is never reported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("invalid sample size {0}: must be a positive integer")]
    InvalidSampleSize(u64),

    #[error("profile store contains no evaluated systems")]
    EmptyPopulation,

    #[error("cannot aggregate an empty sample: averages are undefined")]
    EmptySample,

    #[error("malformed profile for system {system}: {reason}")]
    MalformedProfile { system: String, reason: String },

    #[error("system {0} is not present in the profile store")]
    UnknownSystem(String),

    #[error("profile store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, SampleError>;

impl SampleError {
    /// Shorthand for a [`SampleError::MalformedProfile`].
    pub fn malformed(system: impl Into<String>, reason: impl Into<String>) -> Self {
        SampleError::MalformedProfile {
            system: system.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// A bad sample size is an invocation error (2, same as clap usage
    /// errors); everything else is a runtime failure (1).
    pub fn exit_code(&self) -> i32 {
        match self {
            SampleError::InvalidSampleSize(_) => 2,
            _ => 1,
        }
    }
}

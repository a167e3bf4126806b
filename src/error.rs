//! Exit codes and machine-readable fatal errors.

use serde::Serialize;

/// Process exit status.
///
/// Duplicates found is the "success" outcome so scripts can test for
/// duplicates with a plain `if ftwin ...; then`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were reported.
    Success = 0,
    /// A fatal error stopped the run.
    GeneralError = 1,
    /// The run finished and found no duplicates.
    NoDuplicates = 2,
    /// No duplicates were reported and some candidates could not be read.
    PartialSuccess = 3,
    /// Interrupted by SIGINT.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric process status.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable code printed in front of error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FT000",
            Self::GeneralError => "FT001",
            Self::NoDuplicates => "FT002",
            Self::PartialSuccess => "FT003",
            Self::Interrupted => "FT130",
        }
    }

    /// Pick the status for a finished run.
    #[must_use]
    pub fn for_outcome(found_duplicates: bool, had_errors: bool) -> Self {
        match (found_duplicates, had_errors) {
            (true, _) => Self::Success,
            (false, true) => Self::PartialSuccess,
            (false, false) => Self::NoDuplicates,
        }
    }
}

/// A fatal error as printed by `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code prefix, e.g. `FT001`
    pub code: String,
    pub exit_code: i32,
    /// The full error chain, outermost first
    pub message: String,
    pub interrupted: bool,
}

impl StructuredError {
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

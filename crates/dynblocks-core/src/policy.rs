//! Per-fragment error policy.

use crate::error::{Error, Result};
use crate::options::FragmentOptions;
use crate::session::CellResult;

/// What a fragment-level failure does to the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log it, record it, embed the error text, keep going.
    Continue,
    /// Abort the whole pass (`fail-on-error`).
    FailFast,
}

impl ErrorPolicy {
    pub fn for_fragment(options: &FragmentOptions) -> Self {
        if options.fail_on_error {
            Self::FailFast
        } else {
            Self::Continue
        }
    }

    /// Decide what a cell that reported `success == false` means.
    pub fn on_cell_failure(&self, result: &CellResult) -> Result<()> {
        match self {
            Self::FailFast => Err(Error::CellFailed {
                id: result.id.clone(),
                output: result.failure_output(),
            }),
            Self::Continue => Ok(()),
        }
    }

    /// Contain a fragment-scoped error, or hand it back for propagation.
    ///
    /// Errors that are not fragment-scoped always propagate.
    pub fn contain(&self, error: Error) -> Result<Error> {
        match self {
            Self::Continue if error.is_fragment_scoped() => Ok(error),
            _ => Err(error),
        }
    }
}

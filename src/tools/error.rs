//! Tool-level error type.

use crate::calculator::error::CalcError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool arguments were missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A calculator operation failed underneath the tool.
    #[error(transparent)]
    Calc(#[from] CalcError),

    /// Anything else that broke mid-execution.
    #[error("execution failed: {0}")]
    Execution(String),
}

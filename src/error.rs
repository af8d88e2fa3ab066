//! Error taxonomy surfaced by the computer tool

use std::fmt;

use crate::input::InputError;

/// Errors returned to the caller of an action
#[derive(Debug)]
pub enum ToolError {
    /// Malformed or contradictory action parameters
    Validation(String),
    /// Agent coordinate outside the configured resolution
    OutOfBounds { x: u32, y: u32 },
    /// Screenshot file missing after the capture pipeline (carries stderr)
    Capture(String),
    /// Input backend failure
    Input(InputError),
    /// Filesystem error around the screenshot directory
    Io(std::io::Error),
}

impl ToolError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ToolError::Validation(msg.into())
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Validation(msg) => write!(f, "{}", msg),
            ToolError::OutOfBounds { x, y } => {
                write!(f, "Coordinates {}, {} are out of bounds", x, y)
            }
            ToolError::Capture(stderr) => write!(f, "Failed to take screenshot: {}", stderr),
            ToolError::Input(e) => write!(f, "Input error: {}", e),
            ToolError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Input(e) => Some(e),
            ToolError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InputError> for ToolError {
    fn from(e: InputError) -> Self {
        ToolError::Input(e)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;

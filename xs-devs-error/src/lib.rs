use std::io;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type XsResult<T> = Result<T, XsDevsError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the tagging protocol.
#[derive(Error, Debug)]
pub enum XsDevsError {
    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Device '{0}' not found")]
    DeviceNotFound(String),

    /// The expected `inuse_<system>` tag did not show up after trigger + settle.
    #[error("Failed to tag device '{device}' with '{system}'")]
    DeviceTagging { device: String, system: String },

    #[error("Invalid {kind} name: {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("Unexpected device-mapper info output: {0:?}")]
    DmInfo(String),
}

impl XsDevsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, XsDevsError::DeviceNotFound(_))
    }
}

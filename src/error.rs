use std::error::Error;
use std::fmt;
use std::fmt::Display;

use log::SetLoggerError;

/// Errors raised on a sink's rotation or write path. Every one of them is
/// fatal to the worker that hits it: the worker reports it and stops
/// consuming its queue.
#[derive(Clone, Debug)]
pub enum LogError {
    /// cannot create or open the target file
    Open(String),
    /// cannot stat or measure the existing target file
    Stat(String),
    /// cannot enumerate rotation candidates
    ListDir(String),
    Rename(String),
    Remove(String),
    /// record or template write failed
    Write(String),
    E(String),
}

impl From<&str> for LogError {
    fn from(arg: &str) -> Self {
        LogError::E(arg.to_string())
    }
}

impl From<String> for LogError {
    fn from(arg: String) -> Self {
        LogError::E(arg)
    }
}

impl From<std::io::Error> for LogError {
    fn from(arg: std::io::Error) -> Self {
        LogError::E(arg.to_string())
    }
}

impl From<SetLoggerError> for LogError {
    fn from(arg: SetLoggerError) -> Self {
        LogError::E(arg.to_string())
    }
}

impl Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogError::Open(e) => write!(f, "open error: {}", e),
            LogError::Stat(e) => write!(f, "stat error: {}", e),
            LogError::ListDir(e) => write!(f, "list dir error: {}", e),
            LogError::Rename(e) => write!(f, "rename error: {}", e),
            LogError::Remove(e) => write!(f, "remove error: {}", e),
            LogError::Write(e) => write!(f, "write error: {}", e),
            LogError::E(e) => write!(f, "{}", e),
        }
    }
}

impl Error for LogError {}

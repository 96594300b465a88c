use thiserror::Error;

/// Failure raised to the embedding interpreter, which turns it into the
/// matching language-level exception object.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("TypeError: {0}")]
    Type(String),
    #[error("RangeError: {0}")]
    Range(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Type,
    Range,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Type(_) => ErrorKind::Type,
            Self::Range(_) => ErrorKind::Range,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Type(msg) | Self::Range(msg) => msg,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Rejects the current operation: raises a `TypeError` when `$throwable` is
/// set, otherwise returns `Ok(false)`.
macro_rules! reject {
    ($throwable: expr, $msg: expr) => {{
        if $throwable {
            return Err($crate::error::Error::Type(String::from($msg)));
        }
        return Ok(false);
    }};
}

pub(crate) use reject;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Invalid argument for {function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}: unknown error: {message}")]
    Internal { function: String, message: String },
}

/// Failure reported by a tree parser.
///
/// Soft failures mean "no usable tree for this content" and never reach the
/// caller as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no syntax found for content: {0}")]
    NoSyntax(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("tree nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parser internal error: {0}")]
    Internal(String),

    #[error("parse cancelled")]
    Cancelled,
}

impl ParseError {
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ParseError::NoSyntax(_)
                | ParseError::Syntax(_)
                | ParseError::UnsupportedLanguage(_)
                | ParseError::TooDeep(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, UastError>;

/// Runs `f`, turning a panic beneath it into `UastError::Internal`.
pub fn catch_fatal<R>(function: &str, f: impl FnOnce() -> Result<R>) -> Result<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(function, "caught panic: {}", message);
            Err(UastError::Internal {
                function: function.to_string(),
                message,
            })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

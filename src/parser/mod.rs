//! Parser contract and the tree-sitter backed implementation.

pub mod roles;
pub mod treesitter;

pub use treesitter::TreeSitterParser;

use std::fmt;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::error::{ParseError, UastError};
use crate::uast::Node;

/// Shape of the tree a parser returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Language-agnostic tree with roles and normalized imports
    #[default]
    Semantic,
    /// Native tree annotated with roles
    Annotated,
    /// Native tree as produced by the grammar
    Native,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Semantic => "semantic",
            Mode::Annotated => "annotated",
            Mode::Native => "native",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(Mode::Semantic),
            "annotated" => Ok(Mode::Annotated),
            "native" => Ok(Mode::Native),
            other => Err(UastError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    pub content: &'a [u8],
    /// Lower-case language name, possibly empty
    pub language: &'a str,
    pub mode: Mode,
}

/// A source of parsed trees, local or remote.
///
/// Implementations must be callable from many threads at once and should
/// stop early once `cancel` fires.
pub trait TreeParser: Send + Sync {
    fn parse(&self, request: &ParseRequest<'_>, cancel: &CancellationToken) -> Result<Node, ParseError>;
}

pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod functions;
pub mod languages;
pub mod parser;
pub mod resolver;
pub mod uast;
pub mod walker;
pub mod xpath;

use once_cell::sync::Lazy;

pub use config::Config;
pub use detect::LanguageDetector;
pub use error::{ParseError, Result, UastError};
pub use functions::{Datum, Function, FunctionRegistry, UastContext};
pub use languages::LanguageRegistry;
pub use parser::{Mode, ParseRequest, TreeParser, TreeSitterParser};
pub use resolver::{EvalContext, ResolverStats, TreeResolver};
pub use uast::{Node, Object, Scalar};
pub use walker::FileWalker;
pub use xpath::{PathQuery, QueryEvaluator};

/// Global language registry instance (lazily initialized)
pub static REGISTRY: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::new);

//! Callable functions over blobs and serialized trees.
//!
//! Every function maps missing information to [`Datum::Null`]: null input,
//! empty or oversized content, content without usable syntax, no match.
//! Errors are reserved for bad arguments and hard parser failures.

mod extract;
mod language;
mod uast;

pub use extract::{UastChildren, UastExtract, UastImports};
pub use language::Language;
pub use uast::{Uast, UastMode, UastXPath};

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::config::Config;
use crate::detect::LanguageDetector;
use crate::error::{catch_fatal, Result, UastError};
use crate::parser::{TreeParser, TreeSitterParser};
use crate::resolver::{EvalContext, TreeResolver};
use crate::uast::{decode_nodes, ImportCollector, Node, UastImports as ImportWalker};
use crate::xpath::{PathQuery, QueryEvaluator};

/// Argument or result value of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Blob(Vec<u8>),
    Text(String),
    Array(Vec<Datum>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Datum::Blob(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Datum]> {
        match self {
            Datum::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Array of strings, or `Null` when there are none.
    pub fn text_array(values: Vec<String>) -> Self {
        if values.is_empty() {
            Datum::Null
        } else {
            Datum::Array(values.into_iter().map(Datum::Text).collect())
        }
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(b: Vec<u8>) -> Self {
        Datum::Blob(b)
    }
}

/// Collaborators shared by every function call: the cached resolver, the
/// language detector and the pluggable query and import routines.
pub struct UastContext {
    config: Config,
    resolver: TreeResolver,
    detector: LanguageDetector,
    evaluator: Arc<dyn QueryEvaluator>,
    imports: Arc<dyn ImportCollector>,
}

impl UastContext {
    pub fn new(parser: Arc<dyn TreeParser>, config: Config) -> Self {
        Self {
            resolver: TreeResolver::new(parser, &config),
            detector: LanguageDetector::new(config.language_cache_size),
            evaluator: Arc::new(PathQuery),
            imports: Arc::new(ImportWalker),
            config,
        }
    }

    /// Context backed by the in-process tree-sitter grammars.
    pub fn with_tree_sitter(config: Config) -> Self {
        Self::new(Arc::new(TreeSitterParser::default()), config)
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn QueryEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_import_collector(mut self, imports: Arc<dyn ImportCollector>) -> Self {
        self.imports = imports;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &TreeResolver {
        &self.resolver
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    pub fn evaluator(&self) -> &dyn QueryEvaluator {
        self.evaluator.as_ref()
    }

    pub fn import_collector(&self) -> &dyn ImportCollector {
        self.imports.as_ref()
    }
}

pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    /// Accepted argument counts
    fn arity(&self) -> RangeInclusive<usize>;

    fn eval(&self, uast: &UastContext, ctx: &EvalContext, args: &[Datum]) -> Result<Datum>;
}

pub struct FunctionRegistry {
    functions: HashMap<&'static str, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register(Arc::new(Uast));
        registry.register(Arc::new(UastMode));
        registry.register(Arc::new(UastXPath));
        registry.register(Arc::new(UastExtract));
        registry.register(Arc::new(UastChildren));
        registry.register(Arc::new(UastImports));
        registry.register(Arc::new(Language));

        registry
    }

    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.functions.insert(function.name(), function);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Calls `name` with `args`. A panic inside the function is reported as
    /// `UastError::Internal`.
    pub fn call(&self, name: &str, uast: &UastContext, ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| UastError::UnknownFunction(name.to_string()))?;

        let arity = function.arity();
        if !arity.contains(&args.len()) {
            let expected = if arity.start() == arity.end() {
                arity.start().to_string()
            } else {
                format!("{} to {}", arity.start(), arity.end())
            };
            return Err(invalid_argument(
                function.name(),
                format!("expected {} arguments, got {}", expected, args.len()),
            ));
        }

        let span = tracing::debug_span!("uast_function", function = function.name());
        let _enter = span.enter();
        catch_fatal(function.name(), || function.eval(uast, ctx, args))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_argument(function: &str, message: impl Into<String>) -> UastError {
    UastError::InvalidArgument {
        function: function.to_string(),
        message: message.into(),
    }
}

/// Bytes of argument `index`. Text is accepted as its UTF-8 bytes.
fn blob_arg<'a>(function: &str, args: &'a [Datum], index: usize) -> Result<Option<&'a [u8]>> {
    match args.get(index) {
        None | Some(Datum::Null) => Ok(None),
        Some(Datum::Blob(b)) => Ok(Some(b)),
        Some(Datum::Text(s)) => Ok(Some(s.as_bytes())),
        Some(Datum::Array(_)) => Err(invalid_argument(
            function,
            format!("argument {} must be a blob, found an array", index + 1),
        )),
    }
}

fn text_arg(function: &str, args: &[Datum], index: usize) -> Result<Option<String>> {
    match args.get(index) {
        None | Some(Datum::Null) => Ok(None),
        Some(Datum::Text(s)) => Ok(Some(s.clone())),
        Some(Datum::Blob(b)) => String::from_utf8(b.clone()).map(Some).map_err(|_| {
            invalid_argument(function, format!("argument {} is not valid UTF-8", index + 1))
        }),
        Some(Datum::Array(_)) => Err(invalid_argument(
            function,
            format!("argument {} must be text, found an array", index + 1),
        )),
    }
}

/// Decodes a serialized node array.
fn nodes_arg(function: &str, args: &[Datum], index: usize) -> Result<Option<Vec<Node>>> {
    match blob_arg(function, args, index)? {
        Some(blob) => Ok(Some(decode_nodes(blob)?)),
        None => Ok(None),
    }
}

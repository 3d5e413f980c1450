//! Integration tests for cached resolution through the function registry.
//!
//! A counting stub stands in for the parser so every test can tell whether
//! a call reached it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use uast_query::uast::{decode_nodes, KEY_ROLES, KEY_TOKEN};
use uast_query::{
    Config, Datum, EvalContext, FunctionRegistry, Mode, Node, Object, ParseError, ParseRequest,
    TreeParser, UastContext, UastError,
};

/// Builds `File > Identifier` trees and records every call.
#[derive(Default)]
struct CountingParser {
    calls: AtomicUsize,
}

impl CountingParser {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TreeParser for CountingParser {
    fn parse(&self, request: &ParseRequest<'_>, cancel: &CancellationToken) -> Result<Node, ParseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }

        let text = std::str::from_utf8(request.content).map_err(|e| ParseError::Internal(e.to_string()))?;
        match text {
            "}{" => return Err(ParseError::Syntax("1:1: unexpected }".into())),
            "binary" => return Err(ParseError::NoSyntax(request.language.to_string())),
            "unreachable" => return Err(ParseError::Transport("parser unreachable".into())),
            _ => {}
        }

        let mut ident = Object::with_type("Identifier");
        ident.insert(KEY_TOKEN, Node::string(text));
        ident.insert(
            KEY_ROLES,
            Node::Array(vec![Node::string("Expression"), Node::string("Identifier")]),
        );

        let mut file = Object::with_type("File");
        file.insert("Mode", Node::string(request.mode.as_str()));
        file.insert("body", Node::Array(vec![ident.into()]));
        file.insert("doc", Node::string("x"));
        Ok(file.into())
    }
}

fn setup(config: Config) -> (Arc<CountingParser>, UastContext, FunctionRegistry) {
    let parser = Arc::new(CountingParser::default());
    let uast = UastContext::new(parser.clone(), config);
    (parser, uast, FunctionRegistry::new())
}

fn call(functions: &FunctionRegistry, uast: &UastContext, name: &str, args: &[Datum]) -> Datum {
    functions
        .call(name, uast, &EvalContext::new(), args)
        .unwrap_or_else(|e| panic!("{} failed: {}", name, e))
}

// ============================================================================
// Caching
// ============================================================================

mod caching {
    use super::*;

    #[test]
    fn test_repeated_resolution_hits_cache() {
        let (parser, uast, functions) = setup(Config::default());

        let first = call(&functions, &uast, "uast", &["x".into(), "go".into()]);
        let second = call(&functions, &uast, "uast", &["x".into(), "GO".into()]);

        assert_eq!(first, second);
        assert_eq!(parser.calls(), 1);
        assert_eq!(uast.resolver().stats().hits, 1);
    }

    #[test]
    fn test_xpath_variants_share_one_parse() {
        let (parser, uast, functions) = setup(Config::default());

        call(&functions, &uast, "uast", &["x".into(), "go".into()]);
        call(&functions, &uast, "uast", &["x".into(), "go".into(), "//Identifier".into()]);
        call(&functions, &uast, "uast", &["x".into(), "go".into(), "//File".into()]);

        assert_eq!(parser.calls(), 1);
    }

    #[test]
    fn test_modes_are_cached_separately() {
        let (parser, uast, functions) = setup(Config::default());

        call(&functions, &uast, "uast", &["x".into(), "go".into()]);
        let native = call(&functions, &uast, "uast_mode", &["native".into(), "x".into(), "go".into()]);
        call(&functions, &uast, "uast_mode", &["semantic".into(), "x".into(), "go".into()]);

        assert_eq!(parser.calls(), 2);
        let nodes = decode_nodes(native.as_blob().unwrap()).unwrap();
        assert_eq!(
            nodes[0].as_object().unwrap().get("Mode"),
            Some(&Node::string(Mode::Native.as_str()))
        );
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let config = Config {
            cache_size: 1,
            ..Config::default()
        };
        let (parser, uast, functions) = setup(config);

        call(&functions, &uast, "uast", &["a".into(), "go".into()]);
        call(&functions, &uast, "uast", &["b".into(), "go".into()]);
        call(&functions, &uast, "uast", &["a".into(), "go".into()]);

        assert_eq!(parser.calls(), 3);
        assert_eq!(uast.resolver().stats().cached, 1);
    }
}

// ============================================================================
// Null results and failures
// ============================================================================

mod failures {
    use super::*;

    #[test]
    fn test_oversized_blob_never_reaches_parser() {
        let config = Config {
            max_blob_size: 8,
            ..Config::default()
        };
        let (parser, uast, functions) = setup(config);
        let ctx = EvalContext::new();

        let out = functions
            .call("uast", &uast, &ctx, &["0123456789".into(), "go".into()])
            .unwrap();

        assert_eq!(out, Datum::Null);
        assert_eq!(parser.calls(), 0);
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn test_syntax_errors_are_not_cached() {
        let (parser, uast, functions) = setup(Config::default());

        assert_eq!(call(&functions, &uast, "uast", &["}{".into(), "go".into()]), Datum::Null);
        assert_eq!(call(&functions, &uast, "uast", &["}{".into(), "go".into()]), Datum::Null);
        assert_eq!(call(&functions, &uast, "uast", &["binary".into(), "go".into()]), Datum::Null);

        assert_eq!(parser.calls(), 3);
        assert_eq!(uast.resolver().stats().soft_failures, 3);
    }

    #[test]
    fn test_transport_errors_propagate() {
        let (_parser, uast, functions) = setup(Config::default());
        let err = functions
            .call("uast", &uast, &EvalContext::new(), &["unreachable".into(), "go".into()])
            .unwrap_err();
        assert!(matches!(err, UastError::Parse(ParseError::Transport(_))));
    }

    #[test]
    fn test_cancelled_context() {
        let (_parser, uast, functions) = setup(Config::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = functions
            .call("uast", &uast, &EvalContext::with_cancel(cancel), &["x".into(), "go".into()])
            .unwrap_err();
        assert!(matches!(err, UastError::Parse(ParseError::Cancelled)));
    }

    #[test]
    fn test_null_inputs() {
        let (parser, uast, functions) = setup(Config::default());

        assert_eq!(call(&functions, &uast, "uast", &[Datum::Null]), Datum::Null);
        assert_eq!(call(&functions, &uast, "uast", &["".into(), "go".into()]), Datum::Null);
        assert_eq!(call(&functions, &uast, "uast_children", &[Datum::Null]), Datum::Null);
        assert_eq!(call(&functions, &uast, "uast_imports", &[Datum::Null]), Datum::Null);
        assert_eq!(
            call(&functions, &uast, "uast_extract", &[Datum::Null, "token".into()]),
            Datum::Null
        );
        assert_eq!(parser.calls(), 0);
    }
}

// ============================================================================
// Extraction over resolved trees
// ============================================================================

mod extraction {
    use super::*;

    #[test]
    fn test_extract_common_properties() {
        let (_parser, uast, functions) = setup(Config::default());
        let ident = call(&functions, &uast, "uast", &["x".into(), "go".into(), "//Identifier".into()]);

        let texts = |values: &[&str]| Datum::Array(values.iter().map(|v| Datum::from(*v)).collect());
        assert_eq!(call(&functions, &uast, "uast_extract", &[ident.clone(), "type".into()]), texts(&["Identifier"]));
        assert_eq!(call(&functions, &uast, "uast_extract", &[ident.clone(), "token".into()]), texts(&["x"]));
        assert_eq!(
            call(&functions, &uast, "uast_extract", &[ident.clone(), "roles".into()]),
            texts(&["Expression", "Identifier"])
        );
        assert_eq!(call(&functions, &uast, "uast_extract", &[ident, "Name".into()]), Datum::Null);
    }

    #[test]
    fn test_children_skip_scalars() {
        let (_parser, uast, functions) = setup(Config::default());
        let root = call(&functions, &uast, "uast", &["x".into(), "go".into()]);

        let children = call(&functions, &uast, "uast_children", &[root]);
        let nodes = decode_nodes(children.as_blob().unwrap()).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].as_object().unwrap().type_of(), Some("Identifier"));
    }

    #[test]
    fn test_xpath_then_extract() {
        let (_parser, uast, functions) = setup(Config::default());
        let root = call(&functions, &uast, "uast", &["main".into(), "go".into()]);

        let idents = call(&functions, &uast, "uast_xpath", &[root, "//Identifier[@role='Expression']".into()]);
        assert_eq!(
            call(&functions, &uast, "uast_extract", &[idents, "@token".into()]),
            Datum::Array(vec![Datum::from("main")])
        );
    }
}

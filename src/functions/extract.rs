use std::ops::RangeInclusive;

use super::uast::encode_non_empty;
use super::{nodes_arg, text_arg, Datum, Function, UastContext};
use crate::error::Result;
use crate::extract::{collect_imports, extract_properties, flatten_children};
use crate::resolver::EvalContext;

/// `uast_extract(nodes, key)`: values of `key` across all nodes.
pub struct UastExtract;

impl Function for UastExtract {
    fn name(&self) -> &'static str {
        "uast_extract"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        2..=2
    }

    fn eval(&self, _uast: &UastContext, _ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let Some(nodes) = nodes_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };
        let key = text_arg(self.name(), args, 1)?.unwrap_or_default();
        if key.is_empty() {
            return Ok(Datum::Null);
        }

        let extracted = nodes
            .iter()
            .flat_map(|node| extract_properties(node, &key))
            .collect();
        Ok(Datum::text_array(extracted))
    }
}

/// `uast_children(nodes)`: direct child objects of every node.
pub struct UastChildren;

impl Function for UastChildren {
    fn name(&self) -> &'static str {
        "uast_children"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn eval(&self, _uast: &UastContext, _ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        match nodes_arg(self.name(), args, 0)? {
            Some(nodes) => encode_non_empty(&flatten_children(&nodes)),
            None => Ok(Datum::Null),
        }
    }
}

/// `uast_imports(nodes)`: import paths per node, aligned with the input.
pub struct UastImports;

impl Function for UastImports {
    fn name(&self) -> &'static str {
        "uast_imports"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn eval(&self, uast: &UastContext, _ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let Some(nodes) = nodes_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };
        if nodes.is_empty() {
            return Ok(Datum::Null);
        }

        let per_node = collect_imports(&nodes, uast.import_collector())
            .into_iter()
            .map(|paths| Datum::Array(paths.into_iter().map(Datum::Text).collect()))
            .collect();
        Ok(Datum::Array(per_node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{ParseError, UastError};
    use crate::parser::{ParseRequest, TreeParser};
    use crate::uast::imports::{TYPE_IMPORT, TYPE_STRING};
    use crate::uast::{decode_nodes, encode_nodes, Node, Object, KEY_ROLES, KEY_TOKEN};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct NoParser;

    impl TreeParser for NoParser {
        fn parse(&self, _request: &ParseRequest<'_>, _cancel: &CancellationToken) -> std::result::Result<Node, ParseError> {
            Err(ParseError::NoSyntax("no parser".into()))
        }
    }

    fn context() -> UastContext {
        UastContext::new(Arc::new(NoParser), Config::default())
    }

    fn identifier(token: &str) -> Node {
        let mut obj = Object::with_type("Identifier");
        obj.insert(KEY_TOKEN, Node::string(token));
        obj.insert(
            KEY_ROLES,
            Node::Array(vec![Node::string("Expression"), Node::string("Identifier")]),
        );
        obj.into()
    }

    fn import(path: &str) -> Node {
        let mut value = Object::with_type(TYPE_STRING);
        value.insert("Value", Node::string(path));
        let mut obj = Object::with_type(TYPE_IMPORT);
        obj.insert("Path", value.into());
        obj.into()
    }

    fn blob(nodes: &[Node]) -> Datum {
        Datum::Blob(encode_nodes(nodes).unwrap())
    }

    fn texts(values: &[&str]) -> Datum {
        Datum::Array(values.iter().map(|v| Datum::from(*v)).collect())
    }

    #[test]
    fn test_extract_across_nodes() {
        let uast = context();
        let ctx = EvalContext::new();
        let nodes = blob(&[identifier("x"), identifier("y")]);

        assert_eq!(
            UastExtract.eval(&uast, &ctx, &[nodes.clone(), "token".into()]).unwrap(),
            texts(&["x", "y"])
        );
        assert_eq!(
            UastExtract.eval(&uast, &ctx, &[nodes.clone(), "@type".into()]).unwrap(),
            texts(&["Identifier", "Identifier"])
        );
        assert_eq!(
            UastExtract.eval(&uast, &ctx, &[nodes.clone(), "Missing".into()]).unwrap(),
            Datum::Null
        );
        assert_eq!(
            UastExtract.eval(&uast, &ctx, &[nodes.clone(), "".into()]).unwrap(),
            Datum::Null
        );
        assert_eq!(UastExtract.eval(&uast, &ctx, &[nodes, Datum::Null]).unwrap(), Datum::Null);
        assert_eq!(
            UastExtract.eval(&uast, &ctx, &[Datum::Null, "token".into()]).unwrap(),
            Datum::Null
        );
    }

    #[test]
    fn test_extract_rejects_undecodable_blob() {
        let err = UastExtract
            .eval(&context(), &EvalContext::new(), &[Datum::Blob(b"{".to_vec()), "token".into()])
            .unwrap_err();
        assert!(matches!(err, UastError::Codec(_)));
    }

    #[test]
    fn test_children() {
        let uast = context();
        let ctx = EvalContext::new();

        let mut file = Object::with_type("File");
        file.insert("body", Node::Array(vec![identifier("a"), Node::string("x"), identifier("b")]));
        file.insert("doc", Node::string("x"));

        let out = UastChildren.eval(&uast, &ctx, &[blob(&[file.into()])]).unwrap();
        let children = decode_nodes(out.as_blob().unwrap()).unwrap();
        assert_eq!(children, vec![identifier("a"), identifier("b")]);

        assert_eq!(
            UastChildren.eval(&uast, &ctx, &[blob(&[identifier("leaf")])]).unwrap(),
            Datum::Null
        );
        assert_eq!(UastChildren.eval(&uast, &ctx, &[Datum::Null]).unwrap(), Datum::Null);
    }

    #[test]
    fn test_imports_aligned_with_input() {
        let uast = context();
        let ctx = EvalContext::new();

        let mut file = Object::with_type("File");
        file.insert("Imports", Node::Array(vec![import("fmt"), import("os"), import("fmt")]));

        let out = UastImports
            .eval(&uast, &ctx, &[blob(&[file.into(), identifier("x"), import("io")])])
            .unwrap();
        assert_eq!(
            out,
            Datum::Array(vec![texts(&["fmt", "os"]), Datum::Array(vec![]), texts(&["io"])])
        );

        assert_eq!(UastImports.eval(&uast, &ctx, &[blob(&[])]).unwrap(), Datum::Null);
        assert_eq!(UastImports.eval(&uast, &ctx, &[Datum::Null]).unwrap(), Datum::Null);
    }
}

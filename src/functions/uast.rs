use std::ops::RangeInclusive;

use super::{blob_arg, nodes_arg, text_arg, Datum, Function, UastContext};
use crate::error::Result;
use crate::extract::filter;
use crate::parser::Mode;
use crate::resolver::EvalContext;
use crate::uast::{encode_nodes, Node};

/// `uast(blob[, lang[, xpath]])`: semantic tree of `blob`, optionally
/// filtered by `xpath`.
///
/// Without `lang` the parser gets an empty language and has to recognize the
/// content itself. [`TreeSitterParser`](crate::parser::TreeSitterParser)
/// does not, so with it a missing language yields null; callers pass the
/// result of `language(path, blob)` instead, as the CLI does.
pub struct Uast;

impl Function for Uast {
    fn name(&self) -> &'static str {
        "uast"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=3
    }

    fn eval(&self, uast: &UastContext, ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let Some(blob) = blob_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };
        let language = text_arg(self.name(), args, 1)?.unwrap_or_default();
        let xpath = text_arg(self.name(), args, 2)?.unwrap_or_default();
        resolve_and_filter(uast, ctx, Mode::Semantic, blob, &language, &xpath)
    }
}

/// `uast_mode(mode, blob, lang)`: tree of `blob` in the given mode.
pub struct UastMode;

impl Function for UastMode {
    fn name(&self) -> &'static str {
        "uast_mode"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        3..=3
    }

    fn eval(&self, uast: &UastContext, ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let Some(mode) = text_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };
        let mode: Mode = mode.parse()?;

        let Some(blob) = blob_arg(self.name(), args, 1)? else {
            return Ok(Datum::Null);
        };
        let language = text_arg(self.name(), args, 2)?.unwrap_or_default();
        resolve_and_filter(uast, ctx, mode, blob, &language, "")
    }
}

fn resolve_and_filter(
    uast: &UastContext,
    ctx: &EvalContext,
    mode: Mode,
    blob: &[u8],
    language: &str,
    xpath: &str,
) -> Result<Datum> {
    let language = language.to_lowercase();
    let Some(tree) = uast.resolver().resolve(blob, &language, mode, ctx)? else {
        return Ok(Datum::Null);
    };

    match filter(&tree, xpath, uast.evaluator()) {
        Some(nodes) => encode_non_empty(&nodes),
        None => Ok(Datum::Null),
    }
}

pub(super) fn encode_non_empty(nodes: &[Node]) -> Result<Datum> {
    if nodes.is_empty() {
        Ok(Datum::Null)
    } else {
        Ok(Datum::Blob(encode_nodes(nodes)?))
    }
}

/// `uast_xpath(nodes, xpath)`: nodes matching `xpath` under any input node.
pub struct UastXPath;

impl Function for UastXPath {
    fn name(&self) -> &'static str {
        "uast_xpath"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        2..=2
    }

    fn eval(&self, uast: &UastContext, _ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let xpath = text_arg(self.name(), args, 1)?.unwrap_or_default();
        if xpath.is_empty() {
            return Ok(Datum::Null);
        }
        let Some(nodes) = nodes_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };

        let mut filtered = Vec::new();
        for node in &nodes {
            match filter(node, &xpath, uast.evaluator()) {
                Some(found) => filtered.extend(found),
                None => return Ok(Datum::Null),
            }
        }
        encode_non_empty(&filtered)
    }
}

use std::ops::RangeInclusive;

use super::{blob_arg, text_arg, Datum, Function, UastContext};
use crate::error::Result;
use crate::resolver::EvalContext;

/// `language(path, blob)`: language of a file, or null when unknown.
pub struct Language;

impl Function for Language {
    fn name(&self) -> &'static str {
        "language"
    }

    fn arity(&self) -> RangeInclusive<usize> {
        2..=2
    }

    fn eval(&self, uast: &UastContext, _ctx: &EvalContext, args: &[Datum]) -> Result<Datum> {
        let Some(path) = text_arg(self.name(), args, 0)? else {
            return Ok(Datum::Null);
        };
        let content = blob_arg(self.name(), args, 1)?.unwrap_or_default();

        Ok(uast
            .detector()
            .detect(&path, content)
            .map_or(Datum::Null, Datum::Text))
    }
}

use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct GoGrammar;

static GO_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for GoGrammar {
    fn name(&self) -> &'static str {
        "go"
    }

    fn aliases(&self) -> &[&'static str] {
        &["golang"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_spec
            path: (_) @import_path
        ) @import
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        GO_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

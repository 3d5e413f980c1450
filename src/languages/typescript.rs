use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

const IMPORTS_QUERY: &str = r#"
        (import_statement
            source: (string) @source
        ) @import

        (export_statement
            source: (string) @export_source
        ) @export
        "#;

pub struct TypeScriptGrammar;

static TYPESCRIPT_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn aliases(&self) -> &[&'static str] {
        &["ts"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts", "mts", "cts"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn imports_query(&self) -> &str {
        IMPORTS_QUERY
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        TYPESCRIPT_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

/// TypeScript with JSX. Also the grammar for plain JavaScript, since JSX
/// elements are common there and the TSX grammar accepts both.
pub struct TsxGrammar;

static TSX_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for TsxGrammar {
    fn name(&self) -> &'static str {
        "tsx"
    }

    fn aliases(&self) -> &[&'static str] {
        &["javascript", "js", "jsx"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["tsx", "js", "jsx", "mjs", "cjs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    }

    fn imports_query(&self) -> &str {
        IMPORTS_QUERY
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        TSX_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct KotlinGrammar;

static KOTLIN_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for KotlinGrammar {
    fn name(&self) -> &'static str {
        "kotlin"
    }

    fn aliases(&self) -> &[&'static str] {
        &["kt", "kts"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["kt", "kts"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_kotlin_ng::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (import
            (identifier) @import_path
        ) @import

        (import
            (qualified_identifier) @import_path
        ) @import
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        KOTLIN_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

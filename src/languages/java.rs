use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct JavaGrammar;

static JAVA_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for JavaGrammar {
    fn name(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_declaration
            (scoped_identifier) @import_path
        ) @import

        (import_declaration
            (identifier) @import_path
        ) @import
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        JAVA_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

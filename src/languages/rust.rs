use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct RustGrammar;

static RUST_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for RustGrammar {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn aliases(&self) -> &[&'static str] {
        &["rs"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (use_declaration
            argument: (_) @import_path
        ) @import

        (extern_crate_declaration
            name: (identifier) @crate_name
        ) @extern_crate
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        RUST_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

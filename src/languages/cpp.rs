use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct CppGrammar;

static CPP_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for CppGrammar {
    fn name(&self) -> &'static str {
        "cpp"
    }

    fn aliases(&self) -> &[&'static str] {
        &["c++", "c"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["cpp", "cc", "cxx", "hpp", "h", "hxx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (preproc_include
            path: (_) @import_path
        ) @include

        (using_declaration
            (qualified_identifier) @import_path
        ) @using
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        CPP_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

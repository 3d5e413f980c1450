use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct PythonGrammar;

static PYTHON_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for PythonGrammar {
    fn name(&self) -> &'static str {
        "python"
    }

    fn aliases(&self) -> &[&'static str] {
        &["py", "python3"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (import_statement
            name: (dotted_name) @import_path
        ) @import

        (import_statement
            name: (aliased_import
                name: (dotted_name) @import_path
            )
        ) @import

        (import_from_statement
            module_name: (_) @module
        ) @from_import
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        PYTHON_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

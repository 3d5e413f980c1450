use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct CSharpGrammar;

static CSHARP_IMPORTS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for CSharpGrammar {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn aliases(&self) -> &[&'static str] {
        &["c#", "cs"]
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["cs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }

    fn imports_query(&self) -> &str {
        r#"
        (using_directive
            (identifier) @import_path
        ) @import

        (using_directive
            (qualified_name) @import_path
        ) @qualified_import
        "#
    }

    fn cached_imports_query(&self) -> Option<&'static Query> {
        CSHARP_IMPORTS_QUERY.get_or_try_init(|| {
            Query::new(&self.language(), self.imports_query())
        }).ok()
    }
}

pub mod cpp;
pub mod csharp;
pub mod go;
pub mod java;
pub mod kotlin;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Query;

pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;

    /// Other names callers use for this language
    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;

    /// Query capturing import declarations. The path is captured as
    /// `import_path`, `source`, `export_source`, `crate_name` or `module`.
    fn imports_query(&self) -> &str;

    /// Get cached imports query (compiled once)
    fn cached_imports_query(&self) -> Option<&'static Query> {
        None
    }
}

pub struct LanguageRegistry {
    languages: HashMap<String, Arc<dyn LanguageGrammar>>,
    alias_map: HashMap<String, String>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            alias_map: HashMap::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(rust::RustGrammar));
        registry.register(Arc::new(java::JavaGrammar));
        registry.register(Arc::new(kotlin::KotlinGrammar));
        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(typescript::TsxGrammar));
        registry.register(Arc::new(python::PythonGrammar));
        registry.register(Arc::new(go::GoGrammar));
        registry.register(Arc::new(csharp::CSharpGrammar));
        registry.register(Arc::new(cpp::CppGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let name = grammar.name().to_string();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_string(), name.clone());
        }
        for alias in grammar.aliases() {
            self.alias_map.insert(alias.to_string(), name.clone());
        }
        self.languages.insert(name, grammar);
    }

    /// Looks up a grammar by name or alias, ignoring case.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        let name = name.trim().to_ascii_lowercase();
        let canonical = self.alias_map.get(&name).unwrap_or(&name);
        self.languages.get(canonical).cloned()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(ext)
            .and_then(|name| self.languages.get(name))
            .cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

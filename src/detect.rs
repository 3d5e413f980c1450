//! Language detection with a result cache keyed by path and content.

use std::path::Path;

use once_cell::sync::OnceCell;

use crate::cache::LruStore;
use crate::fingerprint::path_fingerprint;
use crate::REGISTRY;

pub struct LanguageDetector {
    cache: OnceCell<LruStore<Option<String>>>,
    cache_size: usize,
}

impl LanguageDetector {
    pub fn new(cache_size: usize) -> Self {
        Self {
            cache: OnceCell::new(),
            cache_size,
        }
    }

    /// Language of the file at `path`, or `None` when either input is empty
    /// or the file type is not recognized.
    pub fn detect(&self, path: &str, content: &[u8]) -> Option<String> {
        if path.is_empty() || content.is_empty() {
            return None;
        }

        let cache = self.cache.get_or_init(|| LruStore::new(self.cache_size));
        let key = path_fingerprint(path, content);
        if let Some(language) = cache.get(key) {
            return language;
        }

        let language = REGISTRY
            .get_for_file(Path::new(path))
            .map(|grammar| grammar.name().to_string());
        cache.put(key, language.clone());
        language
    }

    pub fn cached(&self) -> usize {
        self.cache.get().map_or(0, LruStore::len)
    }
}

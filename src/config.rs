//! Process-level options read from the environment.

pub const CACHE_SIZE_KEY: &str = "UAST_CACHE_SIZE";
pub const DEFAULT_CACHE_SIZE: usize = 10_000;

pub const MAX_BLOB_SIZE_KEY: &str = "UAST_MAX_BLOB_SIZE";
pub const DEFAULT_MAX_BLOB_SIZE: i64 = 5 * 1024 * 1024;

pub const LANGUAGE_CACHE_SIZE_KEY: &str = "UAST_LANGUAGE_CACHE_SIZE";
pub const DEFAULT_LANGUAGE_CACHE_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the parsed tree cache
    pub cache_size: usize,
    /// Largest blob sent to the parser, negative disables the check
    pub max_blob_size: i64,
    /// Capacity of the language detection cache
    pub language_cache_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            cache_size: parse_cache_size(std::env::var(CACHE_SIZE_KEY).ok().as_deref(), DEFAULT_CACHE_SIZE),
            max_blob_size: parse_max_blob_size(std::env::var(MAX_BLOB_SIZE_KEY).ok().as_deref()),
            language_cache_size: parse_cache_size(
                std::env::var(LANGUAGE_CACHE_SIZE_KEY).ok().as_deref(),
                DEFAULT_LANGUAGE_CACHE_SIZE,
            ),
        }
    }

    /// Applies command line overrides. A zero cache size is ignored, the same
    /// as a non-positive environment value.
    pub fn with_overrides(mut self, cache_size: Option<usize>, max_blob_size: Option<i64>) -> Self {
        if let Some(size) = cache_size.filter(|&size| size > 0) {
            self.cache_size = size;
        }
        if let Some(max) = max_blob_size {
            self.max_blob_size = max;
        }
        self
    }

    /// Returns the blob ceiling, or `None` when the check is disabled.
    pub fn blob_limit(&self) -> Option<usize> {
        usize::try_from(self.max_blob_size).ok()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            language_cache_size: DEFAULT_LANGUAGE_CACHE_SIZE,
        }
    }
}

/// Non-positive or unparsable sizes fall back to `default`.
pub fn parse_cache_size(raw: Option<&str>, default: usize) -> usize {
    match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(size)) if size > 0 => usize::try_from(size).unwrap_or(default),
        _ => default,
    }
}

pub fn parse_max_blob_size(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_MAX_BLOB_SIZE)
}

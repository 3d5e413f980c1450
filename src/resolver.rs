//! Parse requests served from a bounded tree cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cache::LruStore;
use crate::config::{Config, MAX_BLOB_SIZE_KEY};
use crate::error::{catch_fatal, Result};
use crate::fingerprint::fingerprint;
use crate::error::ParseError;
use crate::parser::{Mode, ParseRequest, TreeParser};
use crate::uast::{Node, MAX_DEPTH};

/// Per-evaluation state handed down from the caller.
#[derive(Debug, Default)]
pub struct EvalContext {
    cancel: CancellationToken,
    warnings: Mutex<Vec<String>>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Records a warning meant for whoever issued the query.
    pub fn warn(&self, message: impl Into<String>) {
        self.warnings.lock().push(message.into());
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    soft_failures: AtomicU64,
    oversized: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub hits: u64,
    pub misses: u64,
    pub soft_failures: u64,
    pub oversized: u64,
    pub cached: usize,
    pub capacity: usize,
}

/// Resolves `(content, language, mode)` to a parsed tree.
///
/// The tree cache is created on first use and lives as long as the resolver.
/// Two concurrent misses on the same key both reach the parser; the later
/// write wins.
pub struct TreeResolver {
    parser: Arc<dyn TreeParser>,
    cache: OnceCell<LruStore<Arc<Node>>>,
    cache_size: usize,
    max_blob_size: Option<usize>,
    counters: Counters,
}

impl TreeResolver {
    pub fn new(parser: Arc<dyn TreeParser>, config: &Config) -> Self {
        Self {
            parser,
            cache: OnceCell::new(),
            cache_size: config.cache_size,
            max_blob_size: config.blob_limit(),
            counters: Counters::default(),
        }
    }

    fn cache(&self) -> &LruStore<Arc<Node>> {
        self.cache.get_or_init(|| {
            tracing::debug!(capacity = self.cache_size, "creating tree cache");
            LruStore::new(self.cache_size)
        })
    }

    /// Returns `Ok(None)` when no tree is available: empty or oversized
    /// content, or a parser that found no usable syntax. Soft failures are
    /// not cached.
    pub fn resolve(
        &self,
        content: &[u8],
        language: &str,
        mode: Mode,
        ctx: &EvalContext,
    ) -> Result<Option<Arc<Node>>> {
        if content.is_empty() {
            return Ok(None);
        }

        if let Some(max) = self.max_blob_size {
            if content.len() > max {
                tracing::warn!(
                    max,
                    size = content.len(),
                    "uast will be skipped, file is too big to send to the parser"
                );
                ctx.warn(format!(
                    "uast will be skipped, file is too big to send to the parser (limit is {} bytes, configured with {})",
                    max, MAX_BLOB_SIZE_KEY
                ));
                self.counters.oversized.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        }

        let language = language.trim().to_ascii_lowercase();
        let key = fingerprint(mode.as_str(), &language, content);

        if let Some(tree) = self.cache().get(key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key, language = %language, mode = %mode, "tree cache hit");
            return Ok(Some(tree));
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let request = ParseRequest {
            content,
            language: &language,
            mode,
        };
        let parsed = catch_fatal("parse", || {
            Ok(self.parser.parse(&request, ctx.cancel_token()))
        })?
        .and_then(|node| {
            if node.depth() > MAX_DEPTH {
                Err(ParseError::TooDeep(MAX_DEPTH))
            } else {
                Ok(node)
            }
        });

        match parsed {
            Ok(node) => {
                let tree = Arc::new(node);
                self.cache().put(key, Arc::clone(&tree));
                Ok(Some(tree))
            }
            Err(err) if err.is_soft() => {
                self.counters.soft_failures.fetch_add(1, Ordering::Relaxed);
                if let ParseError::TooDeep(max) = err {
                    ctx.warn(format!("uast will be skipped, tree nests deeper than {} levels", max));
                }
                tracing::debug!(language = %language, mode = %mode, "no tree for content: {}", err);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            soft_failures: self.counters.soft_failures.load(Ordering::Relaxed),
            oversized: self.counters.oversized.load(Ordering::Relaxed),
            cached: self.cache.get().map_or(0, LruStore::len),
            capacity: self.cache_size.max(1),
        }
    }
}

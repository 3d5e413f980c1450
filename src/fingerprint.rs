//! Cache keys for parse requests.
//!
//! Every part is length-prefixed before hashing so that moving bytes between
//! adjacent parts always changes the key.

use xxhash_rust::xxh3::Xxh3;

/// Key of a parse request: `(mode, language, content)`.
pub fn fingerprint(mode: &str, language: &str, content: &[u8]) -> u64 {
    hash_parts(&[mode.as_bytes(), language.as_bytes(), content])
}

/// Key of a language detection request: `(path, content)`.
pub fn path_fingerprint(path: &str, content: &[u8]) -> u64 {
    hash_parts(&[path.as_bytes(), content])
}

fn hash_parts(parts: &[&[u8]]) -> u64 {
    let mut hasher = Xxh3::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.digest()
}

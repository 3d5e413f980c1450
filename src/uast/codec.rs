//! Byte encoding of node sequences handed to and received from callers.
//!
//! The encoding is a JSON array of nodes, so a blob can be inspected without
//! this crate. Both directions hold nodes to [`MAX_DEPTH`].

use serde::{de, ser, Deserialize};

use super::{Node, MAX_DEPTH};
use crate::error::{Result, UastError};

pub fn encode_nodes(nodes: &[Node]) -> Result<Vec<u8>> {
    let depth = nodes.iter().map(Node::depth).max().unwrap_or(0);
    if depth > MAX_DEPTH {
        return Err(UastError::Codec(<serde_json::Error as ser::Error>::custom(too_deep(depth))));
    }
    Ok(serde_json::to_vec(nodes)?)
}

/// An empty blob decodes to no nodes.
pub fn decode_nodes(blob: &[u8]) -> Result<Vec<Node>> {
    if blob.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    // the outer array adds one level
    let depth = json_depth(blob).saturating_sub(1);
    if depth > MAX_DEPTH {
        return Err(UastError::Codec(<serde_json::Error as de::Error>::custom(too_deep(depth))));
    }

    let mut deserializer = serde_json::Deserializer::from_slice(blob);
    deserializer.disable_recursion_limit();
    let nodes = Vec::<Node>::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(nodes)
}

fn too_deep(depth: usize) -> String {
    format!("nodes nest {} levels deep, more than {}", depth, MAX_DEPTH)
}

/// Deepest bracket nesting of a JSON text, ignoring brackets inside strings.
fn json_depth(blob: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    let mut in_string = false;
    let mut escaped = false;

    for &b in blob {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

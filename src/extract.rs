//! Structural queries over already parsed trees.
//!
//! None of these operations fail on unexpected node shapes: a node that is
//! not an object, or a missing key, simply contributes nothing.

use crate::uast::{is_common_key, CommonKey, ImportCollector, Node, Object, Scalar};
use crate::xpath::QueryEvaluator;

/// Applies `query` to `root`. An empty query returns the root itself.
///
/// Evaluation errors are logged and resolve to `None`.
pub fn filter(root: &Node, query: &str, evaluator: &dyn QueryEvaluator) -> Option<Vec<Node>> {
    if query.is_empty() {
        return Some(vec![root.clone()]);
    }

    match evaluator.evaluate(root, query) {
        Ok(nodes) => Some(nodes),
        Err(err) => {
            tracing::error!(err = %err, "unable to filter node using xpath: {}", query);
            None
        }
    }
}

/// String values of property `key` on `node`.
pub fn extract_properties(node: &Node, key: &str) -> Vec<String> {
    let Node::Object(obj) = node else {
        return Vec::new();
    };

    match CommonKey::parse(key) {
        Some(common) => extract_common(obj, common),
        None => extract_any(obj, key),
    }
}

fn extract_common(obj: &Object, key: CommonKey) -> Vec<String> {
    match key {
        CommonKey::Type => non_empty(obj.type_of()),
        CommonKey::Token => non_empty(obj.token_of()),
        CommonKey::Roles => obj.roles_of().into_iter().map(str::to_string).collect(),
        CommonKey::Position => obj
            .positions_of()
            .and_then(|pos| serde_json::to_string(&pos).ok())
            .into_iter()
            .collect(),
    }
}

fn non_empty(value: Option<&str>) -> Vec<String> {
    value
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .into_iter()
        .collect()
}

fn extract_any(obj: &Object, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Node::Value(Scalar::Null)) | None => Vec::new(),
        Some(Node::Value(value)) => vec![value.to_string()],
        Some(Node::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Node::Value(Scalar::Null) => None,
                Node::Value(value) => Some(value.to_string()),
                Node::Object(_) | Node::Array(_) => None,
            })
            .collect(),
        Some(Node::Object(_)) => Vec::new(),
    }
}

/// Child objects of every object in `nodes`, in key order then array order.
///
/// Common keys are skipped, as are scalars and non-object array elements.
pub fn flatten_children(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .filter_map(Node::as_object)
        .flat_map(children_of)
        .cloned()
        .collect()
}

/// Borrowing form of the child enumeration used by tree navigation.
pub fn object_children(node: &Node) -> Vec<&Node> {
    match node {
        Node::Object(obj) => children_of(obj),
        Node::Array(items) => items.iter().filter(|n| n.as_object().is_some()).collect(),
        Node::Value(_) => Vec::new(),
    }
}

fn children_of(obj: &Object) -> Vec<&Node> {
    let mut children = Vec::new();
    for (key, value) in obj.iter() {
        if is_common_key(key) {
            continue;
        }
        match value {
            Node::Object(_) => children.push(value),
            Node::Array(items) => {
                children.extend(items.iter().filter(|n| matches!(n, Node::Object(_))));
            }
            Node::Value(_) => {}
        }
    }
    children
}

/// Import paths per input node, aligned with the input.
pub fn collect_imports(nodes: &[Node], collector: &dyn ImportCollector) -> Vec<Vec<String>> {
    nodes.iter().map(|n| collector.import_paths(n)).collect()
}

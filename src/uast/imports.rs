//! Import path discovery over semantic trees.

use super::{Node, Object};

pub const TYPE_IMPORT: &str = "uast:Import";
pub const TYPE_RUNTIME_IMPORT: &str = "uast:RuntimeImport";
pub const TYPE_RUNTIME_REIMPORT: &str = "uast:RuntimeReImport";
pub const TYPE_INLINE_IMPORT: &str = "uast:InlineImport";

pub const TYPE_STRING: &str = "uast:String";
pub const TYPE_IDENTIFIER: &str = "uast:Identifier";
pub const TYPE_QUALIFIED_IDENTIFIER: &str = "uast:QualifiedIdentifier";
pub const TYPE_ALIAS: &str = "uast:Alias";

/// Finds every import path in a subtree.
pub trait ImportCollector: Send + Sync {
    fn import_paths(&self, node: &Node) -> Vec<String>;
}

/// Collects the `Path` of `uast:*Import` objects in pre-order, keeping the
/// first occurrence of each path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UastImports;

impl ImportCollector for UastImports {
    fn import_paths(&self, node: &Node) -> Vec<String> {
        let mut paths = Vec::new();
        walk(node, &mut paths);
        paths
    }
}

fn walk(root: &Node, paths: &mut Vec<String>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Node::Object(obj) => {
                if is_import(obj) {
                    if let Some(path) = obj.get("Path").and_then(path_of) {
                        if !path.is_empty() && !paths.contains(&path) {
                            paths.push(path);
                        }
                    }
                }
                stack.extend(obj.iter().map(|(_, child)| child).rev());
            }
            Node::Array(items) => stack.extend(items.iter().rev()),
            Node::Value(_) => {}
        }
    }
}

fn is_import(obj: &Object) -> bool {
    matches!(
        obj.type_of(),
        Some(TYPE_IMPORT | TYPE_RUNTIME_IMPORT | TYPE_RUNTIME_REIMPORT | TYPE_INLINE_IMPORT)
    )
}

fn path_of(node: &Node) -> Option<String> {
    let obj = match node {
        Node::Value(_) => return node.as_str().map(str::to_string),
        Node::Object(obj) => obj,
        Node::Array(_) => return None,
    };

    match obj.type_of()? {
        TYPE_STRING => obj.get("Value").and_then(Node::as_str).map(str::to_string),
        TYPE_IDENTIFIER => obj.get("Name").and_then(Node::as_str).map(str::to_string),
        TYPE_QUALIFIED_IDENTIFIER => match obj.get("Names")? {
            Node::Array(names) => {
                let parts: Vec<String> = names.iter().filter_map(path_of).collect();
                Some(parts.join("."))
            }
            _ => None,
        },
        TYPE_ALIAS => obj.get("Node").and_then(path_of),
        _ => None,
    }
}

//! Path queries over UAST nodes.
//!
//! Element names are node types, attributes are the node's properties
//! (`@role`, `@token`, `@type`, or any scalar key).

pub mod parser;

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::extract::object_children;
use crate::uast::{CommonKey, Node, Object, Scalar};

pub use parser::{parse, Axis, NameTest, Path, Predicate, Step};

/// Selects the nodes of a tree matched by a query expression.
pub trait QueryEvaluator: Send + Sync {
    fn evaluate(&self, node: &Node, query: &str) -> Result<Vec<Node>>;
}

/// Built-in evaluator for the XPath subset parsed by [`parse`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PathQuery;

impl QueryEvaluator for PathQuery {
    fn evaluate(&self, node: &Node, query: &str) -> Result<Vec<Node>> {
        let path = parse(query)?;
        Ok(select(node, &path).into_iter().cloned().collect())
    }
}

/// Runs a parsed path against `root`, returning matches in document order.
pub fn select<'a>(root: &'a Node, path: &Path) -> Vec<&'a Node> {
    // `None` stands for the document above the root
    let mut context: Vec<Option<&'a Node>> = vec![None];

    for step in &path.steps {
        let mut seen = HashSet::new();
        let mut next = Vec::new();
        for ctx in context.iter().copied() {
            // candidates grouped by parent, so positions count per parent
            let groups: Vec<Vec<&'a Node>> = match (step.axis, ctx) {
                (Axis::Child, None) => vec![vec![root]],
                (Axis::Child, Some(node)) => vec![object_children(node)],
                (Axis::Descendant, None) => std::iter::once(vec![root])
                    .chain(descendants_or_self(root).into_iter().map(object_children))
                    .collect(),
                (Axis::Descendant, Some(node)) => descendants_or_self(node)
                    .into_iter()
                    .map(object_children)
                    .collect(),
            };

            for found in groups.into_iter().flat_map(|group| apply_step(step, group)) {
                if seen.insert(found as *const Node) {
                    next.push(Some(found));
                }
            }
        }
        context = next;
    }

    let mut matches: Vec<&'a Node> = context.into_iter().flatten().collect();
    if matches.len() > 1 {
        let order = document_order(root);
        matches.sort_by_key(|n| order.get(&(*n as *const Node)).copied().unwrap_or(usize::MAX));
    }
    matches
}

fn apply_step<'a>(step: &Step, candidates: Vec<&'a Node>) -> Vec<&'a Node> {
    let mut current: Vec<&'a Node> = candidates
        .into_iter()
        .filter(|n| name_matches(&step.test, n))
        .collect();

    for predicate in &step.predicates {
        current = match predicate {
            Predicate::Index(n) => current.get(n - 1).map(|n| vec![*n]).unwrap_or_default(),
            _ => current
                .into_iter()
                .filter(|n| predicate_matches(predicate, n))
                .collect(),
        };
    }
    current
}

fn name_matches(test: &NameTest, node: &Node) -> bool {
    match (test, node) {
        (NameTest::Any, Node::Object(_)) => true,
        (NameTest::Type(name), Node::Object(obj)) => obj.type_of() == Some(name.as_str()),
        _ => false,
    }
}

fn predicate_matches(predicate: &Predicate, node: &Node) -> bool {
    let Some(obj) = node.as_object() else {
        return false;
    };
    match predicate {
        Predicate::Has(attr) => !attribute_values(obj, attr).is_empty(),
        Predicate::Eq(attr, value) => attribute_values(obj, attr).iter().any(|v| v == value),
        Predicate::Ne(attr, value) => {
            let values = attribute_values(obj, attr);
            !values.is_empty() && values.iter().all(|v| v != value)
        }
        Predicate::Index(_) => true,
    }
}

fn attribute_values(obj: &Object, attr: &str) -> Vec<String> {
    match CommonKey::parse(attr).or_else(|| (attr == "role").then_some(CommonKey::Roles)) {
        Some(CommonKey::Type) => obj.type_of().map(str::to_string).into_iter().collect(),
        Some(CommonKey::Token) => obj.token_of().map(str::to_string).into_iter().collect(),
        Some(CommonKey::Roles) => obj.roles_of().into_iter().map(str::to_string).collect(),
        Some(CommonKey::Position) => Vec::new(),
        None => match obj.get(attr) {
            Some(Node::Value(Scalar::Null)) | None => Vec::new(),
            Some(Node::Value(v)) => vec![v.to_string()],
            Some(_) => Vec::new(),
        },
    }
}

fn descendants_or_self(node: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let children = object_children(current);
        stack.extend(children.into_iter().rev());
    }
    out
}

fn document_order(root: &Node) -> HashMap<*const Node, usize> {
    descendants_or_self(root)
        .into_iter()
        .enumerate()
        .map(|(i, n)| (n as *const Node, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uast::KEY_ROLES;

    fn leaf(kind: &str, token: &str, roles: &[&str]) -> Node {
        let mut obj = Object::with_type(kind);
        obj.insert(crate::uast::KEY_TOKEN, Node::string(token));
        obj.insert(
            KEY_ROLES,
            Node::Array(roles.iter().map(|r| Node::string(*r)).collect()),
        );
        obj.into()
    }

    fn tree() -> Node {
        let mut call = Object::with_type("Call");
        call.insert("Name", leaf("Identifier", "print", &["Call", "Identifier"]));
        call.push("Args", leaf("Identifier", "x", &["Argument", "Identifier"]));
        call.push("Args", leaf("Literal", "1", &["Argument", "Literal"]));

        let mut file = Object::with_type("File");
        file.insert("Name", Node::string("main.py"));
        file.push("Body", call.into());
        file.push("Body", leaf("Identifier", "y", &["Expression", "Identifier"]));
        file.into()
    }

    fn tokens(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|n| n.as_object().and_then(Object::token_of))
            .collect()
    }

    #[test]
    fn test_descendant_by_type() {
        let found = PathQuery.evaluate(&tree(), "//Identifier").unwrap();
        assert_eq!(tokens(&found), vec!["print", "x", "y"]);
    }

    #[test]
    fn test_absolute_root() {
        let found = PathQuery.evaluate(&tree(), "/File").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], tree());

        assert!(PathQuery.evaluate(&tree(), "/Call").unwrap().is_empty());
    }

    #[test]
    fn test_child_steps() {
        let found = PathQuery.evaluate(&tree(), "/File/Call/*").unwrap();
        assert_eq!(tokens(&found), vec!["print", "x", "1"]);
    }

    #[test]
    fn test_role_predicate() {
        let found = PathQuery.evaluate(&tree(), "//*[@role='Argument']").unwrap();
        assert_eq!(tokens(&found), vec!["x", "1"]);
    }

    #[test]
    fn test_token_and_position_predicates() {
        let found = PathQuery
            .evaluate(&tree(), "//Identifier[@token!='print']")
            .unwrap();
        assert_eq!(tokens(&found), vec!["x", "y"]);

        let found = PathQuery.evaluate(&tree(), "/File/*[2]").unwrap();
        assert_eq!(tokens(&found), vec!["y"]);
    }

    #[test]
    fn test_position_counts_per_parent() {
        let found = PathQuery.evaluate(&tree(), "//Identifier[1]").unwrap();
        assert_eq!(tokens(&found), vec!["print", "y"]);

        let found = PathQuery.evaluate(&tree(), "//Identifier[2]").unwrap();
        assert_eq!(tokens(&found), vec!["x"]);

        let found = PathQuery.evaluate(&tree(), "/File//*[@role='Argument'][2]").unwrap();
        assert_eq!(tokens(&found), vec!["1"]);
    }

    #[test]
    fn test_scalar_property_predicate() {
        let found = PathQuery.evaluate(&tree(), "//File[@Name='main.py']").unwrap();
        assert_eq!(found.len(), 1);
        assert!(PathQuery.evaluate(&tree(), "//File[@Name='x.py']").unwrap().is_empty());
    }

    #[test]
    fn test_nested_descendants_are_unique() {
        let found = PathQuery.evaluate(&tree(), "//*//Identifier").unwrap();
        assert_eq!(tokens(&found), vec!["print", "x", "y"]);
    }

    #[test]
    fn test_invalid_query() {
        assert!(PathQuery.evaluate(&tree(), "//[").is_err());
    }
}

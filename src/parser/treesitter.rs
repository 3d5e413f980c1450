//! In-process parser built on the tree-sitter grammars.
//!
//! Grammar fields become CamelCase keys (`return_type` -> `ReturnType`),
//! unnamed children are collected under `Children`, and leaves carry their
//! source text as `@token`.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tree_sitter::StreamingIterator;

use super::roles::roles_for_kind;
use super::{Mode, ParseRequest, TreeParser};
use crate::error::ParseError;
use crate::languages::{LanguageGrammar, LanguageRegistry};
use crate::uast::imports::{TYPE_IMPORT, TYPE_STRING};
use crate::uast::{Node, Object, Position, Positions, KEY_POS, KEY_ROLES, KEY_TOKEN, MAX_DEPTH};

pub const KEY_CHILDREN: &str = "Children";

/// Deepest syntax nesting converted. A leaf node is three levels deep and
/// every level above it adds at most two (a `Children` array and the object).
const MAX_SYNTAX_DEPTH: usize = (MAX_DEPTH - 1) / 2;

pub struct TreeSitterParser {
    registry: LanguageRegistry,
}

impl TreeSitterParser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new(LanguageRegistry::new())
    }
}

impl TreeParser for TreeSitterParser {
    fn parse(&self, request: &ParseRequest<'_>, cancel: &CancellationToken) -> Result<Node, ParseError> {
        if cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }

        let grammar = self
            .registry
            .get_by_name(request.language)
            .ok_or_else(|| ParseError::UnsupportedLanguage(request.language.to_string()))?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| ParseError::Internal(e.to_string()))?;

        let tree = parser
            .parse(request.content, None)
            .ok_or_else(|| ParseError::Internal("tree-sitter returned no tree".to_string()))?;

        if cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }

        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root)
                .map(|n| {
                    let p = n.start_position();
                    format!("{}:{}", p.row + 1, p.column + 1)
                })
                .unwrap_or_else(|| "unknown position".to_string());
            return Err(ParseError::Syntax(format!("{} source has errors at {}", grammar.name(), at)));
        }

        let imports = match request.mode {
            Mode::Semantic => import_paths(grammar.as_ref(), root, request.content),
            Mode::Annotated | Mode::Native => HashMap::new(),
        };

        let builder = TreeBuilder {
            source: request.content,
            mode: request.mode,
            imports,
        };
        builder.convert(root, 1)
    }
}

struct TreeBuilder<'a> {
    source: &'a [u8],
    mode: Mode,
    /// Import path per path node id
    imports: HashMap<usize, String>,
}

impl TreeBuilder<'_> {
    fn convert(&self, node: tree_sitter::Node<'_>, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_SYNTAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }
        if let Some(path) = self.imports.get(&node.id()) {
            return Ok(import_node(node, path));
        }

        let mut fields = Object::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                if self.keep(child) {
                    let converted = self.convert(child, depth + 1)?;
                    match cursor.field_name() {
                        Some(field) => {
                            let key = field_key(field);
                            if fields.get(&key).is_some() {
                                fields.push(&key, converted);
                            } else {
                                fields.insert(key, converted);
                            }
                        }
                        None => fields.push(KEY_CHILDREN, converted),
                    }
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }

        let mut obj = Object::with_type(node.kind());
        if fields.is_empty() {
            if let Ok(text) = node.utf8_text(self.source) {
                if !text.is_empty() {
                    obj.insert(KEY_TOKEN, Node::string(text));
                }
            }
        }
        if self.mode != Mode::Native {
            let roles = roles_for_kind(node.kind());
            if !roles.is_empty() {
                obj.insert(KEY_ROLES, Node::Array(roles.into_iter().map(Node::string).collect()));
            }
        }
        obj.insert(KEY_POS, positions(node).to_node());
        for (key, value) in fields {
            obj.insert(key, value);
        }
        Ok(obj.into())
    }

    fn keep(&self, node: tree_sitter::Node<'_>) -> bool {
        self.mode == Mode::Native || node.is_named()
    }
}

fn import_node(node: tree_sitter::Node<'_>, path: &str) -> Node {
    let mut path_node = Object::with_type(TYPE_STRING);
    path_node.insert("Value", Node::string(path));

    let mut obj = Object::with_type(TYPE_IMPORT);
    obj.insert(
        KEY_ROLES,
        Node::Array(vec![Node::string("Import"), Node::string("Pathname")]),
    );
    obj.insert(KEY_POS, positions(node).to_node());
    obj.insert("Path", path_node.into());
    obj.into()
}

fn positions(node: tree_sitter::Node<'_>) -> Positions {
    let at = |offset: usize, point: tree_sitter::Point| Position {
        offset: offset as u32,
        line: point.row as u32 + 1,
        col: point.column as u32 + 1,
    };
    Positions {
        start: Some(at(node.start_byte(), node.start_position())),
        end: Some(at(node.end_byte(), node.end_position())),
    }
}

fn field_key(field: &str) -> String {
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn first_error(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

/// Maps each import path node to its normalized path.
fn import_paths(
    grammar: &dyn LanguageGrammar,
    root: tree_sitter::Node<'_>,
    source: &[u8],
) -> HashMap<usize, String> {
    let mut paths = HashMap::new();
    let Some(query) = grammar.cached_imports_query() else {
        tracing::warn!("Invalid imports query for {}", grammar.name());
        return paths;
    };

    let mut cursor = tree_sitter::QueryCursor::new();
    let mut matches = cursor.matches(query, root, source);

    while let Some(m) = matches.next() {
        let mut path_node = None;
        for capture in m.captures {
            match query.capture_names()[capture.index as usize] {
                "module" => path_node = Some(capture.node),
                "import_path" | "source" | "export_source" | "crate_name" if path_node.is_none() => {
                    path_node = Some(capture.node)
                }
                _ => {}
            }
        }

        if let Some(node) = path_node {
            let path = node
                .utf8_text(source)
                .map(|text| text.trim().trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>')))
                .unwrap_or("");
            if !path.is_empty() {
                paths.insert(node.id(), path.to_string());
            }
        }
    }

    paths
}

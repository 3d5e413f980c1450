//! Language-agnostic syntax tree nodes.
//!
//! A tree is made of objects (ordered key/value lists), arrays and scalar
//! values. Objects reserve four common keys: `@type`, `@token`, `@role` and
//! `@pos`.

pub mod codec;
pub mod imports;

pub use codec::{decode_nodes, encode_nodes};
pub use imports::{ImportCollector, UastImports};

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

pub const KEY_TYPE: &str = "@type";
pub const KEY_TOKEN: &str = "@token";
pub const KEY_ROLES: &str = "@role";
pub const KEY_POS: &str = "@pos";

/// Deepest nesting of objects and arrays a tree may have.
///
/// Parsers, the resolver and the blob codec all hold trees to this bound, so
/// any tree handed out can be encoded, decoded and walked recursively.
pub const MAX_DEPTH: usize = 400;

pub const TYPE_POSITIONS: &str = "uast:Positions";
pub const TYPE_POSITION: &str = "uast:Position";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Object(Object),
    Array(Vec<Node>),
    Value(Scalar),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

/// One of the reserved node attributes with dedicated accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonKey {
    Type,
    Token,
    Roles,
    Position,
}

impl CommonKey {
    /// Accepts both the stored form (`@type`) and the plain alias (`type`).
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            KEY_TYPE | "type" => Some(CommonKey::Type),
            KEY_TOKEN | "token" => Some(CommonKey::Token),
            KEY_ROLES | "roles" => Some(CommonKey::Roles),
            KEY_POS | "position" => Some(CommonKey::Position),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            CommonKey::Type => KEY_TYPE,
            CommonKey::Token => KEY_TOKEN,
            CommonKey::Roles => KEY_ROLES,
            CommonKey::Position => KEY_POS,
        }
    }
}

pub fn is_common_key(key: &str) -> bool {
    CommonKey::parse(key).is_some()
}

/// Ordered mapping of keys to nodes. Keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    fields: Vec<(String, Node)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(kind: &str) -> Self {
        let mut obj = Self::new();
        obj.insert(KEY_TYPE, Node::string(kind));
        obj
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replaces an existing value in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Appends `value` to the array stored under `key`, creating it if needed.
    pub fn push(&mut self, key: &str, value: Node) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, Node::Array(items))) => items.push(value),
            Some((_, slot)) => {
                let previous = std::mem::replace(slot, Node::Array(Vec::new()));
                *slot = Node::Array(vec![previous, value]);
            }
            None => self.fields.push((key.to_string(), Node::Array(vec![value]))),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Node)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn type_of(&self) -> Option<&str> {
        self.get(KEY_TYPE).and_then(Node::as_str)
    }

    pub fn token_of(&self) -> Option<&str> {
        self.get(KEY_TOKEN).and_then(Node::as_str)
    }

    /// Role names in declaration order. Non-string entries are ignored.
    pub fn roles_of(&self) -> Vec<&str> {
        match self.get(KEY_ROLES) {
            Some(Node::Array(items)) => items.iter().filter_map(Node::as_str).collect(),
            Some(Node::Value(Scalar::String(role))) => vec![role.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn positions_of(&self) -> Option<Positions> {
        match self.get(KEY_POS) {
            Some(Node::Object(pos)) => Positions::from_object(pos),
            _ => None,
        }
    }
}

impl FromIterator<(String, Node)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut obj = Object::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

impl IntoIterator for Object {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Node {
    pub fn string(s: impl Into<String>) -> Self {
        Node::Value(Scalar::String(s.into()))
    }

    pub fn int(i: i64) -> Self {
        Node::Value(Scalar::Int(i))
    }

    pub fn null() -> Self {
        Node::Value(Scalar::Null)
    }

    /// Nesting of objects and arrays, the same as the JSON nesting of the
    /// encoded node. Scalars have depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, level)) = stack.pop() {
            match node {
                Node::Value(_) => deepest = deepest.max(level),
                Node::Array(items) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(items.iter().map(|n| (n, level + 1)));
                }
                Node::Object(obj) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(obj.iter().map(|(_, n)| (n, level + 1)));
                }
            }
        }
        deepest
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Value(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Value(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

impl From<Object> for Node {
    fn from(obj: Object) -> Self {
        Node::Object(obj)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 0-based byte offset
    pub offset: u32,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub col: u32,
}

impl Position {
    fn from_object(obj: &Object) -> Option<Self> {
        let field = |key: &str| obj.get(key).and_then(Node::as_i64).and_then(|v| u32::try_from(v).ok());
        Some(Position {
            offset: field("offset")?,
            line: field("line")?,
            col: field("col")?,
        })
    }

    fn to_node(self) -> Node {
        let mut obj = Object::with_type(TYPE_POSITION);
        obj.insert("offset", Node::int(i64::from(self.offset)));
        obj.insert("line", Node::int(i64::from(self.line)));
        obj.insert("col", Node::int(i64::from(self.col)));
        obj.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl Positions {
    fn from_object(obj: &Object) -> Option<Self> {
        let read = |key: &str| match obj.get(key) {
            Some(Node::Object(p)) => Position::from_object(p),
            _ => None,
        };
        let positions = Positions {
            start: read("start"),
            end: read("end"),
        };
        if positions.start.is_none() && positions.end.is_none() {
            None
        } else {
            Some(positions)
        }
    }

    pub fn to_node(self) -> Node {
        let mut obj = Object::with_type(TYPE_POSITIONS);
        if let Some(start) = self.start {
            obj.insert("start", start.to_node());
        }
        if let Some(end) = self.end {
            obj.insert("end", end.to_node());
        }
        obj.into()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Value(Scalar::Null) => serializer.serialize_unit(),
            Node::Value(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Node::Value(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Node::Value(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Node::Value(Scalar::String(s)) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a UAST node")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::null())
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Value(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => Node::int(i),
            Err(_) => Node::Value(Scalar::Float(v as f64)),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Value(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::string(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::string(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Node, A::Error> {
        let mut obj = Object::new();
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            obj.insert(key, value);
        }
        Ok(Node::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> Object {
        let mut obj = Object::with_type("Identifier");
        obj.insert(KEY_TOKEN, Node::string("x"));
        obj.insert(
            KEY_ROLES,
            Node::Array(vec![Node::string("Expression"), Node::string("Identifier")]),
        );
        obj
    }

    #[test]
    fn test_common_key_aliases() {
        assert_eq!(CommonKey::parse("type"), Some(CommonKey::Type));
        assert_eq!(CommonKey::parse("@type"), Some(CommonKey::Type));
        assert_eq!(CommonKey::parse("roles"), Some(CommonKey::Roles));
        assert_eq!(CommonKey::parse("@role"), Some(CommonKey::Roles));
        assert_eq!(CommonKey::parse("@pos"), Some(CommonKey::Position));
        assert_eq!(CommonKey::parse("Name"), None);
    }

    #[test]
    fn test_accessors() {
        let obj = identifier();
        assert_eq!(obj.type_of(), Some("Identifier"));
        assert_eq!(obj.token_of(), Some("x"));
        assert_eq!(obj.roles_of(), vec!["Expression", "Identifier"]);
        assert!(obj.positions_of().is_none());
    }

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut obj = Object::new();
        obj.insert("b", Node::int(1));
        obj.insert("a", Node::int(2));
        obj.insert("b", Node::int(3));
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(obj.get("b"), Some(&Node::int(3)));
    }

    #[test]
    fn test_push_promotes_to_array() {
        let mut obj = Object::new();
        obj.insert("body", Node::int(1));
        obj.push("body", Node::int(2));
        obj.push("args", Node::int(3));
        assert_eq!(obj.get("body"), Some(&Node::Array(vec![Node::int(1), Node::int(2)])));
        assert_eq!(obj.get("args"), Some(&Node::Array(vec![Node::int(3)])));
    }

    #[test]
    fn test_positions_round_trip_through_node() {
        let positions = Positions {
            start: Some(Position { offset: 0, line: 1, col: 1 }),
            end: Some(Position { offset: 4, line: 1, col: 5 }),
        };
        let mut obj = Object::with_type("File");
        obj.insert(KEY_POS, positions.to_node());
        assert_eq!(obj.positions_of(), Some(positions));
    }

    #[test]
    fn test_json_preserves_key_order() {
        let json = r#"{"z":1,"@type":"File","a":[true,null,1.5,"s"]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let obj = node.as_object().unwrap();
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["z", "@type", "a"]);
        assert_eq!(serde_json::to_string(&node).unwrap(), json);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Node::string("x").depth(), 0);
        assert_eq!(Node::Array(vec![]).depth(), 1);

        let mut leaf = Object::with_type("Identifier");
        let at = Position { offset: 0, line: 1, col: 1 };
        leaf.insert(KEY_POS, Positions { start: Some(at), end: None }.to_node());
        let leaf_depth = Node::Object(leaf.clone()).depth();

        let mut parent = Object::with_type("Call");
        parent.push("Args", leaf.clone().into());
        parent.push("Args", leaf.into());
        assert_eq!(Node::Object(parent).depth(), leaf_depth + 2);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Int(42).to_string(), "42");
        assert_eq!(Scalar::Float(2.0).to_string(), "2");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::String("x".into()).to_string(), "x");
        assert_eq!(Scalar::Null.to_string(), "");
    }
}

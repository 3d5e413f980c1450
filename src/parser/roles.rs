//! Role annotation for grammar node kinds.
//!
//! Tree-sitter grammars name their nodes freely, so roles are derived from
//! the words that appear in the kind (`function_declaration` is a function
//! declaration, `string_literal` a string literal, and so on).

const RULES: &[(&[&str], &[&str])] = &[
    (&["import", "use_declaration", "using_directive", "include", "extern_crate"], &["Import"]),
    (&["package", "namespace"], &["Package"]),
    (&["function", "method", "lambda", "closure", "arrow_function"], &["Function"]),
    (&["class", "struct", "interface", "enum", "trait", "object_declaration"], &["Type"]),
    (&["call", "invocation"], &["Call"]),
    (&["parameter"], &["Argument"]),
    (&["argument"], &["Argument"]),
    (&["identifier"], &["Identifier"]),
    (&["string"], &["String", "Literal"]),
    (&["number", "integer", "float", "decimal", "numeric"], &["Number", "Literal"]),
    (&["true", "false", "boolean"], &["Boolean", "Literal"]),
    (&["null", "nil", "none"], &["Null", "Literal"]),
    (&["comment"], &["Comment", "Noop"]),
    (&["if_", "conditional", "ternary"], &["If"]),
    (&["switch", "match", "case"], &["Switch"]),
    (&["for_", "while", "loop"], &["Loop"]),
    (&["return"], &["Return"]),
    (&["try", "catch", "except", "rescue"], &["Try"]),
    (&["throw", "raise", "panic"], &["Throw"]),
    (&["assignment", "assign"], &["Assignment"]),
    (&["binary", "unary", "operator"], &["Operator"]),
    (&["block", "body"], &["Block"]),
    (&["expression"], &["Expression"]),
    (&["statement"], &["Statement"]),
];

/// Roles for a node kind, in a stable order and without duplicates.
pub fn roles_for_kind(kind: &str) -> Vec<&'static str> {
    let kind = kind.to_ascii_lowercase();
    let mut roles: Vec<&'static str> = Vec::new();

    for (needles, assigned) in RULES {
        if needles.iter().any(|needle| kind.contains(needle)) {
            for role in *assigned {
                if !roles.contains(role) {
                    roles.push(role);
                }
            }
        }
    }

    if is_declaration(&kind) && !roles.contains(&"Declaration") {
        roles.push("Declaration");
    }
    if matches!(
        kind.as_str(),
        "source_file" | "program" | "module" | "compilation_unit" | "translation_unit"
    ) {
        roles.push("File");
    }
    roles
}

fn is_declaration(kind: &str) -> bool {
    kind.ends_with("_declaration")
        || kind.ends_with("_definition")
        || kind.ends_with("_item")
        || kind.ends_with("_declarator")
        || kind.ends_with("_spec")
}

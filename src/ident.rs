//! C# identifier checks and type-name rewriting.
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

// ————————————————————————————————————————————————————————————————————————————
// TABLES
// ————————————————————————————————————————————————————————————————————————————

/// Keywords plus the common contextual keywords.
static CSHARP_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
        "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
        "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
        "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
        "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
        "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed",
        "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw",
        "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using",
        "virtual", "void", "volatile", "while",
        // contextual / query
        "add", "remove", "alias", "ascending", "async", "await", "by", "descending", "dynamic",
        "equals", "from", "get", "global", "group", "into", "join", "let", "nameof", "on",
        "orderby", "partial", "select", "set", "value", "var", "when", "where", "yield",
    ]
    .into_iter()
    .collect()
});

static PPTR_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PPtr<\$(?<cls>.+)>").expect("static regex"));

const TYPE_NAME_REMAP: &[(&str, &str)] = &[
    ("PPtr<Object>", "PPtr<UnityObject>"),
    ("PPtr<Component>", "PPtr<UnityComponent>"),
    ("Matrix4x4f", "Matrix4x4"),
    ("Quaternionf", "Quaternion"),
    ("Vector2f", "Vector2"),
    ("Vector3f", "Vector3"),
    ("Vector4f", "Vector4"),
    ("float3", "Vector3"),
    ("GUID", "Guid"),
];

const SEPARATORS: &[char] = &[' ', '\t', '\r', '\n', '[', ']', '(', ')', '{', '}', '<', '>'];

// ————————————————————————————————————————————————————————————————————————————
// IDENTIFIERS
// ————————————————————————————————————————————————————————————————————————————

pub fn is_keyword(s: &str) -> bool {
    CSHARP_KEYWORDS.contains(s)
}

/// Letter/underscore start, letter/digit/underscore continuation, not a keyword.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_alphabetic()) {
        return false;
    }
    if !chars.all(|c| c == '_' || c.is_alphanumeric()) {
        return false;
    }
    !is_keyword(s)
}

/// Derive a camelCase identifier from an arbitrary field name.
///
/// `"m_Local Position"` → `"mlocalPosition"`, `"1st"` → `"_1st"`, `"class"` → `"class_"`.
pub fn to_camel_case_identifier(input: &str) -> String {
    let tokens: Vec<String> = input
        .split(SEPARATORS)
        .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i == 0 {
            out.push_str(token);
            continue;
        }
        let mut chars = token.chars();
        if let Some(head) = chars.next() {
            out.extend(head.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    if out.is_empty() {
        return "_".to_string();
    }
    if out.starts_with(char::is_numeric) {
        out.insert(0, '_');
    }
    if is_keyword(&out) {
        out.push('_');
    }
    // unreachable on the inputs above, kept as the last resort
    while !is_valid_identifier(&out) {
        out.insert(0, '_');
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE NAMES
// ————————————————————————————————————————————————————————————————————————————

/// `PPtr<$Foo>` → `PPtr<Foo>`.
pub fn escape_type_name(type_name: &str) -> String {
    match PPTR_ESCAPE.captures(type_name) {
        Some(caps) => format!("PPtr<{}>", &caps["cls"]),
        None => type_name.to_string(),
    }
}

pub fn remap_type_name(type_name: &str) -> String {
    TYPE_NAME_REMAP
        .iter()
        .find(|(from, _)| *from == type_name)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| type_name.to_string())
}

pub fn process_type_name(type_name: &str) -> String {
    remap_type_name(&escape_type_name(type_name))
}

/// Quote a string as a C# regular string literal.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

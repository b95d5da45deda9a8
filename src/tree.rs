//! Input type tree. One node per serialized field; immutable once built.
//!
//! Composition follows Unity-style type trees:
//! - arrays carry a single `Array` child whose children are `[size, data]`
//! - maps are an array of `pair`
//! - strings and byte blobs may carry their own size/data children (ignored)

/// Closed set of shape categories a node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Bool,
    Char,
    String,
    ByteArray,
    Array,
    Map,
    Pair,
    Class,
    Guid,
    Hash128,
    /// Childless node whose type name is not a known primitive.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTreeNode {
    pub type_name: String,
    pub name: String,
    pub shape: ShapeTag,
    pub children: Vec<TypeTreeNode>,
}

// ————————————————————————————————————————————————————————————————————————————
// CLASSIFICATION
// ————————————————————————————————————————————————————————————————————————————

impl ShapeTag {
    /// Derive the shape from a dump type name and the node's children.
    pub fn classify(type_name: &str, children: &[TypeTreeNode]) -> Self {
        match type_name {
            "SInt8" => Self::Int8,
            "UInt8" | "unsigned char" => Self::UInt8,
            "char" => Self::Char,
            "SInt16" | "short" => Self::Int16,
            "UInt16" | "unsigned short" => Self::UInt16,
            "int" | "SInt32" => Self::Int32,
            "UInt32" | "unsigned int" | "Type*" => Self::UInt32,
            "SInt64" | "long long" => Self::Int64,
            "UInt64" | "unsigned long long" | "FileSize" => Self::UInt64,
            "float" => Self::Float,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "string" => Self::String,
            "TypelessData" => Self::ByteArray,
            "map" => Self::Map,
            "pair" => Self::Pair,
            "Array" => Self::Array,
            _ if children.first().is_some_and(|c| c.type_name == "Array") => Self::Array,
            "GUID" if children.is_empty() => Self::Guid,
            "Hash128" if children.is_empty() => Self::Hash128,
            _ if children.is_empty() => Self::Unknown,
            _ => Self::Class,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Map | Self::Pair)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl TypeTreeNode {
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        shape: ShapeTag,
        children: Vec<TypeTreeNode>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            shape,
            children,
        }
    }

    /// Leaf whose shape is classified from its type name (`int`, `float`, `string`, ...).
    pub fn leaf(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let shape = ShapeTag::classify(&type_name, &[]);
        Self::new(type_name, name, shape, Vec::new())
    }

    pub fn class(
        type_name: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<TypeTreeNode>,
    ) -> Self {
        Self::new(type_name, name, ShapeTag::Class, fields)
    }

    /// `vector name` → `Array Array` → `[int size, element]`.
    pub fn vector(name: impl Into<String>, element: TypeTreeNode) -> Self {
        Self::new("vector", name, ShapeTag::Array, vec![Self::array_body(element)])
    }

    /// `map name` → `Array Array` → `[int size, pair data]`.
    pub fn map(name: impl Into<String>, key: TypeTreeNode, value: TypeTreeNode) -> Self {
        let entry = Self::pair("data", key, value);
        Self::new("map", name, ShapeTag::Map, vec![Self::array_body(entry)])
    }

    pub fn pair(name: impl Into<String>, first: TypeTreeNode, second: TypeTreeNode) -> Self {
        Self::new("pair", name, ShapeTag::Pair, vec![first, second])
    }

    fn array_body(element: TypeTreeNode) -> Self {
        Self::new(
            "Array",
            "Array",
            ShapeTag::Array,
            vec![Self::leaf("int", "size"), element],
        )
    }
}

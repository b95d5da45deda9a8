use crate::tree::ShapeTag;

/// Failure to read the tab-indented dump text. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("dump contains no nodes")]
    EmptyInput,
    #[error("line {line}: expected `<type> <name>`, got {text:?}")]
    MissingName { line: usize, text: String },
    #[error("line {line}: indentation jumps from depth {previous} to {depth}")]
    DepthJump {
        line: usize,
        previous: usize,
        depth: usize,
    },
    #[error("line {line}: second root node; a dump holds exactly one tree")]
    MultipleRoots { line: usize },
}

/// Failure while building, resolving or emitting one type tree.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("root node `{name}` ({type_name}) is not a class")]
    RootNotClass { type_name: String, name: String },
    #[error("malformed {shape:?} node `{name}` ({type_name}): {reason}")]
    MalformedNode {
        type_name: String,
        name: String,
        shape: ShapeTag,
        reason: &'static str,
    },
    #[error("unsupported shape {shape:?} for `{name}` ({type_name})")]
    UnsupportedShape {
        type_name: String,
        name: String,
        shape: ShapeTag,
    },
    #[error("empty class group list for `{0}`")]
    EmptyGroupList(String),
    #[error("two distinct class shapes are both named `{0}`")]
    DuplicateName(String),
    #[error("rename pass stalled with {0} unresolved class nodes")]
    Stalled(usize),
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

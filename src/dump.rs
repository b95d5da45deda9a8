//! Tab-indented type tree dumps.
//!
//! ```text
//! MonoBehaviour Base
//! 	PPtr<GameObject> m_GameObject
//! 		int m_FileID
//! 		SInt64 m_PathID
//! 	vector m_Points
//! 		Array Array
//! 			int size
//! 			Vector3f data
//! ```
//!
//! One node per line: leading tabs give the depth, then `<type> <name>`. Names may
//! contain spaces; so may a handful of primitive type names (`unsigned int`, ...).
use crate::error::ParseError;
use crate::tree::{ShapeTag, TypeTreeNode};

/// Multi-word primitive type names, longest first.
const MULTI_WORD_TYPES: &[&str] = &[
    "unsigned long long",
    "unsigned short",
    "unsigned char",
    "unsigned int",
    "long long",
];

struct Pending {
    type_name: String,
    name: String,
    children: Vec<TypeTreeNode>,
}

impl Pending {
    fn finish(self) -> TypeTreeNode {
        let shape = ShapeTag::classify(&self.type_name, &self.children);
        TypeTreeNode::new(self.type_name, self.name, shape, self.children)
    }
}

pub fn parse_dump(source: &str) -> Result<TypeTreeNode, ParseError> {
    // stack[d] is the open node at depth d
    let mut stack: Vec<Pending> = Vec::new();
    let mut root: Option<TypeTreeNode> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let depth = line.chars().take_while(|c| *c == '\t').count();
        let (type_name, name) = split_type_and_name(&line[depth..]).ok_or_else(|| {
            ParseError::MissingName {
                line: line_no,
                text: line.trim().to_string(),
            }
        })?;

        if depth > stack.len() {
            return Err(ParseError::DepthJump {
                line: line_no,
                previous: stack.len().saturating_sub(1),
                depth,
            });
        }
        close_to(&mut stack, depth, &mut root);
        if depth == 0 && root.is_some() {
            return Err(ParseError::MultipleRoots { line: line_no });
        }
        stack.push(Pending {
            type_name: type_name.to_string(),
            name: name.to_string(),
            children: Vec::new(),
        });
    }

    close_to(&mut stack, 0, &mut root);
    root.ok_or(ParseError::EmptyInput)
}

/// Finish every open node at `depth` or deeper, attaching each to its parent.
fn close_to(stack: &mut Vec<Pending>, depth: usize, root: &mut Option<TypeTreeNode>) {
    while stack.len() > depth {
        let Some(done) = stack.pop() else { break };
        let node = done.finish();
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => *root = Some(node),
        }
    }
}

fn split_type_and_name(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    for multi in MULTI_WORD_TYPES {
        if let Some(rest) = text.strip_prefix(multi) {
            if rest.starts_with(' ') {
                return non_empty_name(multi, rest);
            }
        }
    }
    // first space outside `<...>`
    let mut angle = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '<' => angle += 1,
            '>' => angle -= 1,
            ' ' if angle <= 0 => return non_empty_name(&text[..i], &text[i..]),
            _ => {}
        }
    }
    None
}

fn non_empty_name<'a>(type_name: &'a str, rest: &'a str) -> Option<(&'a str, &'a str)> {
    let name = rest.trim();
    if name.is_empty() { None } else { Some((type_name, name)) }
}

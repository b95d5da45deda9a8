//! Reference tree: an arena mirror of the input tree with two parent relations.
//!
//! - structural parent/children follow the field decomposition (containers included)
//! - class parent/children skip array/map/pair wrappers and link declared classes only
//!
//! Nodes are addressed by [`NodeId`]; the arena owns everything, so neither relation
//! needs shared ownership.
use crate::error::GenerateError;
use crate::ident;
use crate::tree::{ShapeTag, TypeTreeNode};

/// Value-like types with a fixed target equivalent. Never renamed, never deduplicated.
const WELL_KNOWN_VALUE_TYPES: &[&str] = &[
    "Colorf",
    "Matrix4x4f",
    "Quaternionf",
    "Vector2f",
    "Vector3f",
    "Vector4f",
    "GUID",
    "Hash128",
];

const EXTERNAL_REFERENCE_PREFIX: &str = "PPtr<";

pub const OFFSET_PTR_TYPE: &str = "OffsetPtr";

pub fn is_well_known_type(type_name: &str) -> bool {
    WELL_KNOWN_VALUE_TYPES.contains(&type_name) || type_name.starts_with(EXTERNAL_REFERENCE_PREFIX)
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct RefNode {
    pub type_name: String,
    pub name: String,
    pub shape: ShapeTag,
    pub structural_parent: Option<NodeId>,
    pub structural_children: Vec<NodeId>,
    pub class_parent: Option<NodeId>,
    pub class_children: Vec<NodeId>,
    /// Enqueued class children whose names are not final yet.
    pub unresolved_children: usize,
    pub assigned_name: Option<String>,
}

/// Structural identity of a class node: declared type plus `(field name, resolved type)` per field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub type_name: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub struct ReferenceTree {
    nodes: Vec<RefNode>,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

impl ReferenceTree {
    /// Mirror `root` into the arena. Class nodes that need a canonical name are pushed
    /// onto `worklist` in post-order (children before their enclosing class).
    pub fn build(root: &TypeTreeNode, worklist: &mut Vec<NodeId>) -> Result<Self, GenerateError> {
        if root.shape != ShapeTag::Class {
            return Err(GenerateError::RootNotClass {
                type_name: root.type_name.clone(),
                name: root.name.clone(),
            });
        }
        let mut tree = Self::default();
        tree.build_node(root, None, worklist)?;
        Ok(tree)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &RefNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut RefNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn build_node(
        &mut self,
        input: &TypeTreeNode,
        parent: Option<NodeId>,
        worklist: &mut Vec<NodeId>,
    ) -> Result<NodeId, GenerateError> {
        let id = NodeId(self.nodes.len());
        self.nodes.push(RefNode {
            type_name: input.type_name.clone(),
            name: input.name.clone(),
            shape: input.shape,
            structural_parent: parent,
            structural_children: Vec::new(),
            class_parent: None,
            class_children: Vec::new(),
            unresolved_children: 0,
            assigned_name: None,
        });

        let mut children = Vec::new();
        for child in structural_inputs(input)? {
            children.push(self.build_node(child, Some(id), worklist)?);
        }
        self.nodes[id.0].structural_children = children;

        if input.shape == ShapeTag::Class && parent.is_some() {
            let ancestor = self.enclosing_class(id);
            self.nodes[id.0].class_parent = ancestor;
            if let Some(ancestor) = ancestor {
                self.nodes[ancestor.0].class_children.push(id);
                if !is_well_known_type(&input.type_name) {
                    self.nodes[ancestor.0].unresolved_children += 1;
                    worklist.push(id);
                }
            }
        }
        Ok(id)
    }

    /// Walk the structural parents, skipping everything that is not a class.
    fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = self.node(id).structural_parent;
        while let Some(ancestor) = cursor {
            let node = self.node(ancestor);
            if node.shape == ShapeTag::Class {
                return Some(ancestor);
            }
            cursor = node.structural_parent;
        }
        None
    }
}

/// Input children that become structural children, per shape.
fn structural_inputs(input: &TypeTreeNode) -> Result<Vec<&TypeTreeNode>, GenerateError> {
    let malformed = |reason| GenerateError::MalformedNode {
        type_name: input.type_name.clone(),
        name: input.name.clone(),
        shape: input.shape,
        reason,
    };
    match input.shape {
        ShapeTag::Array => {
            let element = array_element(input).ok_or_else(|| malformed("missing Array/data child"))?;
            Ok(vec![element])
        }
        ShapeTag::Map => {
            let entry = array_element(input).ok_or_else(|| malformed("missing Array/data child"))?;
            if entry.children.len() != 2 {
                return Err(malformed("map entry must be a key/value pair"));
            }
            Ok(entry.children.iter().collect())
        }
        ShapeTag::Pair => {
            if input.children.len() != 2 {
                return Err(malformed("pair must have exactly two children"));
            }
            Ok(input.children.iter().collect())
        }
        ShapeTag::Class => Ok(input.children.iter().collect()),
        ShapeTag::Int8
        | ShapeTag::UInt8
        | ShapeTag::Int16
        | ShapeTag::UInt16
        | ShapeTag::Int32
        | ShapeTag::UInt32
        | ShapeTag::Int64
        | ShapeTag::UInt64
        | ShapeTag::Float
        | ShapeTag::Double
        | ShapeTag::Bool
        | ShapeTag::Char
        | ShapeTag::String
        | ShapeTag::ByteArray
        | ShapeTag::Guid
        | ShapeTag::Hash128
        | ShapeTag::Unknown => Ok(Vec::new()),
    }
}

/// `children[0].children[1]`: the `data` slot under the `Array` wrapper.
fn array_element(input: &TypeTreeNode) -> Option<&TypeTreeNode> {
    input.children.first()?.children.get(1)
}

// ————————————————————————————————————————————————————————————————————————————
// NAMES
// ————————————————————————————————————————————————————————————————————————————

impl ReferenceTree {
    /// Display/type name of a node as it will appear in emitted code.
    pub fn resolved_name(&self, id: NodeId) -> Result<String, GenerateError> {
        let node = self.node(id);
        if !node.shape.is_container() {
            if let Some(assigned) = &node.assigned_name {
                return Ok(assigned.clone());
            }
        }
        let name = match node.shape {
            ShapeTag::Array => format!("{}[]", self.child_name(id, 0)?),
            ShapeTag::Pair => format!(
                "MapPair<{}, {}>",
                self.child_name(id, 0)?,
                self.child_name(id, 1)?
            ),
            ShapeTag::Map => format!(
                "MultiDictionary<{}, {}>",
                self.child_name(id, 0)?,
                self.child_name(id, 1)?
            ),
            ShapeTag::Int8 => "sbyte".into(),
            ShapeTag::Int16 => "short".into(),
            ShapeTag::Int32 => "int".into(),
            ShapeTag::Int64 => "long".into(),
            ShapeTag::UInt8 => "byte".into(),
            ShapeTag::UInt16 => "ushort".into(),
            ShapeTag::UInt32 => "uint".into(),
            ShapeTag::UInt64 => "ulong".into(),
            ShapeTag::Float => "float".into(),
            ShapeTag::Double => "double".into(),
            ShapeTag::Char => "char".into(),
            ShapeTag::Bool => "bool".into(),
            ShapeTag::Guid => "Guid".into(),
            ShapeTag::Hash128 => "Hash128".into(),
            ShapeTag::ByteArray => "byte[]".into(),
            ShapeTag::String => "string".into(),
            ShapeTag::Class => ident::process_type_name(&node.type_name),
            ShapeTag::Unknown => {
                return Err(GenerateError::UnsupportedShape {
                    type_name: node.type_name.clone(),
                    name: node.name.clone(),
                    shape: node.shape,
                });
            }
        };
        Ok(name)
    }

    fn child_name(&self, id: NodeId, index: usize) -> Result<String, GenerateError> {
        let node = self.node(id);
        match node.structural_children.get(index) {
            Some(child) => self.resolved_name(*child),
            None => Err(GenerateError::MalformedNode {
                type_name: node.type_name.clone(),
                name: node.name.clone(),
                shape: node.shape,
                reason: "missing structural child",
            }),
        }
    }

    pub fn signature(&self, id: NodeId) -> Result<Signature, GenerateError> {
        let node = self.node(id);
        let fields = node
            .structural_children
            .iter()
            .map(|child| Ok((self.node(*child).name.clone(), self.resolved_name(*child)?)))
            .collect::<Result<Vec<_>, GenerateError>>()?;
        Ok(Signature {
            type_name: node.type_name.clone(),
            fields,
        })
    }

    /// Synthetic single-child indirection node (`OffsetPtr` → `data`). The target must be
    /// a named class so that `OffsetPtr_<target>` stays a valid identifier.
    pub fn is_offset_ptr(&self, id: NodeId) -> bool {
        let node = self.node(id);
        if node.shape != ShapeTag::Class || node.type_name != OFFSET_PTR_TYPE {
            return false;
        }
        match node.structural_children.as_slice() {
            [target] => {
                self.node(*target).shape == ShapeTag::Class && !self.is_well_known(*target)
            }
            _ => false,
        }
    }

    pub fn is_well_known(&self, id: NodeId) -> bool {
        is_well_known_type(&self.node(id).type_name)
    }
}

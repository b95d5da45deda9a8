//! Bottom-up structural dedup and renaming of class nodes.
//!
//! Each wave takes every queued class whose nested classes are all named, groups the
//! wave by structural signature, and names each group `<Type>_<n>`. Types that end up
//! with a single group get their plain declared name back.
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::emit;
use crate::error::GenerateError;
use crate::reference::{NodeId, ReferenceTree, Signature};
use crate::tree::TypeTreeNode;

const OFFSET_PTR_PREFIX: &str = "OffsetPtr_";

/// One fully resolved type tree, ready for emission.
#[derive(Debug)]
pub struct ClassCodeGenerator {
    tree: ReferenceTree,
    /// Declared type name → groups of structurally identical nodes, in registration order.
    groups: IndexMap<String, Vec<Vec<NodeId>>>,
}

/// Serializable view of one canonical group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub declared_type: String,
    pub name: String,
    pub members: usize,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl ClassCodeGenerator {
    pub fn new(root: &TypeTreeNode) -> Result<Self, GenerateError> {
        let mut worklist = Vec::new();
        let tree = ReferenceTree::build(root, &mut worklist)?;
        let mut groups = IndexMap::new();
        groups.insert(root.type_name.clone(), vec![vec![tree.root()]]);

        let mut generator = Self { tree, groups };
        generator.rename_classes(worklist)?;
        generator.restore_unique_class_names()?;
        generator.refresh_offset_ptr_names()?;
        generator.ensure_unique_names()?;

        // fields of the root are never part of a signature; surface bad shapes now
        generator.tree.signature(generator.tree.root())?;
        Ok(generator)
    }

    pub fn tree(&self) -> &ReferenceTree {
        &self.tree
    }

    /// Declared type name → groups, in registration order.
    pub fn groups(&self) -> &IndexMap<String, Vec<Vec<NodeId>>> {
        &self.groups
    }

    /// Final name a node is emitted and referenced under.
    pub fn class_name(&self, id: NodeId) -> Result<String, GenerateError> {
        self.tree.resolved_name(id)
    }

    fn rename_classes(&mut self, mut worklist: Vec<NodeId>) -> Result<(), GenerateError> {
        let mut wave = 0usize;
        while !worklist.is_empty() {
            wave += 1;
            let (ready, pending): (Vec<NodeId>, Vec<NodeId>) = worklist
                .into_iter()
                .partition(|id| self.tree.node(*id).unresolved_children == 0);
            if ready.is_empty() {
                return Err(GenerateError::Stalled(pending.len()));
            }

            // 1) group by signature, discovery order
            let mut wave_groups: IndexMap<Signature, Vec<NodeId>> = IndexMap::new();
            for id in &ready {
                let signature = self.tree.signature(*id)?;
                wave_groups.entry(signature).or_default().push(*id);
            }
            debug!(wave, ready = ready.len(), groups = wave_groups.len(), "rename wave");

            // 2) name and register each group
            for (signature, members) in wave_groups {
                let name = if self.tree.is_offset_ptr(members[0]) {
                    self.offset_ptr_name(members[0])?
                } else {
                    let prior = self.class_group_count(&signature.type_name);
                    format!("{}_{}", signature.type_name, prior + 1)
                };
                trace!(%name, members = members.len(), "assigned");
                for id in &members {
                    self.tree.node_mut(*id).assigned_name = Some(name.clone());
                }
                self.groups.entry(signature.type_name).or_default().push(members);
            }

            // 3) batch removal: parents of this wave may become ready
            for id in &ready {
                if let Some(parent) = self.tree.node(*id).class_parent {
                    self.tree.node_mut(parent).unresolved_children -= 1;
                }
            }
            worklist = pending;
        }
        Ok(())
    }

    /// Groups registered under `type_name`, offset-pointer wrappers excluded.
    fn class_group_count(&self, type_name: &str) -> usize {
        self.groups.get(type_name).map_or(0, |group_list| {
            group_list
                .iter()
                .filter(|members| !self.tree.is_offset_ptr(members[0]))
                .count()
        })
    }

    fn restore_unique_class_names(&mut self) -> Result<(), GenerateError> {
        for (class_name, group_list) in &self.groups {
            if group_list.is_empty() {
                return Err(GenerateError::EmptyGroupList(class_name.clone()));
            }
            // wrappers keep their names and do not count as a collision
            let classes: Vec<&Vec<NodeId>> = group_list
                .iter()
                .filter(|members| !self.tree.is_offset_ptr(members[0]))
                .collect();
            if let [only] = classes.as_slice() {
                for id in only.iter() {
                    self.tree.node_mut(*id).assigned_name = None;
                }
            }
        }
        Ok(())
    }

    /// Pointed-to classes may have lost their suffix; rebuild wrapper names from
    /// the final child names. Registration order puts inner wrappers first.
    fn refresh_offset_ptr_names(&mut self) -> Result<(), GenerateError> {
        let wrappers: Vec<Vec<NodeId>> = self
            .groups
            .values()
            .flatten()
            .filter(|members| self.tree.is_offset_ptr(members[0]))
            .cloned()
            .collect();
        for members in wrappers {
            let name = self.offset_ptr_name(members[0])?;
            for id in members {
                self.tree.node_mut(id).assigned_name = Some(name.clone());
            }
        }
        Ok(())
    }

    /// Distinct groups must never share an emitted name.
    fn ensure_unique_names(&self) -> Result<(), GenerateError> {
        let mut seen = HashSet::new();
        for members in self.groups.values().flatten() {
            let name = self.class_name(members[0])?;
            if !seen.insert(name.clone()) {
                return Err(GenerateError::DuplicateName(name));
            }
        }
        Ok(())
    }

    fn offset_ptr_name(&self, id: NodeId) -> Result<String, GenerateError> {
        let target = self.tree.node(id).structural_children[0];
        Ok(format!("{OFFSET_PTR_PREFIX}{}", self.tree.resolved_name(target)?))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OUTPUT
// ————————————————————————————————————————————————————————————————————————————

impl ClassCodeGenerator {
    /// Write one declaration per canonical group, in registration order.
    pub fn write_code<W: fmt::Write>(&self, out: &mut W) -> Result<(), GenerateError> {
        for group_list in self.groups.values() {
            for members in group_list {
                emit::write_declaration(&self.tree, members[0], out)?;
            }
        }
        Ok(())
    }

    pub fn to_code_string(&self) -> Result<String, GenerateError> {
        let mut out = String::new();
        self.write_code(&mut out)?;
        Ok(out)
    }

    pub fn report(&self) -> Result<Vec<GroupReport>, GenerateError> {
        let mut out = Vec::new();
        for (declared_type, group_list) in &self.groups {
            for members in group_list {
                let signature = self.tree.signature(members[0])?;
                out.push(GroupReport {
                    declared_type: declared_type.clone(),
                    name: self.class_name(members[0])?,
                    members: members.len(),
                    fields: signature
                        .fields
                        .into_iter()
                        .map(|(name, type_name)| FieldReport { name, type_name })
                        .collect(),
                });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TypeTreeNode as N;

    fn int(name: &str) -> N {
        N::leaf("int", name)
    }

    fn names(generator: &ClassCodeGenerator) -> Vec<String> {
        generator
            .groups()
            .values()
            .flatten()
            .map(|members| generator.class_name(members[0]).unwrap())
            .collect()
    }

    #[test]
    fn colliding_shapes_get_numbered_in_discovery_order() {
        let root = N::class("Root", "Base", vec![
            N::class("Data", "small", vec![int("a")]),
            N::class("Data", "large", vec![int("a"), N::leaf("string", "b")]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Root", "Data_1", "Data_2"]);
    }

    #[test]
    fn identical_shapes_collapse_to_plain_name() {
        let v = || N::class("Vector3Int", "v", vec![int("x")]);
        let root = N::class("Root", "Base", vec![
            v(),
            N::vector("list", v()),
            N::class("Holder", "holder", vec![v()]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Root", "Vector3Int", "Holder"]);
        assert_eq!(generator.groups()["Vector3Int"][0].len(), 3);
    }

    #[test]
    fn equal_signatures_share_a_name_across_depths() {
        let shallow = N::class("Curve", "a", vec![N::leaf("float", "t")]);
        let deep = N::class("Wrapper", "w", vec![N::class("Curve", "b", vec![N::leaf("float", "t")])]);
        let other = N::class("Curve", "c", vec![N::leaf("double", "t")]);
        let root = N::class("Root", "Base", vec![shallow, deep, other]);
        let generator = ClassCodeGenerator::new(&root).unwrap();

        let curves = &generator.groups()["Curve"];
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].len(), 2);
        assert_eq!(generator.class_name(curves[0][0]).unwrap(), "Curve_1");
        assert_eq!(generator.class_name(curves[0][1]).unwrap(), "Curve_1");
        assert_eq!(generator.class_name(curves[1][0]).unwrap(), "Curve_2");
    }

    #[test]
    fn parents_split_when_children_names_differ() {
        // same field names, but the nested Data shapes differ → two Outer groups
        let outer_a = N::class("Outer", "x", vec![N::class("Data", "d", vec![int("a")])]);
        let outer_b = N::class("Outer", "y", vec![N::class("Data", "d", vec![N::leaf("float", "a")])]);
        let root = N::class("Root", "Base", vec![outer_a, outer_b]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Root", "Data_1", "Data_2", "Outer_1", "Outer_2"]);
    }

    #[test]
    fn well_known_types_keep_fixed_names() {
        let vec3 = || N::class("Vector3f", "p", vec![N::leaf("float", "x")]);
        let root = N::class("Root", "Base", vec![
            vec3(),
            N::class("Deep", "d", vec![N::vector("pts", vec3())]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert!(!generator.groups().contains_key("Vector3f"));
        let report = generator.report().unwrap();
        assert_eq!(report[0].fields[0].type_name, "Vector3");
        assert_eq!(report[1].fields[0].type_name, "Vector3[]");
    }

    #[test]
    fn offset_ptr_is_named_after_its_target() {
        let clip = |field: &str| N::class("Clip", "data", vec![int(field)]);
        let root = N::class("Root", "Base", vec![
            N::class("OffsetPtr", "m_A", vec![clip("a")]),
            N::class("OffsetPtr", "m_B", vec![clip("b")]),
            N::class("OffsetPtr", "m_C", vec![N::class("Track", "data", vec![int("t")])]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), [
            "Root",
            "Clip_1",
            "Clip_2",
            "Track",
            "OffsetPtr_Clip_1",
            "OffsetPtr_Clip_2",
            "OffsetPtr_Track",
        ]);
    }

    #[test]
    fn wrappers_do_not_count_as_collisions() {
        let root = N::class("Root", "Base", vec![
            N::class("OffsetPtr", "m_Raw", vec![int("a"), int("b")]),
            N::class("OffsetPtr", "m_Clip", vec![N::class("Clip", "data", vec![int("t")])]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Root", "OffsetPtr", "OffsetPtr_Clip", "Clip"]);
    }

    #[test]
    fn wrappers_sharing_a_name_are_rejected() {
        let clip = || N::class("Clip", "data", vec![int("t")]);
        let moved = N::class("Clip", "m_Data", vec![int("t")]);
        let root = N::class("Root", "Base", vec![
            N::class("OffsetPtr", "m_A", vec![clip()]),
            N::class("OffsetPtr", "m_B", vec![moved]),
        ]);
        let err = ClassCodeGenerator::new(&root).unwrap_err();
        assert!(matches!(err, GenerateError::DuplicateName(ref name) if name == "OffsetPtr_Clip"));
    }

    #[test]
    fn wrappers_around_non_classes_are_plain_classes() {
        let root = N::class("Root", "Base", vec![
            N::class("OffsetPtr", "m_List", vec![N::vector("data", int("data"))]),
            N::class("Holder", "m_Ref", vec![
                N::class("OffsetPtr", "m_Ptr", vec![N::class("PPtr<$Mesh>", "data", vec![])]),
            ]),
        ]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Root", "OffsetPtr_1", "OffsetPtr_2", "Holder"]);
        assert!(names(&generator).iter().all(|n| crate::ident::is_valid_identifier(n)));
    }

    #[test]
    fn determinism_across_runs() {
        let build = || {
            N::class("Root", "Base", vec![
                N::class("Data", "a", vec![int("a")]),
                N::map("m", int("first"), N::class("Data", "second", vec![N::leaf("bool", "b")])),
                N::class("Data", "c", vec![int("a")]),
            ])
        };
        let first = ClassCodeGenerator::new(&build()).unwrap().to_code_string().unwrap();
        let second = ClassCodeGenerator::new(&build()).unwrap().to_code_string().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn root_type_reused_inside_gets_suffix() {
        let root = N::class("Node", "Base", vec![N::class("Node", "child", vec![int("v")])]);
        let generator = ClassCodeGenerator::new(&root).unwrap();
        assert_eq!(names(&generator), ["Node", "Node_2"]);
    }

    #[test]
    fn unsupported_field_fails_construction() {
        let root = N::class("Root", "Base", vec![N::leaf("Mystery", "m")]);
        let err = ClassCodeGenerator::new(&root).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedShape { .. }));
    }
}

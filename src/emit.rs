//! C# declaration emitter.
//!
//! One `[GenerateSerde] public partial record` per canonical group. The root record
//! inherits a base chosen from its leading fields; those fields are stripped because
//! the base already declares them.
use std::fmt;

use indexmap::IndexSet;

use crate::error::GenerateError;
use crate::ident;
use crate::reference::{NodeId, ReferenceTree};
use crate::tree::ShapeTag;

pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

const INDENT: &str = "    ";

/// Resolved type → lighter proxy used by the serializer.
const PROXY_TYPES: &[(&str, &str)] = &[
    ("Matrix4x4", "Matrix4x4Proxy"),
    ("Quaternion", "QuaternionProxy"),
    ("Vector2", "Vector2Proxy"),
    ("Vector3", "Vector3Proxy"),
    ("Vector4", "Vector4Proxy"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseClass {
    UnityObject,
    NamedObject,
    Component,
    Behaviour,
    MonoBehaviour,
}

impl BaseClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnityObject => "UnityObject",
            Self::NamedObject => "NamedObject",
            Self::Component => "UnityComponent",
            Self::Behaviour => "UnityBehaviour",
            Self::MonoBehaviour => "UnityMonoBehaviour",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ROOT CLASSIFICATION
// ————————————————————————————————————————————————————————————————————————————

/// Pick the root's base class and how many leading fields it absorbs.
pub fn classify_root(tree: &ReferenceTree, fields: &[NodeId]) -> (BaseClass, usize) {
    let field = |i: usize| fields.get(i).map(|id| tree.node(*id));
    let is_name = |i: usize| field(i).is_some_and(|f| f.shape == ShapeTag::String && f.name == "m_Name");
    let is_pptr = |i: usize, target: &str, name: &str| {
        field(i).is_some_and(|f| f.name == name && ident::escape_type_name(&f.type_name) == target)
    };
    let is_enabled = |i: usize| {
        field(i).is_some_and(|f| matches!(f.shape, ShapeTag::Bool | ShapeTag::UInt8) && f.name == "m_Enabled")
    };

    if is_name(0) {
        return (BaseClass::NamedObject, 1);
    }
    if !is_pptr(0, "PPtr<GameObject>", "m_GameObject") {
        return (BaseClass::UnityObject, 0);
    }
    if !is_enabled(1) {
        return (BaseClass::Component, 1);
    }
    if is_pptr(2, "PPtr<MonoScript>", "m_Script") && is_name(3) {
        return (BaseClass::MonoBehaviour, 4);
    }
    (BaseClass::Behaviour, 2)
}

// ————————————————————————————————————————————————————————————————————————————
// DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

pub fn write_declaration<W: fmt::Write>(
    tree: &ReferenceTree,
    id: NodeId,
    out: &mut W,
) -> Result<(), GenerateError> {
    if tree.is_well_known(id) {
        return Ok(());
    }
    let node = tree.node(id);
    let is_root = node.structural_parent.is_none();

    let (base, skip) = if is_root {
        let (base, skip) = classify_root(tree, &node.structural_children);
        (Some(base), skip)
    } else {
        (None, 0)
    };
    let fields = &node.structural_children[skip..];

    let mut proxies = IndexSet::new();
    let mut body = Vec::new();
    for field in fields {
        collect_proxies(tree, *field, &mut proxies)?;
        let source_name = &tree.node(*field).name;
        let var_name = if ident::is_valid_identifier(source_name) {
            source_name.clone()
        } else {
            body.push(format!(
                "{INDENT}[SerdeMemberOptions(Rename = {})]",
                ident::string_literal(source_name)
            ));
            ident::to_camel_case_identifier(source_name)
        };
        body.push(format!(
            "{INDENT}public required {} {var_name};",
            tree.resolved_name(*field)?
        ));
    }

    let mut lines = vec!["[GenerateSerde]".to_string()];
    for (for_type, proxy) in &proxies {
        lines.push(format!(
            "[UseProxy(ForType = typeof({for_type}), Proxy = typeof({proxy}))]"
        ));
    }
    let class_name = tree.resolved_name(id)?;
    lines.push(match base {
        Some(base) => format!("public partial record {class_name} : {}", base.as_str()),
        None => format!("public partial record {class_name}"),
    });
    lines.push("{".to_string());
    lines.extend(body);
    lines.push("}".to_string());

    for line in lines {
        out.write_str(&line)?;
        out.write_str(LINE_ENDING)?;
    }
    out.write_str(LINE_ENDING)?;
    Ok(())
}

/// Proxied types used by a field, looking through containers but not into classes.
fn collect_proxies(
    tree: &ReferenceTree,
    id: NodeId,
    found: &mut IndexSet<(&'static str, &'static str)>,
) -> Result<(), GenerateError> {
    let node = tree.node(id);
    if node.shape.is_container() {
        for child in &node.structural_children {
            collect_proxies(tree, *child, found)?;
        }
        return Ok(());
    }
    let resolved = tree.resolved_name(id)?;
    if let Some(entry) = PROXY_TYPES.iter().find(|(for_type, _)| *for_type == resolved) {
        found.insert(*entry);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::generator::ClassCodeGenerator;
    use crate::tree::TypeTreeNode as N;

    use super::*;

    fn emit(root: &N) -> String {
        ClassCodeGenerator::new(root)
            .unwrap()
            .to_code_string()
            .unwrap()
            .replace(LINE_ENDING, "\n")
    }

    fn pptr(type_name: &str, name: &str) -> N {
        N::class(type_name, name, vec![N::leaf("int", "m_FileID"), N::leaf("SInt64", "m_PathID")])
    }

    #[test]
    fn named_object_root_with_collisions() {
        let root = N::class("Settings", "Base", vec![
            N::leaf("string", "m_Name"),
            N::class("Data", "m_Small", vec![N::leaf("int", "a")]),
            N::class("Data", "m_Large", vec![N::leaf("int", "a"), N::leaf("string", "b")]),
        ]);
        let expected = "\
[GenerateSerde]
public partial record Settings : NamedObject
{
    public required Data_1 m_Small;
    public required Data_2 m_Large;
}

[GenerateSerde]
public partial record Data_1
{
    public required int a;
}

[GenerateSerde]
public partial record Data_2
{
    public required int a;
    public required string b;
}

";
        assert_eq!(emit(&root), expected);
    }

    #[test]
    fn invalid_field_names_get_rename_annotations() {
        let root = N::class("Thing", "Base", vec![
            N::leaf("float", "m_Local Scale"),
            N::leaf("int", "class"),
        ]);
        let expected = "\
[GenerateSerde]
public partial record Thing : UnityObject
{
    [SerdeMemberOptions(Rename = \"m_Local Scale\")]
    public required float mlocalScale;
    [SerdeMemberOptions(Rename = \"class\")]
    public required int class_;
}

";
        assert_eq!(emit(&root), expected);
    }

    #[test]
    fn proxies_are_listed_once_per_type_in_first_use_order() {
        let vec3 = || N::class("Vector3f", "v", vec![N::leaf("float", "x")]);
        let quat = N::class("Quaternionf", "q", vec![N::leaf("float", "w")]);
        let root = N::class("Pose", "Base", vec![
            quat,
            vec3(),
            N::vector("m_Path", vec3()),
            N::map("m_Keys", N::leaf("int", "first"), N::class("Matrix4x4f", "second", vec![])),
        ]);
        let out = emit(&root);
        let expected_head = "\
[GenerateSerde]
[UseProxy(ForType = typeof(Quaternion), Proxy = typeof(QuaternionProxy))]
[UseProxy(ForType = typeof(Vector3), Proxy = typeof(Vector3Proxy))]
[UseProxy(ForType = typeof(Matrix4x4), Proxy = typeof(Matrix4x4Proxy))]
public partial record Pose : UnityObject
";
        assert!(out.starts_with(expected_head), "{out}");
        assert!(out.contains("    public required Vector3[] m_Path;\n"));
        assert!(out.contains("    public required MultiDictionary<int, Matrix4x4> m_Keys;\n"));
        // well-known types have no declaration of their own
        assert_eq!(out.matches("public partial record").count(), 1);
    }

    #[test]
    fn root_base_classification_is_progressive() {
        let go = || pptr("PPtr<GameObject>", "m_GameObject");
        let enabled = || N::leaf("UInt8", "m_Enabled");
        let tail = || N::leaf("float", "m_Speed");

        let component = N::class("Collider", "Base", vec![go(), tail()]);
        assert!(emit(&component).contains("record Collider : UnityComponent\n{\n    public required float m_Speed;"));

        let behaviour = N::class("Light", "Base", vec![go(), enabled(), tail()]);
        assert!(emit(&behaviour).contains("record Light : UnityBehaviour\n{\n    public required float m_Speed;"));

        let script = N::class("MonoBehaviour", "Base", vec![
            go(),
            enabled(),
            pptr("PPtr<MonoScript>", "m_Script"),
            N::leaf("string", "m_Name"),
            tail(),
        ]);
        assert!(emit(&script).contains("record MonoBehaviour : UnityMonoBehaviour\n{\n    public required float m_Speed;\n}"));

        // script reference without the name keeps only the behaviour prefix
        let partial = N::class("Odd", "Base", vec![go(), enabled(), pptr("PPtr<MonoScript>", "m_Script")]);
        assert!(emit(&partial).contains("record Odd : UnityBehaviour\n{\n    public required PPtr<MonoScript> m_Script;"));
    }

    #[test]
    fn offset_ptr_wrapper_declaration() {
        let root = N::class("Anim", "Base", vec![
            N::class("OffsetPtr", "m_Clip", vec![N::class("Clip", "data", vec![N::leaf("float", "t")])]),
        ]);
        let out = emit(&root);
        assert!(out.contains("public required OffsetPtr_Clip m_Clip;"));
        assert!(out.contains("public partial record OffsetPtr_Clip\n{\n    public required Clip data;\n}"));
    }

    #[test]
    fn well_known_root_emits_nothing() {
        let root = N::class("Vector3f", "Base", vec![N::leaf("float", "x")]);
        assert_eq!(emit(&root), "");
    }
}

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::flags;
use augur_atom::AtomSet;
use augur_atom::atom;

use crate::fqsen::ClassElementFqsen;
use crate::fqsen::ClassFqsen;
use crate::fqsen::FunctionFqsen;
use crate::fqsen::FunctionLikeFqsen;
use crate::metadata::CodeBase;
use crate::metadata::flags::MetadataFlags;
use crate::metadata::function_like::FunctionLikeMetadata;
use crate::metadata::parameter::ParameterMetadata;
use crate::scanner::ScanContext;
use crate::scanner::body_has_yield;
use crate::scanner::class_like::visibility_of;
use crate::scanner::default_value_union;
use crate::scanner::scan_statement;
use crate::scanner::union_of_type_hint;
use crate::ttype::union::UnionType;

/// Registers a free function declaration, then keeps scanning its body.
pub(crate) fn scan_function(codebase: &mut CodeBase, context: &mut ScanContext<'_>, node: &Node) {
    let Some(name) = node.name else {
        return;
    };

    let fqsen = FunctionFqsen::new(context.names.namespace, name);
    let function = build_function_like(context, FunctionLikeFqsen::Function(fqsen), node, &AtomSet::default());
    codebase.add_function(function);

    if let Some(body) = node.child(1) {
        scan_statement(codebase, context, body);
    }
}

/// Registers a closure under its synthesized (file, line) FQSEN.
pub(crate) fn scan_closure(codebase: &mut CodeBase, context: &mut ScanContext<'_>, node: &Node) {
    let fqsen = FunctionFqsen::for_closure(context.file, node.line);
    let mut closure = build_function_like(context, FunctionLikeFqsen::Closure(fqsen), node, &AtomSet::default());
    closure.flags |= MetadataFlags::CLOSURE;
    codebase.add_function(closure);

    if let Some(body) = node.child(2) {
        scan_statement(codebase, context, body);
    }
}

/// Builds the metadata of a method declaration; the caller attaches it to
/// its class.
pub(crate) fn scan_method(
    context: &ScanContext<'_>,
    class_fqsen: ClassFqsen,
    node: &Node,
    templates: &AtomSet,
) -> Option<FunctionLikeMetadata> {
    let name = node.name?;

    let fqsen = FunctionLikeFqsen::Method(ClassElementFqsen::new(class_fqsen, name));
    let mut method = build_function_like(context, fqsen, node, templates);

    method.visibility = visibility_of(node.flags);
    if node.has_flag(flags::MODIFIER_STATIC) {
        method.flags |= MetadataFlags::STATIC;
    }
    if node.has_flag(flags::MODIFIER_ABSTRACT) {
        method.flags |= MetadataFlags::ABSTRACT;
    }
    if node.has_flag(flags::MODIFIER_FINAL) {
        method.flags |= MetadataFlags::FINAL;
    }

    Some(method)
}

/// The shared shape of function, method, and closure scanning.
///
/// Child slots follow the declaration layout: parameters first, body
/// second-to-last position by kind, return type last.
fn build_function_like(
    context: &ScanContext<'_>,
    fqsen: FunctionLikeFqsen,
    node: &Node,
    templates: &AtomSet,
) -> FunctionLikeMetadata {
    let name = node.name.unwrap_or_else(|| match fqsen {
        FunctionLikeFqsen::Closure(closure) => closure.name,
        _ => atom(""),
    });

    let mut function = FunctionLikeMetadata::new(fqsen, name, context.file, node.line);

    if node.has_flag(flags::RETURNS_REFERENCE) {
        function.flags |= MetadataFlags::RETURNS_REFERENCE;
    }

    let comment = context.comment(node);
    if comment.is_deprecated {
        function.flags |= MetadataFlags::DEPRECATED;
    }
    function.suppressions = comment.suppressions.iter().map(|name| atom(name)).collect();

    if let Some(parameter_list) = node.raw_child(0) {
        for parameter_node in &parameter_list.children {
            if let Some(parameter) = scan_parameter(context, parameter_node, &comment, templates) {
                function.parameters.push(parameter);
            }
        }
    }
    function.recount_parameters();

    let (body_slot, return_slot) = match node.kind {
        NodeKind::Closure => (2, 3),
        _ => (1, 2),
    };

    function.union_type = union_of_type_hint(context, node.child(return_slot), templates);
    if let Some(return_tag) = &comment.return_tag {
        function.union_type.add_union(&UnionType::from_string_in_context(
            &return_tag.type_string,
            &context.names,
            templates,
        ));
    }

    if let Some(body) = node.child(body_slot)
        && body_has_yield(body)
    {
        function.flags |= MetadataFlags::HAS_YIELD;
    }

    function
}

fn scan_parameter(
    context: &ScanContext<'_>,
    node: &Node,
    comment: &augur_docblock::Comment,
    templates: &AtomSet,
) -> Option<ParameterMetadata> {
    if node.kind != NodeKind::Param {
        return None;
    }
    let name = node.name?;

    let mut parameter = ParameterMetadata::new(name, node.line);
    if node.has_flag(flags::PARAM_REFERENCE) {
        parameter.flags |= MetadataFlags::BY_REFERENCE;
    }
    if node.has_flag(flags::PARAM_VARIADIC) {
        parameter.flags |= MetadataFlags::VARIADIC;
    }

    // Declared type ∪ doc `@param` type ∪ default value type.
    parameter.union_type = union_of_type_hint(context, node.child(0), templates);
    if let Some(tag) = comment.parameter(name.as_str()) {
        parameter
            .union_type
            .add_union(&UnionType::from_string_in_context(&tag.type_string, &context.names, templates));
    }
    if let Some(default) = node.child(1) {
        parameter.has_default = true;
        parameter.union_type.add_union(&default_value_union(Some(default)));
    }

    Some(parameter)
}

#[cfg(test)]
mod tests {
    use augur_ast::Value;
    use augur_atom::atom;

    use crate::metadata::flags::Visibility;
    use crate::scanner::ScanOptions;
    use crate::scanner::scan_program;

    use super::*;

    fn param(name: &str, type_hint: Option<&str>, default: Option<Value>, line: u32) -> Node {
        let type_child = match type_hint {
            Some(hint) => Node::new(NodeKind::Name, line).with_name(atom(hint)),
            None => Node::missing(line),
        };
        let default_child = match default {
            Some(value) => Node::new(NodeKind::Literal, line).with_value(value),
            None => Node::missing(line),
        };

        Node::new(NodeKind::Param, line).with_name(atom(name)).with_child(type_child).with_child(default_child)
    }

    #[test]
    fn test_scan_function_signature() {
        let function = Node::new(NodeKind::FunctionDecl, 1)
            .with_name(atom("f"))
            .with_doc_comment("/** @param int[] $xs\n * @return string */")
            .with_child(
                Node::new(NodeKind::ParamList, 1)
                    .with_child(param("xs", Some("array"), None, 1))
                    .with_child(param("limit", Some("int"), Some(Value::Int(10)), 1)),
            )
            .with_child(Node::new(NodeKind::StmtList, 1))
            .with_child(Node::missing(1));
        let root = Node::new(NodeKind::StmtList, 1).with_child(function);

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        let function = codebase.get_function_by_fqsen(FunctionFqsen::from_full_name("\\f")).unwrap();
        assert_eq!(function.required_parameter_count, 1);
        assert_eq!(function.optional_parameter_count, 1);
        assert_eq!(function.parameters[0].union_type.to_string(), "array|int[]");
        assert_eq!(function.union_type.to_string(), "string");
    }

    #[test]
    fn test_scan_method_modifiers() {
        let method = Node::new(NodeKind::MethodDecl, 2)
            .with_name(atom("make"))
            .with_flags(flags::MODIFIER_PROTECTED | flags::MODIFIER_STATIC)
            .with_child(Node::new(NodeKind::ParamList, 2))
            .with_child(Node::new(NodeKind::StmtList, 2))
            .with_child(Node::missing(2));
        let class = Node::new(NodeKind::ClassDecl, 1)
            .with_name(atom("Factory"))
            .with_child(Node::missing(1))
            .with_child(Node::new(NodeKind::NameList, 1))
            .with_child(Node::new(NodeKind::NameList, 1))
            .with_child(Node::new(NodeKind::StmtList, 1).with_child(method));
        let root = Node::new(NodeKind::StmtList, 1).with_child(class);

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        let class = codebase.get_class_by_fqsen(ClassFqsen::from_full_name("\\Factory")).unwrap();
        let method = class.get_method("make").unwrap();

        assert_eq!(method.visibility, Visibility::Protected);
        assert!(method.flags.is_static());
    }

    #[test]
    fn test_scan_closure_registers_digest_fqsen() {
        let closure = Node::new(NodeKind::Closure, 7)
            .with_child(Node::new(NodeKind::ParamList, 7))
            .with_child(Node::new(NodeKind::ClosureUseList, 7))
            .with_child(Node::new(NodeKind::StmtList, 7))
            .with_child(Node::missing(7));
        let root = Node::new(NodeKind::StmtList, 1)
            .with_child(Node::new(NodeKind::ExprStmt, 7).with_child(closure));

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        let fqsen = FunctionFqsen::for_closure(atom("src.php"), 7);
        let closure = codebase.get_function_by_fqsen(fqsen).unwrap();
        assert!(closure.flags.is_closure());
    }
}

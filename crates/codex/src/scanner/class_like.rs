use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::flags;
use augur_atom::Atom;
use augur_atom::AtomSet;
use augur_atom::atom;
use augur_atom::concat_atom;

use crate::fqsen::ClassElementFqsen;
use crate::fqsen::ClassFqsen;
use crate::metadata::CodeBase;
use crate::metadata::class_like::ClassMetadata;
use crate::metadata::constant::ClassConstantMetadata;
use crate::metadata::flags::MetadataFlags;
use crate::metadata::flags::Visibility;
use crate::metadata::property::PropertyMetadata;
use crate::scanner::ScanContext;
use crate::scanner::default_value_union;
use crate::scanner::function_like;
use crate::scanner::scan_statement;
use crate::scanner::type_string_of_name;
use crate::scanner::union_of_type_hint;
use crate::ttype::Type;
use crate::ttype::union::UnionType;

/// Registers a class, interface, or trait declaration with all its members.
pub(crate) fn scan_class(codebase: &mut CodeBase, context: &mut ScanContext<'_>, node: &Node) {
    let Some(name) = node.name else {
        return;
    };

    let fqsen = declared_class_fqsen(context, name);
    let mut class = ClassMetadata::new(fqsen, context.file, node.line);

    if node.has_flag(flags::CLASS_ABSTRACT) {
        class.flags |= MetadataFlags::ABSTRACT;
    }
    if node.has_flag(flags::CLASS_FINAL) {
        class.flags |= MetadataFlags::FINAL;
    }
    if node.is_interface_decl() {
        class.flags |= MetadataFlags::INTERFACE;
    }
    if node.is_trait_decl() {
        class.flags |= MetadataFlags::TRAIT;
    }

    let comment = context.comment(node);
    if comment.is_deprecated {
        class.flags |= MetadataFlags::DEPRECATED;
    }
    class.suppressions = comment.suppressions.iter().map(|name| atom(name)).collect();

    if context.options.generic_types_enabled {
        class.template_types = comment.templates.iter().map(|template| atom(&template.name)).collect();
    }
    let templates = class.template_name_set();

    if let Some(extends) = node.child(0)
        && let Some(type_string) = type_string_of_name(extends)
    {
        class.parent = Some(ClassFqsen::from_full_name(&context.names.resolve_class(&type_string, false)));
    }

    // `@inherits Container<int>` binds the parent's template parameters.
    if context.options.generic_types_enabled
        && let Some(inherits) = &comment.inherits
        && let Some(Type::ClassInstance { parameters, .. }) =
            Type::from_string_in_context(inherits, &context.names, &templates)
    {
        class.parent_template_parameters = parameters;
    }

    if let Some(implements) = node.raw_child(1) {
        for interface in &implements.children {
            if let Some(type_string) = type_string_of_name(interface) {
                class.interfaces.push(ClassFqsen::from_full_name(&context.names.resolve_class(&type_string, false)));
            }
        }
    }

    if let Some(uses) = node.raw_child(2) {
        for used_trait in &uses.children {
            if let Some(type_string) = type_string_of_name(used_trait) {
                class.traits.push(ClassFqsen::from_full_name(&context.names.resolve_class(&type_string, false)));
            }
        }
    }

    let mut method_bodies: Vec<&Node> = Vec::new();
    if let Some(body) = node.raw_child(3) {
        for member in &body.children {
            match member.kind {
                NodeKind::PropertyDecl => scan_property_group(context, &mut class, member, &templates),
                NodeKind::ClassConstDecl => scan_constant_group(context, &mut class, member),
                NodeKind::MethodDecl => {
                    if let Some(method) = function_like::scan_method(context, fqsen, member, &templates) {
                        class.add_method(method);
                    }
                    if let Some(method_body) = member.child(1) {
                        method_bodies.push(method_body);
                    }
                }
                _ => {}
            }
        }
    }

    codebase.add_class(class);

    // Closures and conditional declarations inside method bodies are still
    // parse-pass work.
    for body in method_bodies {
        scan_statement(codebase, context, body);
    }
}

fn scan_property_group(
    context: &ScanContext<'_>,
    class: &mut ClassMetadata,
    group: &Node,
    templates: &AtomSet,
) {
    let visibility = visibility_of(group.flags);
    let comment = context.comment(group);

    for element in &group.children {
        if element.kind != NodeKind::PropertyElem {
            continue;
        }
        let Some(name) = element.name else {
            continue;
        };

        let fqsen = ClassElementFqsen::new(class.fqsen, name);
        let mut property = PropertyMetadata::new(fqsen, context.file, element.line);
        property.visibility = visibility;
        if group.flags & flags::MODIFIER_STATIC != 0 {
            property.flags |= MetadataFlags::STATIC;
        }

        // Declared type ∪ doc `@var` type ∪ default value type.
        property.union_type = union_of_type_hint(context, element.child(0), templates);
        if let Some(var_tag) = comment
            .var_tags
            .iter()
            .find(|tag| tag.name.as_deref().is_none_or(|tag_name| tag_name == name.as_str()))
        {
            property.union_type.add_union(&UnionType::from_string_in_context(
                &var_tag.type_string,
                &context.names,
                templates,
            ));
        }
        property.union_type.add_union(&default_value_union(element.child(1)));

        class.add_property(property);
    }
}

fn scan_constant_group(context: &ScanContext<'_>, class: &mut ClassMetadata, group: &Node) {
    for element in &group.children {
        if element.kind != NodeKind::ConstElem {
            continue;
        }
        let Some(name) = element.name else {
            continue;
        };

        let fqsen = ClassElementFqsen::new(class.fqsen, name);
        let mut constant = ClassConstantMetadata::new(fqsen, context.file, element.line);
        constant.union_type = default_value_union(element.child(0));

        class.add_constant(constant);
    }
}

pub(crate) fn visibility_of(node_flags: u32) -> Visibility {
    if node_flags & flags::MODIFIER_PRIVATE != 0 {
        Visibility::Private
    } else if node_flags & flags::MODIFIER_PROTECTED != 0 {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// The FQSEN a declaration introduces: current namespace plus name, never
/// resolved through the use map.
fn declared_class_fqsen(context: &ScanContext<'_>, name: Atom) -> ClassFqsen {
    let namespace = context.names.namespace;
    let full = if namespace.as_str() == "\\" { concat_atom!("\\", name) } else { concat_atom!(namespace, "\\", name) };
    ClassFqsen::from_full_name(&full)
}

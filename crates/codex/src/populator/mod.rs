//! Ancestor hydration.
//!
//! Hydration expands a class with everything it inherits: properties,
//! class constants, and methods from every interface, trait, and parent, in
//! that order. It runs at most once per class (idempotent via the
//! `HYDRATED` flag) and after the parse pass has registered all
//! declarations; a missing ancestor is simply skipped here and reported by
//! the per-class analyzers.
//!
//! Conflicts favor the earliest definition: a member the class already has
//! shadows the incoming one, which is discarded after marking the survivor
//! as an override. Two different imported definitions of one member emit an
//! `IncompatibleComposition*` diagnostic.

use itertools::Itertools;

use augur_atom::AtomSet;
use augur_atom::atom;

use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;

use crate::fqsen::ClassFqsen;
use crate::fqsen::ClassElementFqsen;
use crate::fqsen::FunctionLikeFqsen;
use crate::metadata::CodeBase;
use crate::metadata::class_like::ClassMetadata;
use crate::metadata::constant::ClassConstantMetadata;
use crate::metadata::flags::MetadataFlags;
use crate::ttype::NativeType;
use crate::ttype::Type;
use crate::ttype::union::UnionType;

/// Hydrates every class in the codebase, in deterministic order.
///
/// Returns the composition diagnostics discovered along the way.
pub fn hydrate_all(codebase: &mut CodeBase) -> Vec<IssueInstance> {
    let mut issues = Vec::new();

    let fqsens: Vec<ClassFqsen> = codebase.class_fqsens().into_iter().sorted_by_key(|f| f.key()).collect();
    for fqsen in fqsens {
        hydrate(codebase, fqsen, &mut issues);
    }

    issues
}

/// Hydrates one class and (recursively) its ancestry.
///
/// Calling this any number of times is equivalent to calling it once.
pub fn hydrate(codebase: &mut CodeBase, fqsen: ClassFqsen, issues: &mut Vec<IssueInstance>) {
    let mut visiting = AtomSet::default();
    hydrate_inner(codebase, fqsen, &mut visiting, issues);
}

fn hydrate_inner(codebase: &mut CodeBase, fqsen: ClassFqsen, visiting: &mut AtomSet, issues: &mut Vec<IssueInstance>) {
    match codebase.get_class_by_fqsen(fqsen) {
        Ok(class) if class.flags.is_hydrated() => return,
        Ok(_) => {}
        Err(_) => return,
    }

    // A cyclic hierarchy would recurse forever; break the cycle and let the
    // inheritance analyzers report it.
    if !visiting.insert(fqsen.key()) {
        return;
    }

    let ancestors = match codebase.get_class_by_fqsen(fqsen) {
        Ok(class) => class.direct_ancestors(),
        Err(_) => return,
    };
    for ancestor in &ancestors {
        hydrate_inner(codebase, *ancestor, visiting, issues);
    }

    let Some(mut class) = codebase.take_class(fqsen) else {
        return;
    };

    for method in class.methods.values_mut() {
        if method.flags.has_yield() {
            coerce_to_generator(&mut method.union_type, codebase);
        }
    }

    for ancestor in ancestors {
        import_ancestor(codebase, &mut class, ancestor, issues);
    }

    inject_class_constant(&mut class);

    class.flags |= MetadataFlags::HYDRATED;
    codebase.restore_class(class);
    visiting.remove(&fqsen.key());
}

/// Imports one ancestor's members into `class`.
fn import_ancestor(
    codebase: &CodeBase,
    class: &mut ClassMetadata,
    ancestor_fqsen: ClassFqsen,
    issues: &mut Vec<IssueInstance>,
) {
    let Ok(ancestor) = codebase.get_class_by_fqsen(ancestor_fqsen) else {
        return;
    };

    // Template parameters bound through the extending class rewrite every
    // imported member's union type.
    let template_map = if Some(ancestor_fqsen) == class.parent
        && !ancestor.template_types.is_empty()
        && !class.parent_template_parameters.is_empty()
    {
        Some(class.parent_template_map(ancestor))
    } else {
        None
    };

    for name in ancestor.properties.keys().copied().sorted().collect::<Vec<_>>() {
        let incoming = &ancestor.properties[&name];

        if let Some(existing) = class.properties.get_mut(&name) {
            existing.flags |= MetadataFlags::OVERRIDE;

            let existing_defining = existing.defining_fqsen.class;
            if !existing_defining.names_same_class(class.fqsen)
                && !existing_defining.names_same_class(incoming.defining_fqsen.class)
                && existing.union_type != incoming.union_type
            {
                issues.push(IssueInstance::new(
                    IssueKind::IncompatibleCompositionProp,
                    class.file,
                    class.line,
                    vec![
                        existing_defining.to_atom().to_string(),
                        incoming.defining_fqsen.class.to_atom().to_string(),
                        name.to_string(),
                    ],
                ));
            }
            continue;
        }

        let mut imported = incoming.clone();
        imported.fqsen = imported.fqsen.retargeted(class.fqsen);
        if let Some(map) = &template_map {
            imported.union_type = imported.union_type.with_template_parameter_type_map(map);
        }
        class.properties.insert(name, imported);
    }

    for key in ancestor.methods.keys().copied().sorted().collect::<Vec<_>>() {
        let incoming = &ancestor.methods[&key];

        if let Some(existing) = class.methods.get_mut(&key) {
            existing.flags |= MetadataFlags::OVERRIDE;

            let existing_defining = defining_class_of(existing.defining_fqsen);
            let incoming_defining = defining_class_of(incoming.defining_fqsen);
            if let (Some(existing_defining), Some(incoming_defining)) = (existing_defining, incoming_defining)
                && !existing_defining.names_same_class(class.fqsen)
                && !existing_defining.names_same_class(incoming_defining)
                && existing.union_type != incoming.union_type
            {
                issues.push(IssueInstance::new(
                    IssueKind::IncompatibleCompositionMethod,
                    class.file,
                    class.line,
                    vec![
                        existing_defining.to_atom().to_string(),
                        incoming_defining.to_atom().to_string(),
                        incoming.name.to_string(),
                    ],
                ));
            }
            continue;
        }

        let mut imported = incoming.clone();
        if let FunctionLikeFqsen::Method(member) = imported.fqsen {
            imported.fqsen = FunctionLikeFqsen::Method(member.retargeted(class.fqsen));
        }
        if let Some(map) = &template_map {
            imported.union_type = imported.union_type.with_template_parameter_type_map(map);
            for parameter in &mut imported.parameters {
                parameter.union_type = parameter.union_type.with_template_parameter_type_map(map);
            }
        }
        if imported.flags.has_yield() {
            coerce_to_generator(&mut imported.union_type, codebase);
        }
        class.methods.insert(key, imported);
    }

    for name in ancestor.constants.keys().copied().sorted().collect::<Vec<_>>() {
        let incoming = &ancestor.constants[&name];

        if let Some(existing) = class.constants.get_mut(&name) {
            existing.flags |= MetadataFlags::OVERRIDE;
            continue;
        }

        let mut imported = incoming.clone();
        imported.fqsen = imported.fqsen.retargeted(class.fqsen);
        if let Some(map) = &template_map {
            imported.union_type = imported.union_type.with_template_parameter_type_map(map);
        }
        class.constants.insert(name, imported);
    }
}

/// The built-in `::class` string constant every class exposes.
fn inject_class_constant(class: &mut ClassMetadata) {
    let name = atom("class");
    if class.constants.contains_key(&name) {
        return;
    }

    let fqsen = ClassElementFqsen::new(class.fqsen, name);
    let mut constant = ClassConstantMetadata::new(fqsen, class.file, class.line);
    constant.union_type = UnionType::of_native(NativeType::String);
    constant.flags |= MetadataFlags::INTERNAL;
    class.constants.insert(name, constant);
}

/// Coerces a yielding function-like's return union to the generator type
/// unless the declared union is already a supertype of it.
fn coerce_to_generator(union: &mut UnionType, codebase: &CodeBase) {
    let generator = UnionType::of(Type::class(generator_fqsen()));

    if union.is_empty() || !generator.can_cast_to_union(union, codebase) {
        *union = generator;
    }
}

fn generator_fqsen() -> ClassFqsen {
    ClassFqsen::from_full_name("\\Generator")
}

fn defining_class_of(fqsen: FunctionLikeFqsen) -> Option<ClassFqsen> {
    match fqsen {
        FunctionLikeFqsen::Method(member) => Some(member.class),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::metadata::function_like::FunctionLikeMetadata;
    use crate::metadata::property::PropertyMetadata;

    use super::*;

    fn class(full_name: &str, line: u32) -> ClassMetadata {
        ClassMetadata::new(ClassFqsen::from_full_name(full_name), atom("src.php"), line)
    }

    fn property(class_fqsen: ClassFqsen, name: &str, type_string: &str) -> PropertyMetadata {
        let mut property = PropertyMetadata::new(ClassElementFqsen::new(class_fqsen, atom(name)), atom("src.php"), 1);
        property.union_type = UnionType::from_string_in_context(
            type_string,
            &crate::names::NameContext::new(),
            &AtomSet::default(),
        );
        property
    }

    fn method(class_fqsen: ClassFqsen, name: &str) -> FunctionLikeMetadata {
        let fqsen = FunctionLikeFqsen::Method(ClassElementFqsen::new(class_fqsen, atom(name)));
        FunctionLikeMetadata::new(fqsen, atom(name), atom("src.php"), 1)
    }

    #[test]
    fn test_members_flow_down_and_defining_fqsen_is_preserved() {
        let mut codebase = CodeBase::new();

        let parent_fqsen = ClassFqsen::from_full_name("\\P");
        let mut parent = class("\\P", 1);
        parent.add_property(property(parent_fqsen, "shared", "int"));
        parent.add_method(method(parent_fqsen, "run"));
        codebase.add_class(parent);

        let mut child = class("\\C", 5);
        child.parent = Some(parent_fqsen);
        let child_fqsen = codebase.add_class(child);

        let mut issues = Vec::new();
        hydrate(&mut codebase, child_fqsen, &mut issues);
        assert!(issues.is_empty());

        let child = codebase.get_class_by_fqsen(child_fqsen).unwrap();
        let inherited = &child.properties[&atom("shared")];

        assert!(inherited.fqsen.class.names_same_class(child_fqsen));
        assert!(inherited.defining_fqsen.class.names_same_class(parent_fqsen));
        assert!(child.has_method("run"));
    }

    #[test]
    fn test_hydration_is_idempotent() {
        let mut codebase = CodeBase::new();

        let parent_fqsen = ClassFqsen::from_full_name("\\P");
        let mut parent = class("\\P", 1);
        parent.add_property(property(parent_fqsen, "x", "int"));
        codebase.add_class(parent);

        let mut child = class("\\C", 5);
        child.parent = Some(parent_fqsen);
        let child_fqsen = codebase.add_class(child);

        let mut issues = Vec::new();
        hydrate(&mut codebase, child_fqsen, &mut issues);
        let once = codebase.get_class_by_fqsen(child_fqsen).unwrap().clone();

        hydrate(&mut codebase, child_fqsen, &mut issues);
        hydrate(&mut codebase, child_fqsen, &mut issues);
        let thrice = codebase.get_class_by_fqsen(child_fqsen).unwrap();

        assert_eq!(&once, thrice);
    }

    #[test]
    fn test_own_member_shadows_ancestor_and_is_marked_override() {
        let mut codebase = CodeBase::new();

        let parent_fqsen = ClassFqsen::from_full_name("\\P");
        let mut parent = class("\\P", 1);
        parent.add_property(property(parent_fqsen, "x", "int"));
        codebase.add_class(parent);

        let mut child = class("\\C", 5);
        child.parent = Some(parent_fqsen);
        let child_fqsen = ClassFqsen::from_full_name("\\C");
        child.add_property(property(child_fqsen, "x", "string"));
        codebase.add_class(child);

        hydrate(&mut codebase, child_fqsen, &mut Vec::new());

        let child = codebase.get_class_by_fqsen(child_fqsen).unwrap();
        let own = &child.properties[&atom("x")];

        assert!(own.flags.is_override());
        assert_eq!(own.union_type.to_string(), "string");
        assert!(own.defining_fqsen.class.names_same_class(child_fqsen));
    }

    #[test]
    fn test_template_parameters_rewrite_imported_types() {
        let mut codebase = CodeBase::new();

        let container_fqsen = ClassFqsen::from_full_name("\\Container");
        let mut container = class("\\Container", 1);
        container.template_types = vec![atom("T")];
        let mut item = property(container_fqsen, "item", "");
        item.union_type = UnionType::of(Type::Template(atom("T")));
        container.add_property(item);
        codebase.add_class(container);

        let mut ints = class("\\IntContainer", 10);
        ints.parent = Some(container_fqsen);
        ints.parent_template_parameters = vec![UnionType::of_native(NativeType::Int)];
        let ints_fqsen = codebase.add_class(ints);

        hydrate(&mut codebase, ints_fqsen, &mut Vec::new());

        let ints = codebase.get_class_by_fqsen(ints_fqsen).unwrap();
        assert_eq!(ints.properties[&atom("item")].union_type.to_string(), "int");
    }

    #[test]
    fn test_class_constant_is_injected() {
        let mut codebase = CodeBase::new();
        let fqsen = codebase.add_class(class("\\A", 1));

        hydrate(&mut codebase, fqsen, &mut Vec::new());

        let constant = &codebase.get_class_by_fqsen(fqsen).unwrap().constants[&atom("class")];
        assert_eq!(constant.union_type.to_string(), "string");
    }

    #[test]
    fn test_incompatible_composition_is_reported() {
        let mut codebase = CodeBase::new();

        let t1_fqsen = ClassFqsen::from_full_name("\\T1");
        let mut t1 = class("\\T1", 1);
        t1.flags |= MetadataFlags::TRAIT;
        t1.add_property(property(t1_fqsen, "x", "int"));
        codebase.add_class(t1);

        let t2_fqsen = ClassFqsen::from_full_name("\\T2");
        let mut t2 = class("\\T2", 2);
        t2.flags |= MetadataFlags::TRAIT;
        t2.add_property(property(t2_fqsen, "x", "string"));
        codebase.add_class(t2);

        let mut composed = class("\\Composed", 10);
        composed.traits = vec![t1_fqsen, t2_fqsen];
        let composed_fqsen = codebase.add_class(composed);

        let mut issues = Vec::new();
        hydrate(&mut codebase, composed_fqsen, &mut issues);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::IncompatibleCompositionProp);
        // Earliest import wins.
        let composed = codebase.get_class_by_fqsen(composed_fqsen).unwrap();
        assert_eq!(composed.properties[&atom("x")].union_type.to_string(), "int");
    }

    #[test]
    fn test_yield_methods_coerce_to_generator() {
        let mut codebase = CodeBase::new();

        let fqsen = ClassFqsen::from_full_name("\\Gen");
        let mut r#gen = class("\\Gen", 1);
        let mut yielding = method(fqsen, "items");
        yielding.flags |= MetadataFlags::HAS_YIELD;
        r#gen.add_method(yielding);
        codebase.add_class(r#gen);

        hydrate(&mut codebase, fqsen, &mut Vec::new());

        let r#gen = codebase.get_class_by_fqsen(fqsen).unwrap();
        assert_eq!(r#gen.get_method("items").unwrap().union_type.to_string(), "\\Generator");
    }
}

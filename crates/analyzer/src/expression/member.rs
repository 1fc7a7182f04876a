//! Property and class-constant access inference.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_atom::AtomMap;
use augur_atom::atom;

use augur_codex::CodeBase;
use augur_codex::fqsen::ClassElementFqsen;
use augur_codex::fqsen::ClassFqsen;
use augur_codex::metadata::flags::MetadataFlags;
use augur_codex::metadata::property::PropertyMetadata;
use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::error::AnalysisResult;
use crate::expression::member_name_of;
use crate::expression::static_property_name_of;

impl Analyzer<'_> {
    /// `$obj->prop`: the property is looked up on every class in the
    /// receiver's union; `__get` synthesizes one when nothing matches.
    pub(crate) fn visit_property_access(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(object) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let Some(property_node) = node.child(1) else {
            return Ok(UnionType::empty());
        };

        // `$obj->$name[…]` parsed differently across engine majors.
        if self.settings.backward_compatibility_checks
            && matches!(property_node.kind, NodeKind::Dim | NodeKind::Prop)
        {
            self.emit(context, IssueKind::CompatiblePHP7, node.line, vec![]);
        }

        let object_union = self.union_type_or_empty(context, object);
        let property_name = member_name_of(property_node)?;

        let class_fqsens = object_union.class_fqsens();
        if class_fqsens.is_empty() {
            return Ok(UnionType::empty());
        }

        for class_fqsen in &class_fqsens {
            let Ok(class) = self.codebase.get_class_by_fqsen(*class_fqsen) else {
                continue;
            };
            let Some(property) = class.properties.get(&property_name) else {
                continue;
            };

            let mut union = property.union_type.clone();
            let defining_class = property.defining_fqsen.class;
            let visibility = property.visibility;

            self.check_member_access(
                context,
                visibility,
                defining_class,
                node.line,
                (IssueKind::AccessPropertyPrivate, IssueKind::AccessPropertyProtected),
                &format!("{}->{}", class_fqsen.to_atom(), property_name),
                None,
            );

            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(*class_fqsen)
                && let Some(property) = class.properties.get_mut(&property_name)
            {
                property.add_reference(context.file, node.line);
            }

            union = substitute_object_templates(self.codebase, &object_union, *class_fqsen, union);
            union = self.resolve_static_in_result(context, union, defining_class, *class_fqsen);
            return Ok(union);
        }

        // A class exposing `__get` gets a synthesized property of the
        // getter's return type, remembered for later accesses.
        for class_fqsen in &class_fqsens {
            let Some(getter_union) = self.magic_getter_union(*class_fqsen) else {
                continue;
            };

            let fqsen = ClassElementFqsen::new(*class_fqsen, property_name);
            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(*class_fqsen) {
                let mut property = PropertyMetadata::new(fqsen, context.file, node.line);
                property.flags |= MetadataFlags::DYNAMIC;
                property.union_type = getter_union.clone();
                class.add_property(property);
            }
            return Ok(getter_union);
        }

        Err(IssueInstance::new(
            IssueKind::UndeclaredProperty,
            context.file,
            node.line,
            vec![format!("{}->{}", class_fqsens[0].to_atom(), property_name)],
        )
        .into())
    }

    /// `\A::$prop`.
    pub(crate) fn visit_static_property_access(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(class_node) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let Some(property_node) = node.child(1) else {
            return Ok(UnionType::empty());
        };

        let class_fqsen = self.class_fqsen_of_name(context, class_node)?;
        let property_name = static_property_name_of(property_node)?;

        let Ok(class) = self.codebase.get_class_by_fqsen(class_fqsen) else {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredClass,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            )
            .into());
        };

        let Some(property) = class.properties.get(&property_name) else {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredStaticProperty,
                context.file,
                node.line,
                vec![property_name.to_string(), class_fqsen.to_atom().to_string()],
            )
            .into());
        };
        if !property.flags.is_static() {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredStaticProperty,
                context.file,
                node.line,
                vec![property_name.to_string(), class_fqsen.to_atom().to_string()],
            )
            .into());
        }

        let union = property.union_type.clone();
        let defining_class = property.defining_fqsen.class;
        let visibility = property.visibility;

        self.check_member_access(
            context,
            visibility,
            defining_class,
            node.line,
            (IssueKind::AccessPropertyPrivate, IssueKind::AccessPropertyProtected),
            &format!("{}::${}", class_fqsen.to_atom(), property_name),
            None,
        );

        if let Ok(class) = self.codebase.get_class_by_fqsen_mut(class_fqsen)
            && let Some(property) = class.properties.get_mut(&property_name)
        {
            property.add_reference(context.file, node.line);
        }

        Ok(union)
    }

    /// `\A::CONST` (including the built-in `::class`).
    pub(crate) fn visit_class_constant_access(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(class_node) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let Some(constant_node) = node.child(1) else {
            return Ok(UnionType::empty());
        };

        let class_fqsen = self.class_fqsen_of_name(context, class_node)?;
        let constant_name = member_name_of(constant_node)?;

        // `::class` is defined even for classes the hydrator never saw.
        if constant_name == atom("class") {
            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(class_fqsen) {
                class.add_reference(context.file, node.line);
            }
            return Ok(UnionType::of_native(NativeType::String));
        }

        let Ok(class) = self.codebase.get_class_by_fqsen(class_fqsen) else {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredClass,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            )
            .into());
        };

        let Some(constant) = class.constants.get(&constant_name) else {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredClassConstant,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string(), constant_name.to_string()],
            )
            .into());
        };

        let union = constant.union_type.clone();
        if let Ok(class) = self.codebase.get_class_by_fqsen_mut(class_fqsen)
            && let Some(constant) = class.constants.get_mut(&constant_name)
        {
            constant.add_reference(context.file, node.line);
        }

        Ok(union)
    }
}

/// Substitutes a member's template placeholders with the parameters bound
/// on the receiver's concrete type, when both sides carry generics.
pub(crate) fn substitute_object_templates(
    codebase: &CodeBase,
    object_union: &UnionType,
    class_fqsen: ClassFqsen,
    member_union: UnionType,
) -> UnionType {
    if !member_union.has_template_type() {
        return member_union;
    }

    let Ok(class) = codebase.get_class_by_fqsen(class_fqsen) else {
        return member_union;
    };
    if class.template_types.is_empty() {
        return member_union;
    }

    let parameters = object_union.types().iter().find_map(|t| match t {
        Type::ClassInstance { fqsen, parameters } if fqsen.names_same_class(class_fqsen) && !parameters.is_empty() => {
            Some(parameters.clone())
        }
        _ => None,
    });
    let Some(parameters) = parameters else {
        return member_union;
    };

    let mut map = AtomMap::default();
    for (name, parameter) in class.template_types.iter().zip(parameters) {
        map.insert(*name, parameter);
    }

    member_union.with_template_parameter_type_map(&map)
}

//! Call, method-call, static-call, and instantiation inference.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_atom::ascii_lowercase_atom;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::FunctionFqsen;
use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::metadata::flags::Visibility;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::error::AnalysisResult;
use crate::expression::member::substitute_object_templates;
use crate::expression::member_name_of;
use crate::invocation::CallableView;

impl Analyzer<'_> {
    /// Free function call: resolve by FQSEN, falling back to the bundled
    /// internal signature map for engine-provided functions.
    pub(crate) fn visit_call(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(target) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let arguments = node.child(1);

        if target.kind != NodeKind::Name {
            // Calling through an expression: a closure-typed value routes
            // to its declaration, anything else is opaque.
            let target_union = self.union_type_or_empty(context, target);
            for t in target_union.types() {
                if let Type::ClosureCallable(fqsen) = t
                    && let Ok(closure) = self.codebase.get_function_by_fqsen(*fqsen)
                {
                    let view = CallableView::from_function_like(closure);
                    let union = closure.union_type.clone();
                    self.check_argument_list(context, &view, arguments);
                    return Ok(union);
                }
            }
            return Ok(UnionType::empty());
        }

        let Some(name) = target.name else {
            return Ok(UnionType::empty());
        };
        let fully_qualified = target.has_flag(augur_ast::flags::NAME_FULLY_QUALIFIED);
        let resolved = context.names.resolve_function(&name, fully_qualified);
        let fqsen = FunctionFqsen::from_full_name(&resolved);

        if let Ok(function) = self.codebase.resolve_function(fqsen) {
            let FunctionLikeFqsen::Function(actual_fqsen) = function.fqsen else {
                return Ok(UnionType::empty());
            };
            let view = CallableView::from_function_likes(self.codebase.function_alternates(actual_fqsen));
            let union = function.union_type.clone();
            let deprecated = function.flags.is_deprecated();
            let (declared_file, declared_line) = (function.file, function.line);

            if let Ok(function) = self.codebase.get_function_by_fqsen_mut(actual_fqsen) {
                function.add_reference(context.file, node.line);
            }
            if deprecated {
                self.emit(
                    context,
                    IssueKind::DeprecatedFunction,
                    node.line,
                    vec![actual_fqsen.to_atom().to_string(), declared_file.to_string(), declared_line.to_string()],
                );
            }

            self.check_argument_list(context, &view, arguments);
            return Ok(union);
        }

        // Internal functions have no declarations in analyzed code; their
        // signatures come from the bundled map.
        let bare = ascii_lowercase_atom(&fqsen.name);
        if let Some(signature) = self.codebase.internal_function_signature(bare) {
            let view = CallableView::from_internal(bare, signature);
            let union = signature.return_union.clone();
            self.check_argument_list(context, &view, arguments);
            self.check_special_call(context, bare, arguments);
            return Ok(union);
        }

        Err(IssueInstance::new(IssueKind::UndeclaredFunction, context.file, node.line, vec![resolved.to_string()])
            .into())
    }

    /// Instance method call: look the method up on every class in the
    /// receiver's union, with magic `__call` as the fallback.
    pub(crate) fn visit_method_call(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(object) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let Some(method_node) = node.child(1) else {
            return Ok(UnionType::empty());
        };
        let arguments = node.child(2);

        let object_union = self.union_type_or_empty(context, object);
        let method_name = member_name_of(method_node)?;

        let class_fqsens = object_union.class_fqsens();
        if class_fqsens.is_empty() {
            return Ok(UnionType::empty());
        }

        for class_fqsen in &class_fqsens {
            let Ok(class) = self.codebase.get_class_by_fqsen(*class_fqsen) else {
                continue;
            };
            let Some(method) = class.get_method(&method_name) else {
                continue;
            };

            let view = CallableView::from_function_like(method);
            let mut union = method.union_type.clone();
            let defining_class = defining_class_of(method.defining_fqsen).unwrap_or(*class_fqsen);
            let deprecated = method.flags.is_deprecated();
            let visibility = method.visibility;
            let (declared_file, declared_line) = (method.file, method.line);

            self.check_member_access(
                context,
                visibility,
                defining_class,
                node.line,
                (IssueKind::AccessMethodPrivate, IssueKind::AccessMethodProtected),
                &format!("{}::{}", class_fqsen.to_atom(), method_name),
                Some((declared_file, declared_line)),
            );
            if deprecated {
                self.emit(
                    context,
                    IssueKind::DeprecatedFunction,
                    node.line,
                    vec![
                        format!("{}::{}", class_fqsen.to_atom(), method_name),
                        declared_file.to_string(),
                        declared_line.to_string(),
                    ],
                );
            }

            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(*class_fqsen)
                && let Some(method) = class.get_method_mut(&method_name)
            {
                method.add_reference(context.file, node.line);
            }

            self.check_argument_list(context, &view, arguments);

            union = substitute_object_templates(self.codebase, &object_union, *class_fqsen, union);
            union = self.resolve_static_in_result(context, union, defining_class, *class_fqsen);
            return Ok(union);
        }

        // Magic `__call` behaves like a variadic method with no declared
        // types: the call is accepted unchecked.
        for class_fqsen in &class_fqsens {
            if let Ok(class) = self.codebase.get_class_by_fqsen(*class_fqsen)
                && class.has_method("__call")
            {
                return Ok(UnionType::empty());
            }
        }

        Err(IssueInstance::new(
            IssueKind::UndeclaredClassMethod,
            context.file,
            node.line,
            vec![class_fqsens[0].to_atom().to_string(), method_name.to_string()],
        )
        .into())
    }

    pub(crate) fn visit_static_call(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(class_node) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let Some(method_node) = node.child(1) else {
            return Ok(UnionType::empty());
        };
        let arguments = node.child(2);

        let method_name = member_name_of(method_node)?;
        let is_parent_call = class_node.name.is_some_and(|name| name.as_str() == "parent");

        // `parent::__construct()` inside a constructor satisfies the
        // parent-constructor-required contract.
        if is_parent_call
            && method_name.as_str() == "__construct"
            && let Some(class_fqsen) = context.class_fqsen
            && matches!(
                context.function_fqsen,
                Some(FunctionLikeFqsen::Method(member)) if member.name.as_str() == "__construct"
            )
        {
            self.parent_constructor_calls.insert(class_fqsen.key());
        }

        let class_fqsen = self.class_fqsen_of_name(context, class_node)?;
        if self.codebase.get_class_by_fqsen(class_fqsen).is_err() {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredClass,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            )
            .into());
        }

        let class = self.codebase.get_class_by_fqsen(class_fqsen)?;
        let Some(method) = class.get_method(&method_name) else {
            // Magic `__callStatic` accepts anything.
            if class.has_method("__callStatic") {
                return Ok(UnionType::empty());
            }
            return Err(IssueInstance::new(
                IssueKind::UndeclaredStaticMethod,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string(), method_name.to_string()],
            )
            .into());
        };

        let view = CallableView::from_function_like(method);
        let mut union = method.union_type.clone();
        let defining_class = defining_class_of(method.defining_fqsen).unwrap_or(class_fqsen);
        let is_static = method.flags.is_static();
        let visibility = method.visibility;
        let (declared_file, declared_line) = (method.file, method.line);

        if !is_static && !is_parent_call {
            self.emit(
                context,
                IssueKind::StaticCallToNonStatic,
                node.line,
                vec![
                    format!("{}::{}", class_fqsen.to_atom(), method_name),
                    declared_file.to_string(),
                    declared_line.to_string(),
                ],
            );
        }
        self.check_member_access(
            context,
            visibility,
            defining_class,
            node.line,
            (IssueKind::AccessMethodPrivate, IssueKind::AccessMethodProtected),
            &format!("{}::{}", class_fqsen.to_atom(), method_name),
            Some((declared_file, declared_line)),
        );

        if let Ok(class) = self.codebase.get_class_by_fqsen_mut(class_fqsen)
            && let Some(method) = class.get_method_mut(&method_name)
        {
            method.add_reference(context.file, node.line);
        }

        self.check_argument_list(context, &view, arguments);

        union = self.resolve_static_in_result(context, union, defining_class, class_fqsen);
        Ok(union)
    }

    /// `new X(...)` yields `X`; a generic `X` has its `@template` list
    /// paired positionally with the constructor argument types.
    pub(crate) fn visit_new(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(class_node) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        if class_node.kind != NodeKind::Name {
            return Ok(UnionType::empty());
        }
        let arguments = node.child(1);

        let class_fqsen = self.class_fqsen_of_name(context, class_node)?;
        let Ok(class) = self.codebase.get_class_by_fqsen(class_fqsen) else {
            return Err(IssueInstance::new(
                IssueKind::UndeclaredClass,
                context.file,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            )
            .into());
        };

        let is_interface = class.is_interface();
        let is_abstract = class.flags.is_abstract();
        let is_deprecated = class.flags.is_deprecated();
        let (declared_file, declared_line) = (class.file, class.line);
        let constructor_view = class.get_method("__construct").map(CallableView::from_function_like);
        let template_count =
            if self.settings.generic_types_enabled { class.template_types.len() } else { 0 };

        if is_interface {
            self.emit(
                context,
                IssueKind::TypeInstantiateInterface,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            );
        } else if is_abstract {
            self.emit(
                context,
                IssueKind::TypeInstantiateAbstract,
                node.line,
                vec![class_fqsen.to_atom().to_string()],
            );
        }
        if is_deprecated {
            self.emit(
                context,
                IssueKind::DeprecatedClass,
                node.line,
                vec![class_fqsen.to_atom().to_string(), declared_file.to_string(), declared_line.to_string()],
            );
        }

        if let Ok(class) = self.codebase.get_class_by_fqsen_mut(class_fqsen) {
            class.add_reference(context.file, node.line);
            if let Some(constructor) = class.get_method_mut("__construct") {
                constructor.add_reference(context.file, node.line);
            }
        }

        if let Some(view) = constructor_view {
            self.check_argument_list(context, &view, arguments);
        }

        if template_count == 0 {
            return Ok(UnionType::of(Type::class(class_fqsen)));
        }

        let mut parameters = Vec::with_capacity(template_count);
        for position in 0..template_count {
            let parameter = arguments
                .and_then(|list| list.child(position))
                .map(|argument| self.union_type_or_empty(context, argument))
                .unwrap_or_default();
            parameters.push(parameter);
        }

        Ok(UnionType::of(Type::ClassInstance { fqsen: class_fqsen, parameters }))
    }

    /// Replaces `static` in a member's result type with the concrete class
    /// when the access happens outside the defining class.
    pub(crate) fn resolve_static_in_result(
        &self,
        context: &Context,
        mut union: UnionType,
        defining_class: ClassFqsen,
        concrete_class: ClassFqsen,
    ) -> UnionType {
        if !union.has_static_type() {
            return union;
        }
        if context.class_fqsen.is_some_and(|current| current.names_same_class(defining_class)) {
            return union;
        }

        union.remove_type(&Type::Native(augur_codex::ttype::NativeType::Static));
        union.add_type(Type::class(concrete_class));
        union
    }

    /// Visibility check shared by member accesses.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn check_member_access(
        &mut self,
        context: &Context,
        visibility: Visibility,
        defining_class: ClassFqsen,
        line: u32,
        issues: (IssueKind, IssueKind),
        member_description: &str,
        declared_at: Option<(augur_atom::Atom, u32)>,
    ) {
        let accessible = match visibility {
            Visibility::Public => true,
            Visibility::Private => context.class_fqsen.is_some_and(|current| current.names_same_class(defining_class)),
            Visibility::Protected => context.class_fqsen.is_some_and(|current| {
                current.names_same_class(defining_class) || self.codebase.is_ancestor(defining_class, current)
            }),
        };
        if accessible {
            return;
        }

        let (private_issue, protected_issue) = issues;
        let kind = if visibility == Visibility::Private { private_issue } else { protected_issue };
        let mut arguments = vec![member_description.to_string()];
        if let Some((file, declared_line)) = declared_at {
            arguments.push(file.to_string());
            arguments.push(declared_line.to_string());
        }

        self.emit(context, kind, line, arguments);
    }
}

fn defining_class_of(fqsen: FunctionLikeFqsen) -> Option<ClassFqsen> {
    match fqsen {
        FunctionLikeFqsen::Method(member) => Some(member.class),
        _ => None,
    }
}

//! Expression type inference.
//!
//! One visitor method per node kind; anything unrecognized infers to the
//! empty union through the default arm. The visitor is pure with respect to
//! scopes — assignments and narrowing live in their own modules — but it
//! does emit diagnostics and synthesizes magic members on the codebase.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::flags;
use augur_atom::atom;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::FunctionFqsen;
use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::context::scope::superglobal_union_type;
use crate::error::AnalysisInterrupt;
use crate::error::AnalysisResult;
use crate::error::NodeShapeError;

pub mod binary;
pub mod call;
pub mod member;

impl Analyzer<'_> {
    /// Infers the union type of an expression node.
    pub(crate) fn union_type_of(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        match node.kind {
            NodeKind::Missing => Ok(UnionType::empty()),
            NodeKind::Literal => Ok(match &node.value {
                Some(value) => UnionType::of(Type::from_literal(value)),
                None => UnionType::empty(),
            }),
            NodeKind::Var => self.visit_variable(context, node),
            NodeKind::Name => self.visit_constant_name(context, node),
            NodeKind::ArrayLit => self.visit_array_literal(context, node),
            NodeKind::Dim => self.visit_dim(context, node),
            NodeKind::ListExpr => Ok(UnionType::of_native(NativeType::Array)),
            NodeKind::Unpack => {
                let inner = node.child(0).map(|child| self.union_type_or_empty(context, child));
                Ok(inner.unwrap_or_default())
            }

            NodeKind::BinaryOp => self.visit_binary_operator(context, node),
            NodeKind::UnaryOp => self.visit_unary_operator(context, node),
            NodeKind::Cast => Ok(self.visit_cast(context, node)),
            NodeKind::Conditional => self.visit_conditional(context, node),

            NodeKind::Assign | NodeKind::AssignOp => {
                // The scope effect belongs to the assignment visitor; as an
                // expression the assignment evaluates to its right side.
                let right = node.child(1).map(|child| self.union_type_or_empty(context, child));
                Ok(right.unwrap_or_default())
            }
            // Known not to infer; tracked as a gap.
            NodeKind::AssignRef => Ok(UnionType::empty()),

            NodeKind::Call => self.visit_call(context, node),
            NodeKind::MethodCall => self.visit_method_call(context, node),
            NodeKind::StaticCall => self.visit_static_call(context, node),
            NodeKind::New => self.visit_new(context, node),

            NodeKind::Prop => self.visit_property_access(context, node),
            NodeKind::StaticProp => self.visit_static_property_access(context, node),
            NodeKind::ClassConst => self.visit_class_constant_access(context, node),

            NodeKind::CloneExpr => {
                // Cloning yields an instance of the same class.
                let operand = node.child(0).map(|child| self.union_type_or_empty(context, child));
                Ok(operand.unwrap_or_default())
            }
            NodeKind::Instanceof | NodeKind::IssetExpr | NodeKind::EmptyExpr => {
                if let Some(operand) = node.child(0) {
                    let _ = self.union_type_or_empty(context, operand);
                }
                Ok(UnionType::of_native(NativeType::Bool))
            }
            NodeKind::PreInc | NodeKind::PreDec | NodeKind::PostInc | NodeKind::PostDec => {
                let operand = node.child(0).map(|child| self.union_type_or_empty(context, child)).unwrap_or_default();
                Ok(if operand.has_native(NativeType::Float) {
                    UnionType::of_native(NativeType::Float)
                } else {
                    UnionType::of_native(NativeType::Int)
                })
            }
            NodeKind::Yield => Ok(UnionType::empty()),
            NodeKind::MagicConst => Ok(if node.flags == flags::MAGIC_LINE {
                UnionType::of_native(NativeType::Int)
            } else {
                UnionType::of_native(NativeType::String)
            }),
            NodeKind::Closure => self.visit_closure(context, node),

            _ => Ok(UnionType::empty()),
        }
    }

    /// Infers an expression, applying the interrupt propagation policy.
    ///
    /// `Raise` is emitted to the collector; `MissingSymbol` and shape
    /// errors are swallowed; `Unanalyzable` emits its single low-severity
    /// diagnostic. The visitor then continues with the empty union as a
    /// safe default.
    pub(crate) fn union_type_or_empty(&mut self, context: &Context, node: &Node) -> UnionType {
        match self.union_type_of(context, node) {
            Ok(union) => union,
            Err(AnalysisInterrupt::Raise(instance)) => {
                self.emit_instance(context, *instance);
                UnionType::empty()
            }
            Err(AnalysisInterrupt::MissingSymbol(_) | AnalysisInterrupt::NodeShape(_)) => UnionType::empty(),
            Err(AnalysisInterrupt::Unanalyzable) => {
                self.emit(context, IssueKind::Unanalyzable, node.line, vec![]);
                UnionType::empty()
            }
        }
    }

    /// Variable reference: scope binding, superglobal fallback, then the
    /// undeclared-variable diagnostic.
    fn visit_variable(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(name) = node.name else {
            // Variable-variables are unanalyzable.
            return Err(NodeShapeError { expected: "variable name", line: node.line }.into());
        };

        if let Some(variable) = context.scope.get_variable(name) {
            return Ok(variable.union_type.clone());
        }

        if let Some(union) = superglobal_union_type(name) {
            return Ok(union);
        }
        if self.settings.runkit_superglobals.iter().any(|candidate| candidate == name.as_str()) {
            return Ok(UnionType::of_native(NativeType::Mixed));
        }
        if let Some(type_string) = self.settings.globals_type_map.get(name.as_str()) {
            return Ok(UnionType::from_string_in_context(type_string, &context.names, &context.template_names));
        }

        if context.is_in_global_scope() && self.settings.ignore_undeclared_variables_in_global_scope {
            return Ok(UnionType::empty());
        }

        Err(IssueInstance::new(IssueKind::UndeclaredVariable, context.file, node.line, vec![name.to_string()]).into())
    }

    /// A bare name in expression position is a constant fetch.
    fn visit_constant_name(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(name) = node.name else {
            return Ok(UnionType::empty());
        };

        match name.as_str() {
            "true" | "false" => return Ok(UnionType::of_native(NativeType::Bool)),
            "null" => return Ok(UnionType::of_native(NativeType::Null)),
            _ => {}
        }

        let fully_qualified = node.has_flag(flags::NAME_FULLY_QUALIFIED);
        let resolved = context.names.resolve_constant(&name, fully_qualified);
        let fqsen = augur_codex::fqsen::ConstantFqsen::from_full_name(&resolved);

        if let Ok(constant) = self.codebase.get_constant_by_fqsen(fqsen) {
            let union = constant.union_type.clone();
            self.codebase
                .get_constant_by_fqsen_mut(fqsen)
                .expect("constant just resolved")
                .add_reference(context.file, node.line);
            return Ok(union);
        }

        // Unqualified constants fall back to the global namespace.
        if !fully_qualified && !name.as_str().contains('\\') {
            let global = augur_codex::fqsen::ConstantFqsen::new(augur_codex::fqsen::root_namespace(), name);
            if let Ok(constant) = self.codebase.get_constant_by_fqsen(global) {
                return Ok(constant.union_type.clone());
            }
        }

        Err(IssueInstance::new(IssueKind::UndeclaredConstant, context.file, node.line, vec![resolved.to_string()])
            .into())
    }

    /// Array literal inference samples up to the first five elements; a
    /// homogeneous sample infers `T[]`, anything else plain `array`.
    fn visit_array_literal(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let mut element_union: Option<UnionType> = None;

        for element in node.children.iter().take(5) {
            if element.kind != NodeKind::ArrayElem {
                continue;
            }
            let value_union = match element.child(0) {
                Some(value) => self.union_type_or_empty(context, value),
                None => continue,
            };

            match &element_union {
                None => element_union = Some(value_union),
                Some(existing) if *existing == value_union => {}
                Some(_) => return Ok(UnionType::of_native(NativeType::Array)),
            }
        }

        Ok(match element_union {
            Some(union) if !union.is_empty() => union.as_generic_array_types(),
            _ => UnionType::of_native(NativeType::Array),
        })
    }

    fn visit_dim(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(target) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        if let Some(index) = node.child(1) {
            let _ = self.union_type_or_empty(context, index);
        }

        let target_union = self.union_type_or_empty(context, target);

        // Indexing something that is provably not an array or string is
        // suspicious; unknowns pass silently.
        let indexable = target_union.is_empty()
            || target_union.types().iter().any(|t| {
                t.is_array_like()
                    || t.is_native(NativeType::String)
                    || t.is_native(NativeType::Mixed)
                    || t.is_native(NativeType::Null)
            });
        if !indexable {
            self.emit(context, IssueKind::TypeArraySuspicious, node.line, vec![target_union.to_string()]);
        }

        Ok(target_union.generic_array_element_types())
    }

    fn visit_unary_operator(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let operand = node.child(0).map(|child| self.union_type_or_empty(context, child)).unwrap_or_default();

        Ok(match node.flags {
            flags::UNARY_BOOL_NOT => UnionType::of_native(NativeType::Bool),
            flags::UNARY_BITWISE_NOT => UnionType::of_native(NativeType::Int),
            flags::UNARY_MINUS | flags::UNARY_PLUS => {
                if operand.has_native(NativeType::Float) {
                    UnionType::of_native(NativeType::Float)
                } else if operand.has_native(NativeType::Int) {
                    UnionType::of_native(NativeType::Int)
                } else {
                    UnionType::from_types([Type::Native(NativeType::Int), Type::Native(NativeType::Float)])
                }
            }
            flags::UNARY_SILENCE => operand,
            _ => UnionType::empty(),
        })
    }

    fn visit_cast(&mut self, context: &Context, node: &Node) -> UnionType {
        if let Some(operand) = node.child(0) {
            let operand_union = self.union_type_or_empty(context, operand);
            if node.flags == flags::CAST_STRING && operand_union.types().iter().any(Type::is_array_like) {
                self.emit(context, IssueKind::TypeConversionFromArray, node.line, vec!["string".to_string()]);
            }
        }

        match node.flags {
            flags::CAST_ARRAY => UnionType::of_native(NativeType::Array),
            flags::CAST_BOOL => UnionType::of_native(NativeType::Bool),
            flags::CAST_FLOAT => UnionType::of_native(NativeType::Float),
            flags::CAST_INT => UnionType::of_native(NativeType::Int),
            flags::CAST_OBJECT => UnionType::of_native(NativeType::Object),
            flags::CAST_STRING => UnionType::of_native(NativeType::String),
            flags::CAST_UNSET => UnionType::of_native(NativeType::Null),
            _ => UnionType::empty(),
        }
    }

    /// `c ? t : e` — the union of both sides' types, with the condition
    /// narrowing applied to the true branch. If exactly one side is empty,
    /// `mixed` joins the union; both empty stays empty.
    fn visit_conditional(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let Some(condition) = node.child(0) else {
            return Ok(UnionType::empty());
        };
        let _ = self.union_type_or_empty(context, condition);

        let narrowed = self.narrow_condition(context, condition);
        let then_union = match node.child(1) {
            // Short ternary: the condition's value is the result.
            None => self.union_type_or_empty(&narrowed, condition),
            Some(then_branch) => self.union_type_or_empty(&narrowed, then_branch),
        };
        let else_union = node.child(2).map(|child| self.union_type_or_empty(context, child)).unwrap_or_default();

        let mut result = then_union.clone();
        result.add_union(&else_union);
        if then_union.is_empty() != else_union.is_empty() {
            result.add_type(Type::Native(NativeType::Mixed));
        }

        Ok(result)
    }

    /// A closure expression types as a callable bound to its FQSEN; the
    /// body is analyzed here, in a closed scope capturing `use` variables.
    fn visit_closure(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let fqsen = FunctionFqsen::for_closure(context.file, node.line);
        self.analyze_closure_body(context, node, fqsen);

        Ok(UnionType::of(Type::ClosureCallable(fqsen)))
    }

    /// Resolves a class-name node in expression position, handling the
    /// `self` / `static` / `parent` keywords.
    pub(crate) fn class_fqsen_of_name(&mut self, context: &Context, node: &Node) -> AnalysisResult<ClassFqsen> {
        let Some(name) = node.name else {
            return Err(NodeShapeError { expected: "class name", line: node.line }.into());
        };

        match name.as_str() {
            "self" | "static" => context.class_fqsen.ok_or_else(|| {
                AnalysisInterrupt::from(IssueInstance::new(
                    IssueKind::ContextNotObject,
                    context.file,
                    node.line,
                    vec![name.to_string()],
                ))
            }),
            "parent" => {
                let Some(class_fqsen) = context.class_fqsen else {
                    return Err(IssueInstance::new(
                        IssueKind::ContextNotObject,
                        context.file,
                        node.line,
                        vec![name.to_string()],
                    )
                    .into());
                };
                let class = self.codebase.get_class_by_fqsen(class_fqsen)?;
                if class.is_trait() {
                    return Err(IssueInstance::new(
                        IssueKind::TraitParentReference,
                        context.file,
                        node.line,
                        vec![class_fqsen.to_atom().to_string()],
                    )
                    .into());
                }
                class.parent.ok_or_else(|| {
                    AnalysisInterrupt::from(IssueInstance::new(
                        IssueKind::ParentlessClass,
                        context.file,
                        node.line,
                        vec![class_fqsen.to_atom().to_string()],
                    ))
                })
            }
            _ => {
                let fully_qualified = node.has_flag(flags::NAME_FULLY_QUALIFIED);
                Ok(ClassFqsen::from_full_name(&context.names.resolve_class(&name, fully_qualified)))
            }
        }
    }

    /// The `__get` return type, when the class declares the magic getter.
    pub(crate) fn magic_getter_union(&self, fqsen: ClassFqsen) -> Option<UnionType> {
        let class = self.codebase.get_class_by_fqsen(fqsen).ok()?;
        let getter = class.get_method("__get")?;
        Some(if getter.union_type.is_empty() {
            UnionType::of_native(NativeType::Mixed)
        } else {
            getter.union_type.clone()
        })
    }
}

/// The open-shape standard class: any property may be written onto it.
pub(crate) fn is_open_shape_class(fqsen: ClassFqsen) -> bool {
    fqsen.names_same_class(ClassFqsen::from_full_name("\\stdClass"))
}

/// The name atom of a member-name node, when it is static.
pub(crate) fn member_name_of(node: &Node) -> AnalysisResult<augur_atom::Atom> {
    if node.kind == NodeKind::Name
        && let Some(name) = node.name
    {
        return Ok(name);
    }
    if node.kind == NodeKind::Literal
        && let Some(value) = node.string_value()
    {
        return Ok(atom(value));
    }
    Err(NodeShapeError { expected: "member name", line: node.line }.into())
}

/// The property name of a static-property access: `\A::$prop` carries the
/// name on a variable node.
pub(crate) fn static_property_name_of(node: &Node) -> AnalysisResult<augur_atom::Atom> {
    if matches!(node.kind, NodeKind::Var | NodeKind::Name)
        && let Some(name) = node.name
    {
        return Ok(name);
    }

    Err(NodeShapeError { expected: "static property name", line: node.line }.into())
}

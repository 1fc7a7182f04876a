//! Condition narrowing.
//!
//! Produces the context for the *true* branch of an `if` or ternary guard;
//! the false branch keeps the outer context. Recognized shapes:
//! `$v instanceof ClassName`, `is_<native>($v)`, and `empty($v)`.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::flags;
use augur_atom::Atom;

use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;

use crate::Analyzer;
use crate::context::Context;
use crate::context::scope::Variable;

impl Analyzer<'_> {
    /// Narrows variable types under the assumption the condition holds.
    pub(crate) fn narrow_condition(&mut self, context: &Context, condition: &Node) -> Context {
        match condition.kind {
            NodeKind::Instanceof => self.narrow_instanceof(context, condition),
            NodeKind::Call => self.narrow_type_assertion_call(context, condition),
            NodeKind::EmptyExpr => self.narrow_empty(context, condition),
            NodeKind::BinaryOp if condition.flags == flags::BINARY_BOOL_AND => {
                // Both conjuncts hold on the true path.
                let narrowed = match condition.child(0) {
                    Some(left) => self.narrow_condition(context, left),
                    None => context.clone(),
                };
                match condition.child(1) {
                    Some(right) => self.narrow_condition(&narrowed, right),
                    None => narrowed,
                }
            }
            _ => context.clone(),
        }
    }

    /// `$v instanceof ClassName` narrows `$v` to the class type.
    fn narrow_instanceof(&mut self, context: &Context, condition: &Node) -> Context {
        let Some(variable) = condition.child(0) else {
            return context.clone();
        };
        let Some(class_node) = condition.child(1) else {
            return context.clone();
        };
        let Some(name) = variable_name(variable) else {
            return context.clone();
        };

        let Ok(class_fqsen) = self.class_fqsen_of_name(context, class_node) else {
            return context.clone();
        };

        let mut scope = context.scope.clone();
        scope.set_variable(Variable::new(name, UnionType::of(Type::class(class_fqsen))));
        context.with_scope(scope)
    }

    /// `is_<native>($v)` overwrites `$v` with the asserted union; a generic
    /// array surviving an `is_array` check is unioned, not overwritten.
    fn narrow_type_assertion_call(&mut self, context: &Context, condition: &Node) -> Context {
        let Some(target) = condition.child(0) else {
            return context.clone();
        };
        let Some(function_name) = target.name.filter(|_| target.kind == NodeKind::Name) else {
            return context.clone();
        };
        let Some(variable) = condition.child(1).and_then(|arguments| arguments.child(0)) else {
            return context.clone();
        };
        let Some(name) = variable_name(variable) else {
            return context.clone();
        };

        let asserted = match function_name.as_str() {
            "is_int" | "is_integer" | "is_long" => UnionType::of_native(NativeType::Int),
            "is_string" => UnionType::of_native(NativeType::String),
            "is_bool" => UnionType::of_native(NativeType::Bool),
            "is_float" | "is_double" => UnionType::of_native(NativeType::Float),
            "is_array" => UnionType::of_native(NativeType::Array),
            "is_object" => UnionType::of_native(NativeType::Object),
            "is_callable" => UnionType::of_native(NativeType::Callable),
            "is_null" => UnionType::of_native(NativeType::Null),
            "is_resource" => UnionType::of_native(NativeType::Resource),
            "is_numeric" => UnionType::from_types([
                Type::Native(NativeType::Int),
                Type::Native(NativeType::Float),
                Type::Native(NativeType::String),
            ]),
            _ => return context.clone(),
        };

        let mut scope = context.scope.clone();
        let existing = scope.get_variable(name).map(|variable| variable.union_type.clone());

        let narrowed = match existing {
            Some(existing)
                if function_name.as_str() == "is_array"
                    && existing.types().iter().any(|t| matches!(t, Type::GenericArray(_))) =>
            {
                let mut union = existing;
                union.add_union(&asserted);
                union
            }
            _ => asserted,
        };

        scope.set_variable(Variable::new(name, narrowed));
        context.with_scope(scope)
    }

    /// On the true path of `empty($v)` the variable may be unset entirely;
    /// it is (re)defined with `null` in its union.
    fn narrow_empty(&mut self, context: &Context, condition: &Node) -> Context {
        let Some(variable) = condition.child(0) else {
            return context.clone();
        };
        let Some(name) = variable_name(variable) else {
            return context.clone();
        };

        let mut scope = context.scope.clone();
        let mut union = scope.get_variable(name).map(|variable| variable.union_type.clone()).unwrap_or_default();
        union.add_type(Type::Native(NativeType::Null));
        scope.set_variable(Variable::new(name, union));
        context.with_scope(scope)
    }
}

fn variable_name(node: &Node) -> Option<Atom> {
    if node.kind == NodeKind::Var { node.name } else { None }
}

//! The assignment visitor: the left-hand side of `=`.
//!
//! Parameterized by the assignment node, the inferred right-hand union, and
//! an is-dim flag threaded through `$x[...] = v` recursion. Returns the
//! context carrying the updated scope; property writes additionally
//! validate and widen the property's union on the codebase.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_atom::atom;

use augur_codex::fqsen::ClassElementFqsen;
use augur_codex::metadata::flags::MetadataFlags;
use augur_codex::metadata::property::PropertyMetadata;
use augur_codex::ttype::NativeType;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::context::scope::Variable;
use crate::context::scope::is_superglobal;
use crate::expression::is_open_shape_class;
use crate::expression::member_name_of;
use crate::expression::static_property_name_of;

impl Analyzer<'_> {
    /// Analyzes an `Assign` / `AssignRef` / `AssignOp` statement-expression
    /// and returns the post-assignment context.
    pub(crate) fn analyze_assignment(&mut self, context: Context, node: &Node) -> Context {
        let Some(lhs) = node.child(0) else {
            return context;
        };
        let Some(rhs) = node.child(1) else {
            return context;
        };

        let right = match node.kind {
            // Known not to infer through reference assignments; the target
            // is bound with an empty union.
            NodeKind::AssignRef => {
                let _ = self.union_type_or_empty(&context, rhs);
                UnionType::empty()
            }
            NodeKind::AssignOp => {
                let left_union = self.union_type_or_empty(&context, lhs);
                let right_union = self.union_type_or_empty(&context, rhs);
                self.binary_operator_result(&context, node, &left_union, &right_union)
            }
            _ => {
                let right = self.union_type_or_empty(&context, rhs);
                if right.has_native(NativeType::Void) {
                    self.emit(&context, IssueKind::TypeVoidAssignment, node.line, vec![]);
                }
                right
            }
        };

        self.assign(context, lhs, right, false)
    }

    /// Applies one assignment target.
    pub(crate) fn assign(&mut self, context: Context, target: &Node, right: UnionType, is_dim: bool) -> Context {
        match target.kind {
            NodeKind::Var => self.assign_variable(context, target, right, is_dim),
            NodeKind::Dim => self.assign_dim(context, target, right),
            NodeKind::ListExpr => self.assign_list(context, target, right),
            NodeKind::Prop => {
                self.assign_property(&context, target, right);
                context
            }
            // Dispatches through the plain-variable path; the class scope
            // is not consulted. Known limitation.
            NodeKind::StaticProp => self.assign_static_property(context, target, right),
            _ => context,
        }
    }

    fn assign_variable(&mut self, context: Context, target: &Node, right: UnionType, is_dim: bool) -> Context {
        let Some(name) = target.name else {
            return context;
        };

        let mut scope = context.scope.clone();
        match scope.get_variable(name) {
            Some(existing) if is_dim => {
                let mut updated = existing.clone();
                updated.union_type.add_union(&right);
                scope.set_variable(updated);
            }
            Some(existing) if existing.flags.is_by_reference() => {
                // A by-reference parameter keeps its binding; only the type
                // is replaced.
                let mut updated = existing.clone();
                updated.union_type = right;
                scope.set_variable(updated);
            }
            _ => {
                scope.set_variable(Variable::new(name, right));
            }
        }

        context.with_scope(scope)
    }

    /// `$x[k] = v`: the right side is wrapped as an array element type and
    /// the base expression re-enters the visitor with is-dim set.
    fn assign_dim(&mut self, context: Context, target: &Node, right: UnionType) -> Context {
        let Some(base) = target.child(0) else {
            return context;
        };
        if let Some(index) = target.child(1) {
            let _ = self.union_type_or_empty(&context, index);
        }

        // Writing a key of `$GLOBALS` defines the global variable.
        if base.kind == NodeKind::Var
            && base.name.is_some_and(|name| name.as_str() == "GLOBALS")
            && let Some(index) = target.child(1)
            && let Some(global_name) = index.string_value()
        {
            let global_name = atom(global_name);
            if is_superglobal(global_name) {
                return context;
            }

            let mut scope = context.scope.clone();
            scope.set_variable(Variable::new(global_name, right));
            return context.with_scope(scope);
        }

        let wrapped = right.as_generic_array_types();
        self.assign(context, base, wrapped, true)
    }

    /// List destructuring broadcasts the element type to every target.
    fn assign_list(&mut self, context: Context, target: &Node, right: UnionType) -> Context {
        let element = right.generic_array_element_types();

        let mut context = context;
        for child in &target.children {
            if child.is_missing() {
                continue;
            }
            context = self.assign(context, child, element.clone(), false);
        }
        context
    }

    /// `$obj->prop = v`: validate against the declared union, then widen
    /// the property with the observed write.
    fn assign_property(&mut self, context: &Context, target: &Node, right: UnionType) {
        let Some(object) = target.child(0) else {
            return;
        };
        let Some(property_node) = target.child(1) else {
            return;
        };

        let object_union = self.union_type_or_empty(context, object);
        let Ok(property_name) = member_name_of(property_node) else {
            return;
        };

        let class_fqsens = object_union.class_fqsens();
        if class_fqsens.is_empty() {
            return;
        }

        for class_fqsen in &class_fqsens {
            let Ok(class) = self.codebase.get_class_by_fqsen(*class_fqsen) else {
                continue;
            };
            let Some(property) = class.properties.get(&property_name) else {
                continue;
            };

            let declared = property.union_type.clone();
            if !declared.is_empty()
                && !right.is_empty()
                && !right.as_expanded_types(self.codebase).can_cast_to_union(&declared, self.codebase)
            {
                self.emit(
                    context,
                    IssueKind::TypeMismatchProperty,
                    target.line,
                    vec![
                        right.to_string(),
                        format!("{}::{}", class_fqsen.with_alternate(0).to_atom(), property_name),
                        declared.to_string(),
                    ],
                );
                return;
            }

            // A provable write widens the property's union.
            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(*class_fqsen)
                && let Some(property) = class.properties.get_mut(&property_name)
            {
                property.union_type.add_union(&right);
                property.add_reference(context.file, target.line);
            }
            return;
        }

        // No declaration anywhere: synthesize when the class opts into
        // dynamic shapes, report otherwise.
        let first = class_fqsens[0];
        if self.settings.allow_missing_properties || is_open_shape_class(first) {
            if let Ok(class) = self.codebase.get_class_by_fqsen_mut(first) {
                let fqsen = ClassElementFqsen::new(first, property_name);
                let mut property = PropertyMetadata::new(fqsen, context.file, target.line);
                property.flags |= MetadataFlags::DYNAMIC;
                property.union_type = right;
                class.add_property(property);
            }
            return;
        }

        self.emit(
            context,
            IssueKind::UndeclaredProperty,
            target.line,
            vec![format!("{}->{}", first.to_atom(), property_name)],
        );
    }

    fn assign_static_property(&mut self, context: Context, target: &Node, right: UnionType) -> Context {
        let Some(property_node) = target.child(1) else {
            return context;
        };
        let Ok(name) = static_property_name_of(property_node) else {
            return context;
        };

        let variable_node = Node::new(NodeKind::Var, property_node.line).with_name(name);
        self.assign_variable(context, &variable_node, right, false)
    }
}

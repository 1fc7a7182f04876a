//! The statement walk of the analysis pass.
//!
//! Statements thread a [`Context`] through the file: declarations open
//! scopes, assignments and narrowing update them, and branching constructs
//! clone the scope per path and merge the results.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::Value;
use augur_ast::flags;
use augur_atom::AtomSet;
use augur_atom::atom;
use augur_atom::concat_atom;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::ClassElementFqsen;
use augur_codex::fqsen::FunctionFqsen;
use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::metadata::function_like::FunctionLikeMetadata;
use augur_codex::names::UseKind;
use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::context::scope::Scope;
use crate::context::scope::Variable;
use crate::merge::merge_branch_scopes;
use crate::merge::merge_try_scopes;

impl Analyzer<'_> {
    /// Analyzes one statement, returning the context the next statement
    /// sees.
    pub(crate) fn analyze_statement(&mut self, context: Context, node: &Node) -> Context {
        match node.kind {
            NodeKind::StmtList => {
                let mut context = context;
                for child in &node.children {
                    context = self.analyze_statement(context, child);
                }
                context
            }

            NodeKind::Namespace => self.analyze_namespace(context, node),
            NodeKind::UseDecl => self.analyze_use(context, node, None),
            NodeKind::GroupUseDecl => {
                let prefix = node.name;
                self.analyze_use(context, node, prefix)
            }
            NodeKind::Declare => {
                if node.name.is_some_and(|name| name.as_str() == "strict_types") {
                    let enabled = matches!(&node.value, Some(Value::Int(1)));
                    return context.with_strict_types(enabled);
                }
                context
            }

            NodeKind::ClassDecl => {
                self.analyze_class_declaration(&context, node);
                context
            }
            NodeKind::FunctionDecl => {
                self.analyze_function_declaration(&context, node);
                context
            }

            NodeKind::If => self.analyze_if(context, node),
            NodeKind::While => self.analyze_loop(context, node.child(0), &[node.child(1)]),
            NodeKind::DoWhile => self.analyze_loop(context, node.child(1), &[node.child(0)]),
            NodeKind::For => {
                let mut context = context;
                if let Some(init) = node.child(0) {
                    context = self.analyze_expression_list(context, init);
                }
                self.analyze_loop(context, node.child(1), &[node.child(3)])
            }
            NodeKind::Foreach => self.analyze_foreach(context, node),
            NodeKind::Switch => self.analyze_switch(context, node),
            NodeKind::Try => self.analyze_try(context, node),

            NodeKind::Return => {
                if let Some(expression) = node.child(0) {
                    let returned = self.union_type_or_empty(&context, expression);
                    self.check_return_type(&context, node, &returned);
                }
                context
            }
            NodeKind::Throw | NodeKind::Echo => {
                for child in &node.children {
                    let union = self.union_type_or_empty(&context, child);
                    if node.kind == NodeKind::Echo && !union.is_empty() && union.types().iter().all(Type::is_array_like)
                    {
                        self.emit(&context, IssueKind::TypeConversionFromArray, child.line, vec!["string".to_string()]);
                    }
                }
                context
            }

            NodeKind::Global => {
                let mut scope = context.scope.clone();
                for child in &node.children {
                    let Some(name) = child.name.filter(|_| child.kind == NodeKind::Var) else {
                        continue;
                    };
                    let union = match self.settings.globals_type_map.get(name.as_str()) {
                        Some(type_string) => {
                            UnionType::from_string_in_context(type_string, &context.names, &context.template_names)
                        }
                        None => UnionType::of_native(NativeType::Mixed),
                    };
                    scope.set_variable(Variable::new(name, union));
                }
                context.with_scope(scope)
            }
            NodeKind::StaticVar => {
                let Some(name) = node.name else {
                    return context;
                };
                let union = node
                    .child(0)
                    .map(|default| self.union_type_or_empty(&context, default))
                    .unwrap_or_else(|| UnionType::of_native(NativeType::Null));

                let mut scope = context.scope.clone();
                scope.set_variable(Variable::new(name, union));
                context.with_scope(scope)
            }

            NodeKind::ExprStmt => self.analyze_expression_statement(context, node),

            NodeKind::Break | NodeKind::Continue => context,

            _ => context,
        }
    }

    fn analyze_namespace(&mut self, context: Context, node: &Node) -> Context {
        let namespace = node.name.unwrap_or_else(|| atom(""));
        match node.child(0) {
            Some(body) => {
                let scoped = context.with_names(context.names.with_namespace(namespace));
                self.analyze_statement(scoped, body);
                context
            }
            None => context.with_names(context.names.with_namespace(namespace)),
        }
    }

    /// The analysis-pass twin of the scanner's `use` handling; `use` shows
    /// up again because the second walk re-reads every file.
    fn analyze_use(&mut self, context: Context, node: &Node, prefix: Option<augur_atom::Atom>) -> Context {
        let kind = if node.has_flag(flags::USE_FUNCTION) {
            UseKind::Function
        } else if node.has_flag(flags::USE_CONST) {
            UseKind::Constant
        } else {
            UseKind::Normal
        };

        let mut names = context.names.clone();
        for element in &node.children {
            if element.kind != NodeKind::UseElem {
                continue;
            }
            let Some(target) = element.name else {
                continue;
            };
            let target = match prefix {
                Some(prefix) => concat_atom!(prefix, "\\", target),
                None => target,
            };
            let alias = element.child(0).and_then(Node::name);
            names.add_use(kind, target, alias);
        }

        context.with_names(names)
    }

    /// Enters a class declaration: a class scope with `$this`, the class's
    /// template identifiers, and its suppression list.
    fn analyze_class_declaration(&mut self, context: &Context, node: &Node) {
        let Some(name) = node.name else {
            return;
        };
        let base = declared_class_fqsen(context, name);
        let Some(fqsen) = self.find_declared_class(base, context.file, node.line) else {
            return;
        };

        let (templates, suppressions) = match self.codebase.get_class_by_fqsen(fqsen) {
            Ok(class) => (class.template_name_set(), class.suppressions.clone()),
            Err(_) => (AtomSet::default(), Vec::new()),
        };

        let class_context = context
            .with_class(fqsen)
            .with_scope(Scope::for_class(fqsen))
            .with_template_names(templates)
            .with_suppressions(&suppressions);

        let Some(body) = node.raw_child(3) else {
            return;
        };
        for member in &body.children {
            if member.kind == NodeKind::MethodDecl
                && let Some(method_name) = member.name
            {
                let method_fqsen = FunctionLikeFqsen::Method(ClassElementFqsen::new(fqsen, method_name));
                self.analyze_function_like(&class_context, member, method_fqsen);
            }
        }
    }

    fn analyze_function_declaration(&mut self, context: &Context, node: &Node) {
        let Some(name) = node.name else {
            return;
        };
        let base = FunctionFqsen::new(context.names.namespace, name);
        let Some(fqsen) = self.find_declared_function(base, context.file, node.line) else {
            return;
        };

        self.analyze_function_like(context, node, FunctionLikeFqsen::Function(fqsen));
    }

    /// Opens the closed scope of a function-like body and analyzes it.
    pub(crate) fn analyze_function_like(&mut self, context: &Context, node: &Node, fqsen: FunctionLikeFqsen) {
        let Some(metadata) = self.function_like_metadata(fqsen).cloned() else {
            return;
        };

        let mut scope = Scope::for_function_like();
        if let FunctionLikeFqsen::Method(member) = fqsen
            && !metadata.flags.is_static()
        {
            scope.set_variable(Variable::new(atom("this"), UnionType::of(Type::class(member.class))));
        }
        for parameter in &metadata.parameters {
            let mut variable = Variable::new(parameter.name, parameter.union_type.clone());
            if parameter.flags.is_by_reference() {
                variable.flags |= augur_codex::metadata::flags::MetadataFlags::BY_REFERENCE;
            }
            scope.set_variable(variable);
        }

        self.check_parameter_defaults(context, node, &metadata);

        let body_slot = if node.kind == NodeKind::Closure { 2 } else { 1 };
        let Some(body) = node.child(body_slot) else {
            return;
        };

        let body_context = context
            .with_function(fqsen)
            .with_scope(scope)
            .with_suppressions(&metadata.suppressions);
        self.analyze_statement(body_context, body);

        // Declared a return type, never yields, and the body has no return
        // statement at all.
        let declared = &metadata.union_type;
        if !declared.is_empty()
            && !metadata.flags.has_yield()
            && !declared.has_native(NativeType::Void)
            && !declared.has_native(NativeType::Null)
            && !declared.has_native(NativeType::Mixed)
            && !body_has_return(body)
        {
            self.emit(
                context,
                IssueKind::TypeMissingReturn,
                node.line,
                vec![fqsen.to_atom().to_string(), declared.to_string()],
            );
        }
    }

    /// Closure bodies are analyzed where the closure appears, capturing
    /// `use` variables from the enclosing scope into the closed one.
    pub(crate) fn analyze_closure_body(&mut self, context: &Context, node: &Node, fqsen: FunctionFqsen) {
        let Ok(metadata) = self.codebase.get_function_by_fqsen(fqsen) else {
            return;
        };
        let metadata = metadata.clone();

        let mut scope = Scope::for_function_like();
        for parameter in &metadata.parameters {
            scope.set_variable(Variable::new(parameter.name, parameter.union_type.clone()));
        }
        if let Some(uses) = node.raw_child(1) {
            for captured in &uses.children {
                let Some(name) = captured.name.filter(|_| captured.kind == NodeKind::ClosureUseVar) else {
                    continue;
                };
                let union =
                    context.scope.get_variable(name).map(|variable| variable.union_type.clone()).unwrap_or_default();
                scope.set_variable(Variable::new(name, union));
            }
        }
        if context.is_in_class_scope()
            && let Some(this) = context.scope.get_variable(atom("this"))
        {
            scope.set_variable(this.clone());
        }

        let Some(body) = node.child(2) else {
            return;
        };
        let body_context = context
            .with_function(FunctionLikeFqsen::Closure(fqsen))
            .with_scope(scope)
            .with_suppressions(&metadata.suppressions);
        self.analyze_statement(body_context, body);
    }

    fn analyze_if(&mut self, context: Context, node: &Node) -> Context {
        let mut branch_scopes = Vec::new();
        let mut has_else = false;

        for element in &node.children {
            if element.kind != NodeKind::IfElem {
                continue;
            }

            let branch_context = match element.child(0) {
                Some(condition) => {
                    let _ = self.union_type_or_empty(&context, condition);
                    self.narrow_condition(&context, condition)
                }
                None => {
                    has_else = true;
                    context.clone()
                }
            };

            let branch_context = branch_context.with_scope(branch_context.scope.branch_clone());
            let out = match element.child(1) {
                Some(body) => self.analyze_statement(branch_context, body),
                None => branch_context,
            };
            branch_scopes.push(out.scope);
        }

        // Without an `else`, fall-through is a path of its own.
        if !has_else {
            branch_scopes.push(context.scope.clone());
        }

        let merged = merge_branch_scopes(&context.scope, &branch_scopes, context.strict_types);
        context.with_scope(merged)
    }

    /// Loop bodies may run zero times: the body's scope merges against the
    /// fall-through scope like an `if` without `else`.
    fn analyze_loop(&mut self, context: Context, condition: Option<&Node>, bodies: &[Option<&Node>]) -> Context {
        let branch_context = match condition {
            Some(condition) => {
                let _ = self.union_type_or_empty(&context, condition);
                self.narrow_condition(&context, condition)
            }
            None => context.clone(),
        };

        let mut body_context = branch_context.with_scope(branch_context.scope.branch_clone());
        for body in bodies.iter().flatten() {
            body_context = self.analyze_statement(body_context, body);
        }

        let merged =
            merge_branch_scopes(&context.scope, &[body_context.scope, context.scope.clone()], context.strict_types);
        context.with_scope(merged)
    }

    fn analyze_foreach(&mut self, context: Context, node: &Node) -> Context {
        let Some(iterable) = node.child(0) else {
            return context;
        };
        let iterable_union = self.union_type_or_empty(&context, iterable);

        if !iterable_union.is_empty()
            && !iterable_union.types().iter().any(|t| {
                t.is_array_like()
                    || t.is_native(NativeType::Mixed)
                    || matches!(t, Type::ClassInstance { .. })
            })
        {
            self.emit(&context, IssueKind::TypeMismatchForeach, node.line, vec![iterable_union.to_string()]);
        }

        let element_union = iterable_union.generic_array_element_types();
        let mut body_context = context.with_scope(context.scope.branch_clone());

        if let Some(value_target) = node.child(1) {
            body_context = self.assign(body_context, value_target, element_union, false);
        }
        if let Some(key_target) = node.child(2) {
            let key_union =
                UnionType::from_types([Type::Native(NativeType::Int), Type::Native(NativeType::String)]);
            body_context = self.assign(body_context, key_target, key_union, false);
        }

        if let Some(body) = node.child(3) {
            body_context = self.analyze_statement(body_context, body);
        }

        let merged =
            merge_branch_scopes(&context.scope, &[body_context.scope, context.scope.clone()], context.strict_types);
        context.with_scope(merged)
    }

    fn analyze_switch(&mut self, context: Context, node: &Node) -> Context {
        if let Some(condition) = node.child(0) {
            let _ = self.union_type_or_empty(&context, condition);
        }

        let mut branch_scopes = Vec::new();
        let mut has_default = false;

        if let Some(cases) = node.child(1) {
            for case in &cases.children {
                if case.kind != NodeKind::SwitchCase {
                    continue;
                }
                if case.child(0).is_none() {
                    has_default = true;
                } else if let Some(value) = case.child(0) {
                    let _ = self.union_type_or_empty(&context, value);
                }

                let branch_context = context.with_scope(context.scope.branch_clone());
                let out = match case.child(1) {
                    Some(body) => self.analyze_statement(branch_context, body),
                    None => branch_context,
                };
                branch_scopes.push(out.scope);
            }
        }

        if !has_default {
            branch_scopes.push(context.scope.clone());
        }

        let merged = merge_branch_scopes(&context.scope, &branch_scopes, context.strict_types);
        context.with_scope(merged)
    }

    fn analyze_try(&mut self, context: Context, node: &Node) -> Context {
        let try_context = context.with_scope(context.scope.branch_clone());
        let try_out = match node.child(0) {
            Some(body) => self.analyze_statement(try_context, body),
            None => context.clone(),
        };

        let mut catch_scopes = Vec::new();
        if let Some(catches) = node.child(1) {
            for catch in &catches.children {
                if catch.kind != NodeKind::Catch {
                    continue;
                }

                let mut catch_context = context.with_scope(context.scope.branch_clone());

                // The caught variable is typed with the listed exception
                // classes.
                if let Some(variable) = catch.child(1)
                    && let Some(name) = variable.name
                {
                    let mut union = UnionType::empty();
                    if let Some(types) = catch.child(0) {
                        for exception in &types.children {
                            if let Ok(fqsen) = self.class_fqsen_of_name(&catch_context, exception) {
                                union.add_type(Type::class(fqsen));
                            }
                        }
                    }

                    let mut scope = catch_context.scope.clone();
                    scope.set_variable(Variable::new(name, union));
                    catch_context = catch_context.with_scope(scope);
                }

                let out = match catch.child(2) {
                    Some(body) => self.analyze_statement(catch_context, body),
                    None => catch_context,
                };
                catch_scopes.push(out.scope);
            }
        }

        let finally_scope = node.child(2).map(|finally_body| {
            let finally_context = context.with_scope(context.scope.branch_clone());
            self.analyze_statement(finally_context, finally_body).scope
        });

        let merged = merge_try_scopes(try_out.scope, &catch_scopes, finally_scope);
        context.with_scope(merged)
    }

    fn analyze_expression_statement(&mut self, context: Context, node: &Node) -> Context {
        let Some(expression) = node.child(0) else {
            return context;
        };

        match expression.kind {
            NodeKind::Assign | NodeKind::AssignRef | NodeKind::AssignOp => {
                self.analyze_assignment(context, expression)
            }
            // A bare value in statement position does nothing.
            NodeKind::Var => {
                self.emit(&context, IssueKind::NoopVariable, expression.line, vec![]);
                context
            }
            NodeKind::ArrayLit => {
                self.emit(&context, IssueKind::NoopArray, expression.line, vec![]);
                context
            }
            NodeKind::Name | NodeKind::ClassConst => {
                let _ = self.union_type_or_empty(&context, expression);
                self.emit(&context, IssueKind::NoopConstant, expression.line, vec![]);
                context
            }
            NodeKind::Prop => {
                let _ = self.union_type_or_empty(&context, expression);
                self.emit(&context, IssueKind::NoopProperty, expression.line, vec![]);
                context
            }
            NodeKind::Closure => {
                let _ = self.union_type_or_empty(&context, expression);
                self.emit(&context, IssueKind::NoopClosure, expression.line, vec![]);
                context
            }
            _ => {
                let _ = self.union_type_or_empty(&context, expression);
                context
            }
        }
    }

    fn analyze_expression_list(&mut self, context: Context, node: &Node) -> Context {
        let mut context = context;
        for child in &node.children {
            context = match child.kind {
                NodeKind::Assign | NodeKind::AssignRef | NodeKind::AssignOp => {
                    self.analyze_assignment(context, child)
                }
                _ => {
                    let _ = self.union_type_or_empty(&context, child);
                    context
                }
            };
        }
        context
    }

    /// Validates a `return` expression against the enclosing declared
    /// return union.
    fn check_return_type(&mut self, context: &Context, node: &Node, returned: &UnionType) {
        let Some(fqsen) = context.function_fqsen else {
            return;
        };
        let Some(metadata) = self.function_like_metadata(fqsen) else {
            return;
        };

        let declared = metadata.union_type.clone();
        if declared.is_empty() || declared.has_template_type() || metadata.flags.has_yield() || returned.is_empty() {
            return;
        }

        if !returned.as_expanded_types(self.codebase).can_cast_to_union(&declared, self.codebase) {
            self.emit(
                context,
                IssueKind::TypeMismatchReturn,
                node.line,
                vec![returned.to_string(), fqsen.to_atom().to_string(), declared.to_string()],
            );
        }
    }

    /// Per-parameter declaration checks: duplicate names, a required
    /// parameter following an optional one, and defaults that cannot cast
    /// to the declared type.
    fn check_parameter_defaults(&mut self, context: &Context, node: &Node, metadata: &FunctionLikeMetadata) {
        let Some(parameter_list) = node.raw_child(0) else {
            return;
        };

        let mut seen_names = AtomSet::default();
        let mut seen_optional = false;

        for parameter_node in &parameter_list.children {
            if parameter_node.kind != NodeKind::Param {
                continue;
            }
            let Some(name) = parameter_node.name else {
                continue;
            };

            if !seen_names.insert(name) {
                self.emit(context, IssueKind::ParamRedefined, parameter_node.line, vec![name.to_string()]);
            }

            let has_default = parameter_node.child(1).is_some();
            let is_variadic = parameter_node.has_flag(flags::PARAM_VARIADIC);
            if has_default || is_variadic {
                seen_optional = true;
            } else if seen_optional {
                self.emit(context, IssueKind::ParamReqAfterOpt, parameter_node.line, vec![]);
            }

            let Some(type_hint) = parameter_node.child(0).and_then(Node::name) else {
                continue;
            };
            let Some(default) = parameter_node.child(1) else {
                continue;
            };

            let declared =
                UnionType::from_string_in_context(&type_hint, &context.names, &context.template_names);
            let default_union = self.union_type_or_empty(context, default);

            if !declared.is_empty()
                && !default_union.is_empty()
                && !default_union.can_cast_to_union(&declared, self.codebase)
            {
                self.emit(
                    context,
                    IssueKind::TypeMismatchDefault,
                    parameter_node.line,
                    vec![metadata.fqsen.to_atom().to_string(), name.to_string(), default_union.to_string()],
                );
            }
        }
    }

    /// The stored metadata of any function-like FQSEN.
    pub(crate) fn function_like_metadata(&self, fqsen: FunctionLikeFqsen) -> Option<&FunctionLikeMetadata> {
        match fqsen {
            FunctionLikeFqsen::Function(function) | FunctionLikeFqsen::Closure(function) => {
                self.codebase.get_function_by_fqsen(function).ok()
            }
            FunctionLikeFqsen::Method(member) => self.codebase.get_method_by_fqsen(member).ok(),
        }
    }

    /// Re-finds the registry entry for a declaration node, walking past
    /// alternates bumped by earlier duplicate definitions.
    fn find_declared_class(&self, base: ClassFqsen, file: augur_atom::Atom, line: u32) -> Option<ClassFqsen> {
        let mut candidate = base;
        loop {
            match self.codebase.get_class_by_fqsen(candidate) {
                Ok(class) if class.file == file && class.line == line => return Some(candidate),
                Ok(_) => candidate = candidate.with_alternate(candidate.alternate + 1),
                Err(_) => return None,
            }
        }
    }

    fn find_declared_function(&self, base: FunctionFqsen, file: augur_atom::Atom, line: u32) -> Option<FunctionFqsen> {
        let mut candidate = base;
        loop {
            match self.codebase.get_function_by_fqsen(candidate) {
                Ok(function) if function.file == file && function.line == line => return Some(candidate),
                Ok(_) => candidate = candidate.with_alternate(candidate.alternate + 1),
                Err(_) => return None,
            }
        }
    }
}

/// Whether a body contains a `return` with a value, ignoring nested
/// function-likes.
fn body_has_return(node: &Node) -> bool {
    match node.kind {
        NodeKind::Return => node.child(0).is_some(),
        NodeKind::Closure | NodeKind::FunctionDecl | NodeKind::ClassDecl => false,
        _ => node.children.iter().any(body_has_return),
    }
}

/// The FQSEN a class declaration introduces in the current namespace.
fn declared_class_fqsen(context: &Context, name: augur_atom::Atom) -> ClassFqsen {
    let namespace = context.names.namespace;
    let full = if namespace.as_str() == "\\" { concat_atom!("\\", name) } else { concat_atom!(namespace, "\\", name) };
    ClassFqsen::from_full_name(&full)
}

//! The declaration scanner (parse pass).
//!
//! The first of the two whole-program passes. It walks every AST and
//! registers declared symbols in the [`CodeBase`] without resolving any
//! expression types: classes with their members, free functions, closures,
//! and global constants. Name nodes are resolved through the namespace-use
//! map as they are encountered; cross-file resolution waits for the
//! analysis pass.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_ast::Value;
use augur_ast::flags;
use augur_atom::Atom;
use augur_atom::AtomSet;
use augur_atom::atom;
use augur_atom::concat_atom;
use augur_docblock::Comment;

use crate::fqsen::ConstantFqsen;
use crate::metadata::CodeBase;
use crate::metadata::constant::ConstantMetadata;
use crate::names::NameContext;
use crate::names::UseKind;
use crate::ttype::NativeType;
use crate::ttype::Type;
use crate::ttype::union::UnionType;

pub mod class_like;
pub mod function_like;

/// Scanner behavior toggles, mirrored from the analyzer configuration.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// When false, doc-comments are not parsed at all.
    pub read_type_annotations: bool,
    /// When false, `@template` / `@inherits` are ignored.
    pub generic_types_enabled: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { read_type_annotations: true, generic_types_enabled: true }
    }
}

/// Per-file scanner state.
pub(crate) struct ScanContext<'a> {
    pub file: Atom,
    pub names: NameContext,
    pub options: &'a ScanOptions,
}

impl ScanContext<'_> {
    /// Parses a node's doc-comment, honoring `read_type_annotations`.
    pub(crate) fn comment(&self, node: &Node) -> Comment {
        if !self.options.read_type_annotations {
            return Comment::default();
        }

        node.doc_comment.as_deref().map(Comment::parse).unwrap_or_default()
    }
}

/// Scans one file's AST into the codebase.
pub fn scan_program(codebase: &mut CodeBase, file: Atom, root: &Node, options: &ScanOptions) {
    let mut context = ScanContext { file, names: NameContext::new(), options };
    scan_statement(codebase, &mut context, root);
}

pub(crate) fn scan_statement(codebase: &mut CodeBase, context: &mut ScanContext<'_>, node: &Node) {
    match node.kind {
        NodeKind::Namespace => {
            let namespace = node.name.unwrap_or_else(|| atom(""));
            match node.child(0) {
                Some(body) => {
                    // Braced form: the namespace scopes its block only.
                    let saved = context.names.clone();
                    context.names = context.names.with_namespace(namespace);
                    scan_statement(codebase, context, body);
                    context.names = saved;
                }
                None => {
                    context.names = context.names.with_namespace(namespace);
                }
            }
        }
        NodeKind::UseDecl => {
            let kind = use_kind_of(node.flags);
            for element in &node.children {
                scan_use_element(context, kind, element, None);
            }
        }
        NodeKind::GroupUseDecl => {
            let prefix = node.name.unwrap_or_else(|| atom(""));
            let kind = use_kind_of(node.flags);
            for element in &node.children {
                scan_use_element(context, kind, element, Some(prefix));
            }
        }
        NodeKind::Declare => {
            // `strict_types` is per-analysis-context state; the analysis
            // pass picks it up from the same node.
        }
        NodeKind::ClassDecl => {
            class_like::scan_class(codebase, context, node);
        }
        NodeKind::FunctionDecl => {
            function_like::scan_function(codebase, context, node);
        }
        NodeKind::Closure => {
            function_like::scan_closure(codebase, context, node);
        }
        NodeKind::ConstDecl => {
            for element in &node.children {
                scan_global_constant(codebase, context, element);
            }
        }
        _ => {
            // Declarations may hide anywhere (conditional classes, closures
            // in expressions); descend through everything else.
            for child in &node.children {
                scan_statement(codebase, context, child);
            }
        }
    }
}

fn scan_use_element(context: &mut ScanContext<'_>, kind: UseKind, element: &Node, prefix: Option<Atom>) {
    if element.kind != NodeKind::UseElem {
        return;
    }
    let Some(target) = element.name else {
        return;
    };

    let target = match prefix {
        Some(prefix) => concat_atom!(prefix, "\\", target),
        None => target,
    };
    let alias = element.child(0).and_then(Node::name);

    context.names.add_use(kind, target, alias);
}

fn scan_global_constant(codebase: &mut CodeBase, context: &mut ScanContext<'_>, element: &Node) {
    if element.kind != NodeKind::ConstElem {
        return;
    }
    let Some(name) = element.name else {
        return;
    };

    let fqsen = ConstantFqsen::new(context.names.namespace, name);
    let mut constant = ConstantMetadata::new(fqsen, context.file, element.line);
    constant.union_type = default_value_union(element.child(0));

    codebase.add_constant(constant);
}

fn use_kind_of(node_flags: u32) -> UseKind {
    if node_flags & flags::USE_FUNCTION != 0 {
        UseKind::Function
    } else if node_flags & flags::USE_CONST != 0 {
        UseKind::Constant
    } else {
        UseKind::Normal
    }
}

/// The canonical textual form of a type-hint name node.
pub(crate) fn type_string_of_name(node: &Node) -> Option<String> {
    let name = node.name?;
    if node.has_flag(flags::NAME_FULLY_QUALIFIED) && !name.as_str().starts_with('\\') {
        Some(format!("\\{name}"))
    } else {
        Some(name.to_string())
    }
}

/// Parses a type-hint name node into a union in the current context.
pub(crate) fn union_of_type_hint(context: &ScanContext<'_>, node: Option<&Node>, templates: &AtomSet) -> UnionType {
    let Some(node) = node else {
        return UnionType::empty();
    };
    let Some(type_string) = type_string_of_name(node) else {
        return UnionType::empty();
    };

    UnionType::from_string_in_context(&type_string, &context.names, templates)
}

/// The type of a compile-time default value expression.
pub(crate) fn default_value_union(node: Option<&Node>) -> UnionType {
    let Some(node) = node else {
        return UnionType::empty();
    };

    match node.kind {
        NodeKind::Literal => match &node.value {
            Some(value) => UnionType::of(Type::from_literal(value)),
            None => UnionType::empty(),
        },
        NodeKind::ArrayLit => UnionType::of_native(NativeType::Array),
        NodeKind::UnaryOp => match node.child(0).and_then(|operand| operand.value.as_ref()) {
            Some(Value::Int(_)) => UnionType::of_native(NativeType::Int),
            Some(Value::Float(_)) => UnionType::of_native(NativeType::Float),
            _ => UnionType::empty(),
        },
        _ => UnionType::empty(),
    }
}

/// Whether a function-like body yields, ignoring nested function-likes.
pub(crate) fn body_has_yield(node: &Node) -> bool {
    match node.kind {
        NodeKind::Yield => true,
        NodeKind::Closure | NodeKind::FunctionDecl | NodeKind::ClassDecl => false,
        _ => node.children.iter().any(body_has_yield),
    }
}

#[cfg(test)]
mod tests {
    use augur_ast::Node;
    use augur_ast::NodeKind;
    use augur_ast::Value;

    use crate::fqsen::ClassFqsen;
    use crate::fqsen::FunctionFqsen;

    use super::*;

    fn name_node(name: &str, line: u32) -> Node {
        Node::new(NodeKind::Name, line).with_name(atom(name))
    }

    #[test]
    fn test_scan_namespaced_class_and_function() {
        let root = Node::new(NodeKind::StmtList, 1)
            .with_child(Node::new(NodeKind::Namespace, 1).with_name(atom("N")))
            .with_child(
                Node::new(NodeKind::ClassDecl, 2)
                    .with_name(atom("Widget"))
                    .with_child(Node::missing(2))
                    .with_child(Node::new(NodeKind::NameList, 2))
                    .with_child(Node::new(NodeKind::NameList, 2))
                    .with_child(Node::new(NodeKind::StmtList, 2)),
            )
            .with_child(
                Node::new(NodeKind::FunctionDecl, 8)
                    .with_name(atom("build"))
                    .with_child(Node::new(NodeKind::ParamList, 8))
                    .with_child(Node::new(NodeKind::StmtList, 8))
                    .with_child(Node::missing(8)),
            );

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        assert!(codebase.has_class_with_fqsen(ClassFqsen::from_full_name("\\N\\Widget")));
        assert!(codebase.has_function_with_fqsen(FunctionFqsen::from_full_name("\\N\\build")));
    }

    #[test]
    fn test_scan_use_map_feeds_extends_resolution() {
        let root = Node::new(NodeKind::StmtList, 1)
            .with_child(Node::new(NodeKind::Namespace, 1).with_name(atom("N")))
            .with_child(
                Node::new(NodeKind::UseDecl, 2)
                    .with_flags(flags::USE_NORMAL)
                    .with_child(Node::new(NodeKind::UseElem, 2).with_name(atom("OtherNs\\Base"))),
            )
            .with_child(
                Node::new(NodeKind::ClassDecl, 3)
                    .with_name(atom("Derived"))
                    .with_child(name_node("Base", 3))
                    .with_child(Node::new(NodeKind::NameList, 3))
                    .with_child(Node::new(NodeKind::NameList, 3))
                    .with_child(Node::new(NodeKind::StmtList, 3)),
            );

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        let derived = codebase.get_class_by_fqsen(ClassFqsen::from_full_name("\\N\\Derived")).unwrap();
        assert_eq!(derived.parent, Some(ClassFqsen::from_full_name("\\OtherNs\\Base")));
    }

    #[test]
    fn test_scan_global_constant() {
        let root = Node::new(NodeKind::StmtList, 1).with_child(
            Node::new(NodeKind::ConstDecl, 1).with_child(
                Node::new(NodeKind::ConstElem, 1)
                    .with_name(atom("LIMIT"))
                    .with_child(Node::new(NodeKind::Literal, 1).with_value(Value::Int(10))),
            ),
        );

        let mut codebase = CodeBase::new();
        scan_program(&mut codebase, atom("src.php"), &root, &ScanOptions::default());

        let fqsen = ConstantFqsen::from_full_name("\\LIMIT");
        assert_eq!(codebase.get_constant_by_fqsen(fqsen).unwrap().union_type.to_string(), "int");
    }

    #[test]
    fn test_body_has_yield_ignores_nested_closures() {
        let closure_with_yield = Node::new(NodeKind::Closure, 2)
            .with_child(Node::new(NodeKind::ParamList, 2))
            .with_child(Node::new(NodeKind::ClosureUseList, 2))
            .with_child(Node::new(NodeKind::StmtList, 2).with_child(Node::new(NodeKind::Yield, 3)));

        let body = Node::new(NodeKind::StmtList, 1).with_child(closure_with_yield);
        assert!(!body_has_yield(&body));

        let body = Node::new(NodeKind::StmtList, 1).with_child(Node::new(NodeKind::Yield, 2));
        assert!(body_has_yield(&body));
    }
}

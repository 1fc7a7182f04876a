use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

use crate::flags;

/// The kind of an AST node.
///
/// Child slot conventions are listed per variant; `—` means the node has no
/// positional children (it may still carry a list of uniform children).
/// An empty positional slot holds a [`NodeKind::Missing`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Placeholder for an absent positional child.
    Missing,

    // Declarations.
    //
    /// A class, interface, or trait declaration, discriminated by
    /// `flags::CLASS_INTERFACE` / `flags::CLASS_TRAIT`.
    /// `name` = declared name. Children: `[extends, implements: NameList,
    /// uses: NameList, body: StmtList]`.
    ClassDecl,
    /// A method declaration. `name` = method name. Children:
    /// `[params: ParamList, body: StmtList | Missing, return_type]`.
    MethodDecl,
    /// A free function declaration. Same layout as `MethodDecl`.
    FunctionDecl,
    /// An anonymous function. Children: `[params: ParamList,
    /// uses: ClosureUseList, body: StmtList, return_type]`.
    Closure,
    /// A property declaration group; `flags` carry the modifiers.
    /// Children: `PropertyElem*`.
    PropertyDecl,
    /// One declared property. `name` = property name. Children:
    /// `[declared_type, default]`.
    PropertyElem,
    /// A class constant declaration group. Children: `ConstElem*`.
    ClassConstDecl,
    /// A global constant declaration. Children: `ConstElem*`.
    ConstDecl,
    /// One declared constant. `name` = constant name. Children: `[value]`.
    ConstElem,
    /// A parameter. `name` = parameter name (without `$`). Children:
    /// `[declared_type, default]`. Flags: `PARAM_REFERENCE`, `PARAM_VARIADIC`.
    Param,
    /// A `namespace` declaration. `name` = namespace path (`None` resets to
    /// the global namespace). Children: `[body: StmtList | Missing]`.
    Namespace,
    /// A `use` declaration; `flags` carry the use kind. Children: `UseElem*`.
    UseDecl,
    /// A group `use` declaration. `name` = shared prefix. Children: `UseElem*`.
    GroupUseDecl,
    /// One imported name. `name` = target path. Children: `[alias: Name | Missing]`.
    UseElem,
    /// A `declare` directive. `name` = directive name, `value` = directive value.
    Declare,

    // Statements.
    //
    /// An ordered list of statements.
    StmtList,
    /// An `if`/`elseif`/`else` chain. Children: `IfElem*`.
    If,
    /// One branch of an `if` chain. Children: `[cond | Missing, body: StmtList]`.
    IfElem,
    /// Children: `[cond, body]`.
    While,
    /// Children: `[body, cond]`.
    DoWhile,
    /// Children: `[init: ExprList, cond: ExprList, loop: ExprList, body]`.
    For,
    /// Children: `[iterable, value_target, key_target | Missing, body]`.
    Foreach,
    /// Children: `[cond, cases: CaseList]`.
    Switch,
    /// One `case`. Children: `[value | Missing, body: StmtList]`.
    SwitchCase,
    /// Children: `[body: StmtList, catches: CatchList, finally: StmtList | Missing]`.
    Try,
    /// One `catch`. Children: `[types: NameList, var: Var, body: StmtList]`.
    Catch,
    /// Children: `[expr | Missing]`.
    Return,
    Break,
    Continue,
    /// Children: expressions.
    Echo,
    /// Children: `[expr]`.
    Throw,
    /// Imports variables into the local scope. Children: `Var*`.
    Global,
    /// A function-static variable. `name` = variable name.
    /// Children: `[default | Missing]`.
    StaticVar,
    /// An expression evaluated for effect. Children: `[expr]`.
    ExprStmt,

    // Expressions.
    //
    /// A variable. `name` = variable name; a dynamic variable (`$$x`)
    /// instead carries the inner expression as child 0.
    Var,
    /// A bare name (class, function, or constant reference).
    /// `name` = the textual name; `flags::NAME_FULLY_QUALIFIED` marks a
    /// leading backslash.
    Name,
    /// A literal; `value` holds the payload.
    Literal,
    /// Children: `[target: Name | expr, args: ArgList]`.
    Call,
    /// Children: `[object, method: Name | expr, args: ArgList]`.
    MethodCall,
    /// Children: `[class: Name, method: Name | expr, args: ArgList]`.
    StaticCall,
    /// Children: `[object, property: Name | expr]`.
    Prop,
    /// Children: `[class: Name, property: Var]`.
    StaticProp,
    /// Children: `[class: Name, constant: Name]`.
    ClassConst,
    /// Children: `[class: Name | expr, args: ArgList]`.
    New,
    /// Children: `ArrayElem*`.
    ArrayLit,
    /// Children: `[value, key | Missing]`.
    ArrayElem,
    /// Children: `[expr, index | Missing]`.
    Dim,
    /// Destructuring target. Children: targets (`Var` or `Missing` for holes).
    ListExpr,
    /// Children: `[lhs, rhs]`.
    Assign,
    /// Assignment by reference. Children: `[lhs, rhs]`.
    AssignRef,
    /// Compound assignment; `flags` carry the binary operator. Children: `[lhs, rhs]`.
    AssignOp,
    /// Binary operation; `flags` carry the operator. Children: `[lhs, rhs]`.
    BinaryOp,
    /// Unary operation; `flags` carry the operator. Children: `[operand]`.
    UnaryOp,
    /// Type cast; `flags` carry the target type. Children: `[operand]`.
    Cast,
    /// Children: `[cond, then | Missing, else]`. A `Missing` then-branch is
    /// the short ternary form.
    Conditional,
    /// Children: `[expr, class: Name]`.
    Instanceof,
    CloneExpr,
    /// Children: `[expr]`.
    IssetExpr,
    /// Children: `[expr]`.
    EmptyExpr,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    /// Children: `[value | Missing, key | Missing]`.
    Yield,
    /// A magic constant; `flags` carry the kind.
    MagicConst,
    /// A captured variable in a closure `use` list. `name` = variable name;
    /// `flags::CLOSURE_USE_REFERENCE` marks by-reference capture.
    ClosureUseVar,
    /// Argument spread. Children: `[expr]`.
    Unpack,

    // Uniform list containers.
    NameList,
    ParamList,
    ArgList,
    ExprList,
    CaseList,
    CatchList,
    ClosureUseList,
}

/// A literal value carried by a [`NodeKind::Literal`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// A single AST node.
///
/// The tree is fully owned; the analyzer never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default)]
    pub name: Option<Atom>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub doc_comment: Option<String>,
}

impl Node {
    /// Creates a node of the given kind at the given line, with no children
    /// and no payloads.
    #[must_use]
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self { kind, flags: 0, line, children: Vec::new(), name: None, value: None, doc_comment: None }
    }

    /// A [`NodeKind::Missing`] placeholder.
    #[must_use]
    pub fn missing(line: u32) -> Self {
        Self::new(NodeKind::Missing, line)
    }

    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: Atom) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_doc_comment(mut self, doc: impl Into<String>) -> Self {
        self.doc_comment = Some(doc.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns the child at `index`, treating [`NodeKind::Missing`] as absent.
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&Node> {
        match self.children.get(index) {
            Some(child) if child.kind != NodeKind::Missing => Some(child),
            _ => None,
        }
    }

    /// Returns the child at `index` even when it is a placeholder.
    #[inline]
    #[must_use]
    pub fn raw_child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    #[inline]
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.kind == NodeKind::Missing
    }

    /// Whether the node has the given flag bits set.
    #[inline]
    #[must_use]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    /// The identifier payload, if present.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<Atom> {
        self.name
    }

    /// The string payload of a literal node, if it is a string literal.
    #[inline]
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether this node declares an interface (for [`NodeKind::ClassDecl`]).
    #[inline]
    #[must_use]
    pub fn is_interface_decl(&self) -> bool {
        self.kind == NodeKind::ClassDecl && self.has_flag(flags::CLASS_INTERFACE)
    }

    /// Whether this node declares a trait (for [`NodeKind::ClassDecl`]).
    #[inline]
    #[must_use]
    pub fn is_trait_decl(&self) -> bool {
        self.kind == NodeKind::ClassDecl && self.has_flag(flags::CLASS_TRAIT)
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use super::*;

    #[test]
    fn test_child_skips_missing_placeholder() {
        let node = Node::new(NodeKind::Param, 3)
            .with_name(atom("x"))
            .with_child(Node::missing(3))
            .with_child(Node::new(NodeKind::Literal, 3).with_value(Value::Int(1)));

        assert!(node.child(0).is_none());
        assert!(node.raw_child(0).is_some());
        assert_eq!(node.child(1).map(|c| c.kind), Some(NodeKind::Literal));
    }

    #[test]
    fn test_json_round_trip() {
        let node = Node::new(NodeKind::BinaryOp, 7)
            .with_flags(crate::flags::BINARY_ADD)
            .with_child(Node::new(NodeKind::Literal, 7).with_value(Value::Int(1)))
            .with_child(Node::new(NodeKind::Literal, 7).with_value(Value::Float(2.5)));

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();

        assert_eq!(node, back);
    }
}

use ahash::HashMap;

use augur_atom::Atom;
use augur_atom::atom;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::metadata::flags::MetadataFlags;
use augur_codex::names::NameContext;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;

/// A variable binding in a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Atom,
    pub union_type: UnionType,
    /// `BY_REFERENCE` marks pass-by-reference parameters, whose bindings
    /// survive reassignment in place.
    pub flags: MetadataFlags,
}

impl Variable {
    #[must_use]
    pub fn new(name: Atom, union_type: UnionType) -> Self {
        Self { name, union_type, flags: MetadataFlags::empty() }
    }
}

/// The position of a scope in the conceptual chain
/// global → class → function-like → branch clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeKind {
    #[default]
    Global,
    Class,
    /// Closed: does not see the enclosing scope's variables.
    FunctionLike,
    Branch,
}

/// The variable bindings visible at an analysis point.
///
/// Function-like scopes are closed, so each scope holds its own flat
/// binding map; branching constructs clone the scope wholesale before
/// per-branch refinement (copy-on-branch).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub kind: ScopeKind,
    variables: HashMap<Atom, Variable>,
}

impl Scope {
    #[must_use]
    pub fn global() -> Self {
        Self { kind: ScopeKind::Global, variables: HashMap::default() }
    }

    /// A class scope, with `$this` bound to the class's own type.
    #[must_use]
    pub fn for_class(fqsen: ClassFqsen) -> Self {
        let mut scope = Self { kind: ScopeKind::Class, variables: HashMap::default() };
        scope.set_variable(Variable::new(atom("this"), UnionType::of(Type::class(fqsen))));
        scope
    }

    /// A fresh closed scope for a function, method, or closure body.
    #[must_use]
    pub fn for_function_like() -> Self {
        Self { kind: ScopeKind::FunctionLike, variables: HashMap::default() }
    }

    /// The copy a branching construct refines.
    #[must_use]
    pub fn branch_clone(&self) -> Self {
        let mut clone = self.clone();
        clone.kind = ScopeKind::Branch;
        clone
    }

    #[must_use]
    pub fn get_variable(&self, name: Atom) -> Option<&Variable> {
        self.variables.get(&name)
    }

    #[must_use]
    pub fn has_variable(&self, name: Atom) -> bool {
        self.variables.contains_key(&name)
    }

    pub fn set_variable(&mut self, variable: Variable) {
        self.variables.insert(variable.name, variable);
    }

    pub fn unset_variable(&mut self, name: Atom) {
        self.variables.remove(&name);
    }

    pub fn variables(&self) -> impl Iterator<Item = (&Atom, &Variable)> {
        self.variables.iter()
    }

    #[must_use]
    pub fn variable_names(&self) -> Vec<Atom> {
        self.variables.keys().copied().collect()
    }
}

/// The hard-coded union types of the always-defined superglobals.
#[must_use]
pub fn superglobal_union_type(name: Atom) -> Option<UnionType> {
    let context = NameContext::new();
    let templates = augur_atom::AtomSet::default();
    let parse = |source: &str| UnionType::from_string_in_context(source, &context, &templates);

    Some(match name.as_str() {
        "argv" => parse("string[]"),
        "argc" => parse("int"),
        "_GET" | "_POST" | "_COOKIE" | "_REQUEST" => parse("string[]|string[][]"),
        "_SERVER" | "_SESSION" | "GLOBALS" => parse("array"),
        "_ENV" => parse("string[]"),
        "_FILES" => parse("int[][]|string[][]|int[][][]|string[][][]"),
        "http_response_header" => parse("string[]|null"),
        _ => return None,
    })
}

/// Whether a name is one of the built-in superglobals.
#[must_use]
pub fn is_superglobal(name: Atom) -> bool {
    superglobal_union_type(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_scope_binds_this() {
        let scope = Scope::for_class(ClassFqsen::from_full_name("\\A"));
        let this = scope.get_variable(atom("this")).unwrap();

        assert_eq!(this.union_type.to_string(), "\\A");
    }

    #[test]
    fn test_branch_clone_is_independent() {
        let mut scope = Scope::for_function_like();
        scope.set_variable(Variable::new(atom("x"), UnionType::of_native(augur_codex::ttype::NativeType::Int)));

        let mut branch = scope.branch_clone();
        branch.set_variable(Variable::new(atom("y"), UnionType::empty()));

        assert!(branch.has_variable(atom("x")));
        assert!(!scope.has_variable(atom("y")));
    }

    #[test]
    fn test_superglobal_table() {
        assert_eq!(superglobal_union_type(atom("argv")).unwrap().to_string(), "string[]");
        assert_eq!(superglobal_union_type(atom("http_response_header")).unwrap().to_string(), "null|string[]");
        assert!(superglobal_union_type(atom("not_a_superglobal")).is_none());
    }
}

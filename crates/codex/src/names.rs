//! Namespace and `use`-map name resolution.
//!
//! Both analysis passes resolve written names through the same structure: a
//! current namespace plus a map of imported aliases keyed by (use kind,
//! lowercased alias). The map is ordered so diagnostics about imports can
//! refer to source order.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;
use augur_atom::ascii_lowercase_atom;
use augur_atom::atom;
use augur_atom::concat_atom;

use crate::fqsen::root_namespace;

/// The kind of a `use` import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseKind {
    Normal,
    Function,
    Constant,
}

/// The name-resolution state of an analysis point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameContext {
    /// Canonical current namespace, always starting with `\`.
    pub namespace: Atom,
    uses: IndexMap<(UseKind, Atom), Atom>,
}

impl NameContext {
    #[must_use]
    pub fn new() -> Self {
        Self { namespace: root_namespace(), uses: IndexMap::new() }
    }

    #[must_use]
    pub fn with_namespace(&self, namespace: Atom) -> Self {
        let mut context = self.clone();
        context.namespace = canonical_namespace(&namespace);
        context
    }

    /// Records a `use` import under its alias.
    ///
    /// `alias` defaults to the last segment of `target` when the import has
    /// no explicit alias.
    pub fn add_use(&mut self, kind: UseKind, target: Atom, alias: Option<Atom>) {
        let alias = alias.unwrap_or_else(|| last_segment(&target));
        let target = canonical_name(&target);

        self.uses.insert((kind, ascii_lowercase_atom(&alias)), target);
    }

    /// Resolves a written class name to its canonical full form.
    pub fn resolve_class(&self, name: &str, fully_qualified: bool) -> Atom {
        self.resolve(UseKind::Normal, name, fully_qualified)
    }

    /// Resolves a written function name to its canonical in-namespace form.
    ///
    /// Unqualified function names that fail the namespaced lookup fall back
    /// to the global namespace at the codebase level, not here.
    pub fn resolve_function(&self, name: &str, fully_qualified: bool) -> Atom {
        self.resolve(UseKind::Function, name, fully_qualified)
    }

    /// Resolves a written constant name to its canonical in-namespace form.
    pub fn resolve_constant(&self, name: &str, fully_qualified: bool) -> Atom {
        self.resolve(UseKind::Constant, name, fully_qualified)
    }

    fn resolve(&self, kind: UseKind, name: &str, fully_qualified: bool) -> Atom {
        if fully_qualified || name.starts_with('\\') {
            return canonical_name(name);
        }

        let (first, rest) = match name.find('\\') {
            Some(index) => (&name[..index], &name[index..]),
            None => (name, ""),
        };

        // A qualified name's first segment resolves through the class/namespace
        // import map regardless of the element kind being referenced.
        let first_key = (if rest.is_empty() { kind } else { UseKind::Normal }, ascii_lowercase_atom(first));
        if let Some(target) = self.uses.get(&first_key) {
            return if rest.is_empty() { *target } else { concat_atom!(target, rest) };
        }

        if self.namespace.as_str() == "\\" { concat_atom!("\\", name) } else { concat_atom!(self.namespace, "\\", name) }
    }
}

impl Default for NameContext {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_namespace(namespace: &str) -> Atom {
    let trimmed = namespace.trim_start_matches('\\');
    if trimmed.is_empty() { root_namespace() } else { concat_atom!("\\", trimmed) }
}

fn canonical_name(name: &str) -> Atom {
    let trimmed = name.trim_start_matches('\\');
    concat_atom!("\\", trimmed)
}

fn last_segment(name: &str) -> Atom {
    match name.rfind('\\') {
        Some(index) => atom(&name[index + 1..]),
        None => atom(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_in_namespace() {
        let context = NameContext::new().with_namespace(atom("N"));

        assert_eq!(context.resolve_class("X", false), atom("\\N\\X"));
        assert_eq!(context.resolve_class("\\X", false), atom("\\X"));
        assert_eq!(context.resolve_class("X", true), atom("\\X"));
    }

    #[test]
    fn test_use_alias() {
        let mut context = NameContext::new().with_namespace(atom("N"));
        context.add_use(UseKind::Normal, atom("OtherNs\\X"), None);
        context.add_use(UseKind::Normal, atom("\\Deep\\Thing"), Some(atom("T")));

        assert_eq!(context.resolve_class("X", false), atom("\\OtherNs\\X"));
        assert_eq!(context.resolve_class("t", false), atom("\\Deep\\Thing"));
        assert_eq!(context.resolve_class("Y", false), atom("\\N\\Y"));
    }

    #[test]
    fn test_qualified_name_through_alias() {
        let mut context = NameContext::new();
        context.add_use(UseKind::Normal, atom("Vendor\\Pkg"), None);

        assert_eq!(context.resolve_class("Pkg\\Widget", false), atom("\\Vendor\\Pkg\\Widget"));
    }

    #[test]
    fn test_function_use_kind_is_distinct() {
        let mut context = NameContext::new();
        context.add_use(UseKind::Function, atom("Helpers\\map"), None);

        assert_eq!(context.resolve_function("map", false), atom("\\Helpers\\map"));
        assert_eq!(context.resolve_class("map", false), atom("\\map"));
    }
}

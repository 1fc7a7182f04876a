//! Fully qualified structural element names.
//!
//! An FQSEN is the canonical, interned identity of a structural element:
//! `\Ns\Name` for classes, functions, and global constants,
//! `\Ns\Name::member` for methods, properties, and class constants, with an
//! optional `,<alt>` suffix distinguishing multiple definitions that share
//! a name. FQSENs are small `Copy` bundles of interned [`Atom`]s, so
//! equality is a handful of word comparisons and map keying is cheap.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;
use augur_atom::ascii_lowercase_atom;
use augur_atom::atom;
use augur_atom::concat_atom;
use augur_atom::u32_atom;

/// The canonical root namespace.
#[inline]
#[must_use]
pub fn root_namespace() -> Atom {
    atom("\\")
}

/// Splits a full name into its canonical namespace and element name.
///
/// Accepts `Name`, `\Name`, `Ns\Name`, and `\Ns\Name` forms; the namespace
/// in the result always begins with `\`.
fn split_full_name(full: &str) -> (Atom, Atom) {
    let full = full.strip_prefix('\\').unwrap_or(full);

    match full.rfind('\\') {
        Some(index) => (concat_atom!("\\", &full[..index]), atom(&full[index + 1..])),
        None => (root_namespace(), atom(full)),
    }
}

/// Joins a canonical namespace and a name into `\Ns\Name`.
fn join(namespace: Atom, name: Atom) -> Atom {
    if namespace.as_str() == "\\" { concat_atom!("\\", name) } else { concat_atom!(namespace, "\\", name) }
}

/// Appends the `,<alt>` suffix when the alternate id is non-zero.
fn with_alternate_suffix(base: Atom, alternate: u32) -> Atom {
    if alternate == 0 { base } else { concat_atom!(base, ",", u32_atom(alternate)) }
}

/// A stable short digest used to synthesize closure names from (file, line).
fn short_digest(file: Atom, line: u32) -> u32 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in file.as_bytes().iter().copied().chain(line.to_le_bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    (hash ^ (hash >> 32)) as u32
}

/// The FQSEN of a class, interface, or trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassFqsen {
    /// Canonical namespace, always starting with `\`.
    pub namespace: Atom,
    /// The class name as written.
    pub name: Atom,
    /// Alternate id distinguishing duplicate definitions.
    pub alternate: u32,
}

impl ClassFqsen {
    #[must_use]
    pub fn new(namespace: Atom, name: Atom) -> Self {
        Self { namespace, name, alternate: 0 }
    }

    /// Parses a full name such as `\Ns\Name` or `Ns\Name`.
    #[must_use]
    pub fn from_full_name(full: &str) -> Self {
        let (namespace, name) = split_full_name(full);
        Self { namespace, name, alternate: 0 }
    }

    #[must_use]
    pub fn with_alternate(self, alternate: u32) -> Self {
        Self { alternate, ..self }
    }

    /// The canonical textual form, e.g. `\Ns\Name` or `\Ns\Name,1`.
    #[must_use]
    pub fn to_atom(self) -> Atom {
        with_alternate_suffix(join(self.namespace, self.name), self.alternate)
    }

    /// The lowercased canonical form used as a map key.
    #[must_use]
    pub fn key(self) -> Atom {
        ascii_lowercase_atom(&self.to_atom())
    }

    /// Whether two FQSENs name the same class ignoring alternates and case.
    #[must_use]
    pub fn names_same_class(self, other: ClassFqsen) -> bool {
        self.with_alternate(0).key() == other.with_alternate(0).key()
    }
}

impl fmt::Display for ClassFqsen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_atom())
    }
}

/// The FQSEN of a free function or closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionFqsen {
    pub namespace: Atom,
    pub name: Atom,
    pub alternate: u32,
}

impl FunctionFqsen {
    #[must_use]
    pub fn new(namespace: Atom, name: Atom) -> Self {
        Self { namespace, name, alternate: 0 }
    }

    #[must_use]
    pub fn from_full_name(full: &str) -> Self {
        let (namespace, name) = split_full_name(full);
        Self { namespace, name, alternate: 0 }
    }

    /// Synthesizes the FQSEN of a closure declared at (file, line).
    ///
    /// The digest is stable across runs so closure identities survive
    /// re-analysis.
    #[must_use]
    pub fn for_closure(file: Atom, line: u32) -> Self {
        let digest = short_digest(file, line);
        Self { namespace: root_namespace(), name: atom(&format!("closure_{digest:08x}")), alternate: 0 }
    }

    #[must_use]
    pub fn with_alternate(self, alternate: u32) -> Self {
        Self { alternate, ..self }
    }

    #[must_use]
    pub fn to_atom(self) -> Atom {
        with_alternate_suffix(join(self.namespace, self.name), self.alternate)
    }

    #[must_use]
    pub fn key(self) -> Atom {
        ascii_lowercase_atom(&self.to_atom())
    }

    /// The key of the same name in the root namespace.
    ///
    /// Unqualified function calls fall back to the global namespace when
    /// the namespaced lookup fails.
    #[must_use]
    pub fn global_fallback_key(self) -> Atom {
        ascii_lowercase_atom(&join(root_namespace(), self.name))
    }
}

impl fmt::Display for FunctionFqsen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_atom())
    }
}

/// The FQSEN of a global constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstantFqsen {
    pub namespace: Atom,
    pub name: Atom,
    pub alternate: u32,
}

impl ConstantFqsen {
    #[must_use]
    pub fn new(namespace: Atom, name: Atom) -> Self {
        Self { namespace, name, alternate: 0 }
    }

    #[must_use]
    pub fn from_full_name(full: &str) -> Self {
        let (namespace, name) = split_full_name(full);
        Self { namespace, name, alternate: 0 }
    }

    #[must_use]
    pub fn to_atom(self) -> Atom {
        with_alternate_suffix(join(self.namespace, self.name), self.alternate)
    }

    /// Constant names are case-sensitive; only the namespace folds.
    #[must_use]
    pub fn key(self) -> Atom {
        let namespace = ascii_lowercase_atom(&self.namespace);
        with_alternate_suffix(join(namespace, self.name), self.alternate)
    }
}

impl fmt::Display for ConstantFqsen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_atom())
    }
}

/// The FQSEN of a class member: a method, property, or class constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassElementFqsen {
    pub class: ClassFqsen,
    pub name: Atom,
    pub alternate: u32,
}

impl ClassElementFqsen {
    #[must_use]
    pub fn new(class: ClassFqsen, name: Atom) -> Self {
        Self { class, name, alternate: 0 }
    }

    /// The same member name addressed on a different class.
    ///
    /// Used during hydration when an inherited member is re-homed onto the
    /// inheriting class while its defining FQSEN stays put.
    #[must_use]
    pub fn retargeted(self, class: ClassFqsen) -> Self {
        Self { class, ..self }
    }

    /// The canonical textual form, e.g. `\Ns\Name::member`.
    #[must_use]
    pub fn to_atom(self) -> Atom {
        with_alternate_suffix(concat_atom!(self.class.to_atom(), "::", self.name), self.alternate)
    }
}

impl fmt::Display for ClassElementFqsen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_atom())
    }
}

/// The FQSEN of any function-like element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionLikeFqsen {
    Function(FunctionFqsen),
    Method(ClassElementFqsen),
    Closure(FunctionFqsen),
}

impl FunctionLikeFqsen {
    #[must_use]
    pub fn to_atom(self) -> Atom {
        match self {
            FunctionLikeFqsen::Function(fqsen) | FunctionLikeFqsen::Closure(fqsen) => fqsen.to_atom(),
            FunctionLikeFqsen::Method(fqsen) => fqsen.to_atom(),
        }
    }

    /// The class the element belongs to, for methods.
    #[must_use]
    pub fn class(self) -> Option<ClassFqsen> {
        match self {
            FunctionLikeFqsen::Method(fqsen) => Some(fqsen.class),
            _ => None,
        }
    }
}

impl fmt::Display for FunctionLikeFqsen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_atom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_forms() {
        let class = ClassFqsen::from_full_name("\\Ns\\Widget");
        assert_eq!(class.to_atom(), atom("\\Ns\\Widget"));
        assert_eq!(class.key(), atom("\\ns\\widget"));

        let global = ClassFqsen::from_full_name("Widget");
        assert_eq!(global.to_atom(), atom("\\Widget"));

        let member = ClassElementFqsen::new(class, atom("render"));
        assert_eq!(member.to_atom(), atom("\\Ns\\Widget::render"));
    }

    #[test]
    fn test_alternate_suffix() {
        let class = ClassFqsen::from_full_name("\\A").with_alternate(1);
        assert_eq!(class.to_atom(), atom("\\A,1"));
        assert_ne!(class.key(), class.with_alternate(0).key());
    }

    #[test]
    fn test_interned_equality() {
        let a = ClassFqsen::from_full_name("\\Ns\\Widget");
        let b = ClassFqsen::from_full_name("\\Ns\\Widget");

        assert_eq!(a, b);
        assert_eq!(a.to_atom().as_char_ptr(), b.to_atom().as_char_ptr());
    }

    #[test]
    fn test_closure_digest_is_stable() {
        let first = FunctionFqsen::for_closure(atom("src.php"), 10);
        let second = FunctionFqsen::for_closure(atom("src.php"), 10);
        let other = FunctionFqsen::for_closure(atom("src.php"), 11);

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.name.as_str().starts_with("closure_"));
    }

    #[test]
    fn test_constant_key_preserves_name_case() {
        let constant = ConstantFqsen::from_full_name("\\Ns\\MY_CONST");
        assert_eq!(constant.key(), atom("\\ns\\MY_CONST"));
    }
}

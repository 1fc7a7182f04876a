//! The authoritative symbol registry.
//!
//! [`CodeBase`] owns every element by value: classes (with their members
//! inside), free functions and closures, and global constants, all keyed by
//! lowercased canonical FQSEN atoms. Re-adding a colliding FQSEN bumps the
//! newcomer's alternate id and records the redefinition for later
//! reporting; lookups are total predicates or `Result`s carrying
//! [`MissingSymbol`].

use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;
use augur_atom::AtomMap;
use augur_atom::AtomSet;

use crate::error::MissingSymbol;
use crate::fqsen::ClassElementFqsen;
use crate::fqsen::ClassFqsen;
use crate::fqsen::ConstantFqsen;
use crate::fqsen::FunctionFqsen;
use crate::metadata::class_like::ClassMetadata;
use crate::metadata::constant::ClassConstantMetadata;
use crate::metadata::constant::ConstantMetadata;
use crate::metadata::function_like::FunctionLikeMetadata;
use crate::metadata::property::PropertyMetadata;
use crate::signature::InternalSignature;
use crate::signature::builtin_signatures;

pub mod class_like;
pub mod constant;
pub mod flags;
pub mod function_like;
pub mod parameter;
pub mod property;

/// What kind of symbol a redefinition collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedefinitionKind {
    Class,
    Function,
}

/// A recorded FQSEN collision, reported during the analysis phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redefinition {
    pub kind: RedefinitionKind,
    /// The FQSEN (with bumped alternate) the newcomer ended up under.
    pub fqsen: Atom,
    /// Canonical name both definitions share.
    pub name: Atom,
    pub file: Atom,
    pub line: u32,
    pub previous_file: Atom,
    pub previous_line: u32,
}

/// The whole-program symbol table.
pub struct CodeBase {
    classes: AtomMap<ClassMetadata>,
    functions: AtomMap<FunctionLikeMetadata>,
    constants: AtomMap<ConstantMetadata>,
    redefinitions: Vec<Redefinition>,
    internal_signatures: AtomMap<InternalSignature>,
}

impl CodeBase {
    /// Creates an empty codebase with the bundled internal signature map
    /// loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: AtomMap::default(),
            functions: AtomMap::default(),
            constants: AtomMap::default(),
            redefinitions: Vec::new(),
            internal_signatures: builtin_signatures(),
        }
    }

    // Classes.

    /// Inserts a class, bumping its alternate id on collision.
    ///
    /// Returns the FQSEN the class was actually stored under. Collisions
    /// are recorded for the redefinition analyzer; re-adding a class under
    /// an already-bumped FQSEN is a no-op returning that FQSEN.
    pub fn add_class(&mut self, mut class: ClassMetadata) -> ClassFqsen {
        let mut fqsen = class.fqsen;
        if self.classes.contains_key(&fqsen.key()) {
            let original = &self.classes[&fqsen.key()];
            let (previous_file, previous_line) = (original.file, original.line);

            while self.classes.contains_key(&fqsen.key()) {
                fqsen = fqsen.with_alternate(fqsen.alternate + 1);
            }

            self.redefinitions.push(Redefinition {
                kind: RedefinitionKind::Class,
                fqsen: fqsen.to_atom(),
                name: class.fqsen.to_atom(),
                file: class.file,
                line: class.line,
                previous_file,
                previous_line,
            });

            class.fqsen = fqsen;
            // Member FQSENs follow the class onto its alternate.
            for property in class.properties.values_mut() {
                property.fqsen = property.fqsen.retargeted(fqsen);
                property.defining_fqsen = property.fqsen;
            }
            for method in class.methods.values_mut() {
                if let crate::fqsen::FunctionLikeFqsen::Method(member) = method.fqsen {
                    let retargeted = crate::fqsen::FunctionLikeFqsen::Method(member.retargeted(fqsen));
                    method.fqsen = retargeted;
                    method.defining_fqsen = retargeted;
                }
            }
            for constant in class.constants.values_mut() {
                constant.fqsen = constant.fqsen.retargeted(fqsen);
                constant.defining_fqsen = constant.fqsen;
            }
        }

        self.classes.insert(fqsen.key(), class);
        fqsen
    }

    #[inline]
    #[must_use]
    pub fn has_class_with_fqsen(&self, fqsen: ClassFqsen) -> bool {
        self.classes.contains_key(&fqsen.key())
    }

    pub fn get_class_by_fqsen(&self, fqsen: ClassFqsen) -> Result<&ClassMetadata, MissingSymbol> {
        self.classes.get(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn get_class_by_fqsen_mut(&mut self, fqsen: ClassFqsen) -> Result<&mut ClassMetadata, MissingSymbol> {
        self.classes.get_mut(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassMetadata> {
        self.classes.values()
    }

    pub fn class_fqsens(&self) -> Vec<ClassFqsen> {
        self.classes.values().map(|class| class.fqsen).collect()
    }

    /// Removes a class so it can be mutated without aliasing the registry,
    /// then re-inserted with [`CodeBase::restore_class`].
    pub(crate) fn take_class(&mut self, fqsen: ClassFqsen) -> Option<ClassMetadata> {
        self.classes.remove(&fqsen.key())
    }

    pub(crate) fn restore_class(&mut self, class: ClassMetadata) {
        self.classes.insert(class.fqsen.key(), class);
    }

    // Functions and closures.

    /// Inserts a function-like, bumping its alternate id on collision.
    pub fn add_function(&mut self, mut function: FunctionLikeMetadata) -> FunctionFqsen {
        let crate::fqsen::FunctionLikeFqsen::Function(mut fqsen) = function.fqsen else {
            // Closures get digest-unique names; store them directly.
            if let crate::fqsen::FunctionLikeFqsen::Closure(fqsen) = function.fqsen {
                self.functions.insert(fqsen.key(), function);
                return fqsen;
            }
            unreachable!("methods are registered on their class");
        };

        if self.functions.contains_key(&fqsen.key()) {
            let original = &self.functions[&fqsen.key()];
            let (previous_file, previous_line) = (original.file, original.line);

            while self.functions.contains_key(&fqsen.key()) {
                fqsen = fqsen.with_alternate(fqsen.alternate + 1);
            }

            self.redefinitions.push(Redefinition {
                kind: RedefinitionKind::Function,
                fqsen: fqsen.to_atom(),
                name: function.fqsen.to_atom(),
                file: function.file,
                line: function.line,
                previous_file,
                previous_line,
            });

            function.fqsen = crate::fqsen::FunctionLikeFqsen::Function(fqsen);
            function.defining_fqsen = function.fqsen;
        }

        self.functions.insert(fqsen.key(), function);
        fqsen
    }

    #[inline]
    #[must_use]
    pub fn has_function_with_fqsen(&self, fqsen: FunctionFqsen) -> bool {
        self.functions.contains_key(&fqsen.key())
    }

    pub fn get_function_by_fqsen(&self, fqsen: FunctionFqsen) -> Result<&FunctionLikeMetadata, MissingSymbol> {
        self.functions.get(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn get_function_by_fqsen_mut(&mut self, fqsen: FunctionFqsen) -> Result<&mut FunctionLikeMetadata, MissingSymbol> {
        self.functions.get_mut(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    /// Resolves a function by its in-namespace FQSEN, falling back to the
    /// global namespace the way unqualified calls do at runtime.
    pub fn resolve_function(&self, fqsen: FunctionFqsen) -> Result<&FunctionLikeMetadata, MissingSymbol> {
        if let Some(function) = self.functions.get(&fqsen.key()) {
            return Ok(function);
        }
        self.functions.get(&fqsen.global_fallback_key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionLikeMetadata> {
        self.functions.values()
    }

    /// Alternate overloads registered under the same base FQSEN.
    #[must_use]
    pub fn function_alternates(&self, fqsen: FunctionFqsen) -> Vec<&FunctionLikeMetadata> {
        let mut alternates = Vec::new();
        let mut candidate = fqsen.with_alternate(0);
        while let Some(function) = self.functions.get(&candidate.key()) {
            alternates.push(function);
            candidate = candidate.with_alternate(candidate.alternate + 1);
        }
        alternates
    }

    // Global constants.

    pub fn add_constant(&mut self, constant: ConstantMetadata) {
        self.constants.insert(constant.fqsen.key(), constant);
    }

    #[inline]
    #[must_use]
    pub fn has_constant_with_fqsen(&self, fqsen: ConstantFqsen) -> bool {
        self.constants.contains_key(&fqsen.key())
    }

    pub fn get_constant_by_fqsen(&self, fqsen: ConstantFqsen) -> Result<&ConstantMetadata, MissingSymbol> {
        self.constants.get(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn get_constant_by_fqsen_mut(&mut self, fqsen: ConstantFqsen) -> Result<&mut ConstantMetadata, MissingSymbol> {
        self.constants.get_mut(&fqsen.key()).ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    pub fn constants(&self) -> impl Iterator<Item = &ConstantMetadata> {
        self.constants.values()
    }

    // Class members, addressed by member FQSEN.

    pub fn get_method_by_fqsen(&self, fqsen: ClassElementFqsen) -> Result<&FunctionLikeMetadata, MissingSymbol> {
        self.get_class_by_fqsen(fqsen.class)?
            .get_method(&fqsen.name)
            .ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    #[must_use]
    pub fn has_method_with_fqsen(&self, fqsen: ClassElementFqsen) -> bool {
        self.get_method_by_fqsen(fqsen).is_ok()
    }

    pub fn get_property_by_fqsen(&self, fqsen: ClassElementFqsen) -> Result<&PropertyMetadata, MissingSymbol> {
        self.get_class_by_fqsen(fqsen.class)?
            .properties
            .get(&fqsen.name)
            .ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    #[must_use]
    pub fn has_property_with_fqsen(&self, fqsen: ClassElementFqsen) -> bool {
        self.get_property_by_fqsen(fqsen).is_ok()
    }

    pub fn get_class_constant_by_fqsen(&self, fqsen: ClassElementFqsen) -> Result<&ClassConstantMetadata, MissingSymbol> {
        self.get_class_by_fqsen(fqsen.class)?
            .constants
            .get(&fqsen.name)
            .ok_or_else(|| MissingSymbol::new(fqsen.to_atom()))
    }

    #[must_use]
    pub fn has_class_constant_with_fqsen(&self, fqsen: ClassElementFqsen) -> bool {
        self.get_class_constant_by_fqsen(fqsen).is_ok()
    }

    // Hierarchy walks.

    /// Whether `ancestor` appears in `descendant`'s transitive ancestry.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: ClassFqsen, descendant: ClassFqsen) -> bool {
        self.ancestor_fqsens(descendant).into_iter().any(|candidate| candidate.names_same_class(ancestor))
    }

    /// Every transitive ancestor of a class, cycle-safe.
    #[must_use]
    pub fn ancestor_fqsens(&self, fqsen: ClassFqsen) -> Vec<ClassFqsen> {
        let mut ancestors = Vec::new();
        let mut visited = AtomSet::default();
        let mut pending = vec![fqsen];
        visited.insert(fqsen.key());

        while let Some(current) = pending.pop() {
            let Ok(class) = self.get_class_by_fqsen(current) else {
                continue;
            };

            for ancestor in class.direct_ancestors() {
                if visited.insert(ancestor.key()) {
                    ancestors.push(ancestor);
                    pending.push(ancestor);
                }
            }
        }

        ancestors
    }

    // Internal signatures.

    /// The bundled signature of an internal function, by lowercased bare name.
    #[must_use]
    pub fn internal_function_signature(&self, name: Atom) -> Option<&InternalSignature> {
        self.internal_signatures.get(&name)
    }

    // Redefinitions.

    #[must_use]
    pub fn redefinitions(&self) -> &[Redefinition] {
        &self.redefinitions
    }
}

impl Default for CodeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CodeBase {
    fn clone(&self) -> Self {
        Self {
            classes: self.classes.clone(),
            functions: self.functions.clone(),
            constants: self.constants.clone(),
            redefinitions: self.redefinitions.clone(),
            internal_signatures: self.internal_signatures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::fqsen::FunctionLikeFqsen;

    use super::*;

    fn class(full_name: &str, file: &str, line: u32) -> ClassMetadata {
        ClassMetadata::new(ClassFqsen::from_full_name(full_name), atom(file), line)
    }

    #[test]
    fn test_symbol_resolution_is_total() {
        let mut codebase = CodeBase::new();
        let fqsen = codebase.add_class(class("\\A", "src.php", 1));

        assert!(codebase.has_class_with_fqsen(fqsen));
        assert_eq!(codebase.get_class_by_fqsen(fqsen).unwrap().fqsen, fqsen);

        let missing = ClassFqsen::from_full_name("\\Nope");
        assert!(!codebase.has_class_with_fqsen(missing));
        assert_eq!(codebase.get_class_by_fqsen(missing).unwrap_err().fqsen, atom("\\Nope"));
    }

    #[test]
    fn test_alternate_ids_are_unique_and_both_retrievable() {
        let mut codebase = CodeBase::new();
        let first = codebase.add_class(class("\\A", "one.php", 1));
        let second = codebase.add_class(class("\\A", "two.php", 3));

        assert_ne!(first, second);
        assert_eq!(first.alternate, 0);
        assert_eq!(second.alternate, 1);

        assert_eq!(codebase.get_class_by_fqsen(first).unwrap().file, atom("one.php"));
        assert_eq!(codebase.get_class_by_fqsen(second).unwrap().file, atom("two.php"));

        assert_eq!(codebase.redefinitions().len(), 1);
        assert_eq!(codebase.redefinitions()[0].previous_file, atom("one.php"));
    }

    #[test]
    fn test_function_global_fallback() {
        let mut codebase = CodeBase::new();
        let fqsen = FunctionFqsen::from_full_name("\\helper");
        let function =
            FunctionLikeMetadata::new(FunctionLikeFqsen::Function(fqsen), atom("helper"), atom("src.php"), 1);
        codebase.add_function(function);

        let namespaced = FunctionFqsen::from_full_name("\\Deep\\Ns\\helper");
        assert!(codebase.resolve_function(namespaced).is_ok());
    }

    #[test]
    fn test_ancestor_walk_is_cycle_safe() {
        let mut codebase = CodeBase::new();

        let mut a = class("\\A", "src.php", 1);
        a.parent = Some(ClassFqsen::from_full_name("\\B"));
        let mut b = class("\\B", "src.php", 2);
        b.parent = Some(ClassFqsen::from_full_name("\\A"));

        codebase.add_class(a);
        codebase.add_class(b);

        let fqsen = ClassFqsen::from_full_name("\\A");
        let ancestors = codebase.ancestor_fqsens(fqsen);

        assert_eq!(ancestors.len(), 1);
        assert!(codebase.is_ancestor(ClassFqsen::from_full_name("\\B"), fqsen));
    }

    #[test]
    fn test_ancestor_chain_cast_transitivity() {
        use crate::ttype::Type;
        use crate::ttype::union::UnionType;

        let mut codebase = CodeBase::new();

        let a = class("\\A", "src.php", 1);
        let mut b = class("\\B", "src.php", 2);
        b.parent = Some(ClassFqsen::from_full_name("\\A"));
        let mut c = class("\\C", "src.php", 3);
        c.parent = Some(ClassFqsen::from_full_name("\\B"));

        codebase.add_class(a);
        codebase.add_class(b);
        codebase.add_class(c);

        let c_union = UnionType::of(Type::class(ClassFqsen::from_full_name("\\C")));
        let a_union = UnionType::of(Type::class(ClassFqsen::from_full_name("\\A")));

        assert!(c_union.can_cast_to_union(&a_union, &codebase));
        assert!(!a_union.can_cast_to_union(&c_union, &codebase));
    }

    #[test]
    fn test_internal_signature_lookup() {
        let codebase = CodeBase::new();
        let signature = codebase.internal_function_signature(atom("strlen")).expect("strlen is bundled");

        assert_eq!(signature.return_union.to_string(), "int");
        assert_eq!(signature.parameters.len(), 1);
    }
}

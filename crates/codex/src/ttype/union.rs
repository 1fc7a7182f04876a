use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use augur_atom::AtomMap;
use augur_atom::AtomSet;

use crate::metadata::CodeBase;
use crate::names::NameContext;
use crate::ttype::NativeType;
use crate::ttype::Type;
use crate::ttype::split_top_level;

/// An unordered set of atomic types.
///
/// The union is the fundamental currency of the type system: every
/// expression infers to one, and every declared signature stores one. An
/// empty union means "nothing known"; it casts to and from anything so
/// unknowns never cascade into spurious diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionType {
    types: Vec<Type>,
}

impl UnionType {
    /// The empty union.
    #[inline]
    #[must_use]
    pub fn empty() -> UnionType {
        UnionType { types: Vec::new() }
    }

    /// A union of a single type.
    #[inline]
    #[must_use]
    pub fn of(single: Type) -> UnionType {
        UnionType { types: vec![single] }
    }

    #[inline]
    #[must_use]
    pub fn of_native(native: NativeType) -> UnionType {
        UnionType::of(Type::Native(native))
    }

    /// Builds a union from a list of types, deduplicating.
    #[must_use]
    pub fn from_types(types: impl IntoIterator<Item = Type>) -> UnionType {
        let mut union = UnionType::empty();
        for t in types {
            union.add_type(t);
        }
        union
    }

    /// Parses a `|`-separated type expression in a name-resolution context.
    ///
    /// Unparseable pieces are dropped; an entirely unparseable string
    /// yields the empty union.
    #[must_use]
    pub fn from_string_in_context(source: &str, context: &NameContext, templates: &AtomSet) -> UnionType {
        let mut union = UnionType::empty();
        for piece in split_top_level(source, '|') {
            // `?T` is shorthand for `T|null`.
            let (piece, nullable) = match piece.strip_prefix('?') {
                Some(rest) => (rest, true),
                None => (piece, false),
            };

            if let Some(parsed) = Type::from_string_in_context(piece, context, templates) {
                union.add_type(parsed);
                if nullable {
                    union.add_type(Type::Native(NativeType::Null));
                }
            }
        }
        union
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    #[must_use]
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Adds a type unless an equal one is already present.
    pub fn add_type(&mut self, new_type: Type) {
        if !self.types.contains(&new_type) {
            self.types.push(new_type);
        }
    }

    /// Adds every type of another union.
    pub fn add_union(&mut self, other: &UnionType) {
        for t in &other.types {
            if !self.types.contains(t) {
                self.types.push(t.clone());
            }
        }
    }

    pub fn remove_type(&mut self, target: &Type) {
        self.types.retain(|t| t != target);
    }

    #[inline]
    #[must_use]
    pub fn has_type(&self, target: &Type) -> bool {
        self.types.contains(target)
    }

    #[inline]
    #[must_use]
    pub fn has_native(&self, native: NativeType) -> bool {
        self.types.iter().any(|t| t.is_native(native))
    }

    /// Whether any contained type is, or nests, a template placeholder.
    #[must_use]
    pub fn has_template_type(&self) -> bool {
        fn type_has_template(t: &Type) -> bool {
            match t {
                Type::Template(_) => true,
                Type::GenericArray(element) => type_has_template(element),
                Type::ClassInstance { parameters, .. } => parameters.iter().any(UnionType::has_template_type),
                _ => false,
            }
        }

        self.types.iter().any(type_has_template)
    }

    #[inline]
    #[must_use]
    pub fn has_static_type(&self) -> bool {
        self.has_native(NativeType::Static)
    }

    /// Whether every contained type is a class instance.
    #[must_use]
    pub fn is_exclusively_class_instances(&self) -> bool {
        !self.is_empty() && self.types.iter().all(|t| matches!(t, Type::ClassInstance { .. }))
    }

    /// The class FQSENs contained in this union.
    #[must_use]
    pub fn class_fqsens(&self) -> Vec<crate::fqsen::ClassFqsen> {
        self.types.iter().filter_map(Type::class_fqsen).collect()
    }

    /// Wraps each contained type as the element type of a generic array.
    #[must_use]
    pub fn as_generic_array_types(&self) -> UnionType {
        UnionType::from_types(self.types.iter().cloned().map(Type::generic_array))
    }

    /// Unwraps the element types of the contained generic arrays.
    ///
    /// A plain `array` contributes `mixed`, since its elements are unknown.
    #[must_use]
    pub fn generic_array_element_types(&self) -> UnionType {
        let mut union = UnionType::empty();
        for t in &self.types {
            match t {
                Type::GenericArray(element) => union.add_type((**element).clone()),
                Type::Native(NativeType::Array) => union.add_type(Type::Native(NativeType::Mixed)),
                _ => {}
            }
        }
        union
    }

    /// Expands class types with every ancestor class as an additional type.
    ///
    /// The ancestor walk is transitive and cycle-safe. Used wherever a
    /// covariance check needs the full ancestry on the left-hand side.
    #[must_use]
    pub fn as_expanded_types(&self, codebase: &CodeBase) -> UnionType {
        let mut union = self.clone();
        for t in &self.types {
            let Some(fqsen) = t.class_fqsen() else {
                continue;
            };

            for ancestor in codebase.ancestor_fqsens(fqsen) {
                union.add_type(Type::class(ancestor));
            }
        }
        union
    }

    /// Substitutes template placeholders with concrete unions.
    ///
    /// Substitution is one-pass: the map's values must not themselves
    /// contain template types.
    #[must_use]
    pub fn with_template_parameter_type_map(&self, map: &AtomMap<UnionType>) -> UnionType {
        fn substitute(t: &Type, map: &AtomMap<UnionType>, into: &mut UnionType) {
            match t {
                Type::Template(name) => match map.get(name) {
                    Some(replacement) => into.add_union(replacement),
                    None => into.add_type(t.clone()),
                },
                Type::GenericArray(element) => {
                    let mut elements = UnionType::empty();
                    substitute(element, map, &mut elements);
                    for element in elements.types {
                        into.add_type(Type::generic_array(element));
                    }
                }
                Type::ClassInstance { fqsen, parameters } => {
                    let parameters =
                        parameters.iter().map(|parameter| parameter.with_template_parameter_type_map(map)).collect();
                    into.add_type(Type::ClassInstance { fqsen: *fqsen, parameters });
                }
                _ => into.add_type(t.clone()),
            }
        }

        let mut union = UnionType::empty();
        for t in &self.types {
            substitute(t, map, &mut union);
        }
        union
    }

    /// The can-cast-to relation between unions.
    ///
    /// True iff every type on the left can cast to some type on the right,
    /// with native coercion rules and ancestor walks for class types. An
    /// empty side makes the check vacuously true.
    #[must_use]
    pub fn can_cast_to_union(&self, target: &UnionType, codebase: &CodeBase) -> bool {
        if self.is_empty() || target.is_empty() {
            return true;
        }

        self.types.iter().all(|t| target.types.iter().any(|r| type_can_cast_to_type(t, r, codebase)))
    }
}

impl fmt::Display for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered: Vec<String> = self.types.iter().map(Type::to_string).collect();
        rendered.sort();
        f.write_str(&rendered.join("|"))
    }
}

impl From<Type> for UnionType {
    fn from(single: Type) -> UnionType {
        UnionType::of(single)
    }
}

/// The can-cast-to relation between atomic types.
fn type_can_cast_to_type(from: &Type, to: &Type, codebase: &CodeBase) -> bool {
    if from == to {
        return true;
    }

    if from.is_native(NativeType::Mixed) || to.is_native(NativeType::Mixed) {
        return true;
    }

    // null coerces to anything in weak mode.
    if from.is_native(NativeType::Null) {
        return true;
    }

    match (from, to) {
        (Type::Native(from_native), Type::Native(to_native)) => native_can_cast(*from_native, *to_native),

        (Type::GenericArray(from_element), Type::GenericArray(to_element)) => {
            type_can_cast_to_type(from_element, to_element, codebase)
        }
        (Type::GenericArray(_), Type::Native(NativeType::Array)) => true,

        (Type::ClosureCallable(_), Type::Native(NativeType::Callable)) => true,

        (Type::ClassInstance { .. }, Type::Native(NativeType::Object)) => true,
        (Type::ClassInstance { fqsen, .. }, Type::Native(NativeType::Callable)) => {
            fqsen.names_same_class(crate::fqsen::ClassFqsen::from_full_name("\\Closure"))
        }
        (Type::Native(NativeType::Static), Type::Native(NativeType::Object)) => true,

        (Type::ClassInstance { fqsen: from_fqsen, .. }, Type::ClassInstance { fqsen: to_fqsen, .. }) => {
            from_fqsen.names_same_class(*to_fqsen) || codebase.is_ancestor(*to_fqsen, *from_fqsen)
        }

        _ => false,
    }
}

/// The built-in native coercion table.
fn native_can_cast(from: NativeType, to: NativeType) -> bool {
    match (from, to) {
        (NativeType::Int, NativeType::Float) | (NativeType::Float, NativeType::Int) => true,
        (NativeType::Int | NativeType::Float | NativeType::Bool | NativeType::Null, NativeType::String) => true,
        (_, NativeType::Bool) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::fqsen::ClassFqsen;

    use super::*;

    fn int() -> Type {
        Type::Native(NativeType::Int)
    }

    fn string() -> Type {
        Type::Native(NativeType::String)
    }

    #[test]
    fn test_set_semantics() {
        let mut union = UnionType::empty();
        union.add_type(int());
        union.add_type(int());
        union.add_type(string());

        assert_eq!(union.len(), 2);

        union.remove_type(&int());
        assert!(!union.has_type(&int()));
        assert!(union.has_type(&string()));
    }

    #[test]
    fn test_cast_reflexivity() {
        let codebase = CodeBase::new();
        for t in [int(), string(), Type::generic_array(int()), Type::class(ClassFqsen::from_full_name("\\A"))] {
            let union = UnionType::of(t);
            assert!(union.can_cast_to_union(&union, &codebase), "{union} should cast to itself");
        }
    }

    #[test]
    fn test_native_coercions() {
        let codebase = CodeBase::new();

        assert!(UnionType::of(int()).can_cast_to_union(&UnionType::of_native(NativeType::Float), &codebase));
        assert!(UnionType::of_native(NativeType::Float).can_cast_to_union(&UnionType::of(int()), &codebase));
        assert!(UnionType::of(int()).can_cast_to_union(&UnionType::of(string()), &codebase));
        assert!(UnionType::of_native(NativeType::Null).can_cast_to_union(&UnionType::of(int()), &codebase));

        assert!(!UnionType::of(string()).can_cast_to_union(&UnionType::of(int()), &codebase));
        assert!(!UnionType::of_native(NativeType::Array).can_cast_to_union(&UnionType::of(string()), &codebase));
    }

    #[test]
    fn test_mixed_casts_both_ways() {
        let codebase = CodeBase::new();
        let mixed = UnionType::of_native(NativeType::Mixed);

        assert!(UnionType::of(string()).can_cast_to_union(&mixed, &codebase));
        assert!(mixed.can_cast_to_union(&UnionType::of(string()), &codebase));
    }

    #[test]
    fn test_generic_array_wrap_and_unwrap() {
        let union = UnionType::from_types([int(), string()]);
        let wrapped = union.as_generic_array_types();

        assert!(wrapped.has_type(&Type::generic_array(int())));
        assert!(wrapped.has_type(&Type::generic_array(string())));

        let unwrapped = wrapped.generic_array_element_types();
        assert_eq!(unwrapped, union);
    }

    #[test]
    fn test_plain_array_elements_are_mixed() {
        let union = UnionType::of_native(NativeType::Array);
        assert_eq!(union.generic_array_element_types(), UnionType::of_native(NativeType::Mixed));
    }

    #[test]
    fn test_generic_array_cast_recurses_elements() {
        let codebase = CodeBase::new();
        let ints = UnionType::of(Type::generic_array(int()));
        let floats = UnionType::of(Type::generic_array(Type::Native(NativeType::Float)));
        let strings = UnionType::of(Type::generic_array(string()));

        assert!(ints.can_cast_to_union(&floats, &codebase));
        assert!(!strings.can_cast_to_union(&UnionType::of(Type::generic_array(int())), &codebase));
        assert!(ints.can_cast_to_union(&UnionType::of_native(NativeType::Array), &codebase));
    }

    #[test]
    fn test_template_substitution() {
        let mut union = UnionType::empty();
        union.add_type(Type::Template(atom("T")));
        union.add_type(Type::generic_array(Type::Template(atom("T"))));
        union.add_type(string());

        let mut map = AtomMap::default();
        map.insert(atom("T"), UnionType::of(int()));

        let substituted = union.with_template_parameter_type_map(&map);

        assert!(substituted.has_type(&int()));
        assert!(substituted.has_type(&Type::generic_array(int())));
        assert!(substituted.has_type(&string()));
        assert!(!substituted.has_template_type());
    }

    #[test]
    fn test_unmapped_template_is_kept() {
        let union = UnionType::of(Type::Template(atom("U")));
        let substituted = union.with_template_parameter_type_map(&AtomMap::default());

        assert!(substituted.has_template_type());
    }

    #[test]
    fn test_parse_union_string() {
        let context = NameContext::new();
        let templates = AtomSet::default();

        let union = UnionType::from_string_in_context("int|string[]|\\Ns\\X", &context, &templates);

        assert!(union.has_type(&int()));
        assert!(union.has_type(&Type::generic_array(string())));
        assert!(union.has_type(&Type::class(ClassFqsen::from_full_name("\\Ns\\X"))));
    }

    #[test]
    fn test_parse_nullable_shorthand() {
        let context = NameContext::new();
        let templates = AtomSet::default();

        let union = UnionType::from_string_in_context("?int", &context, &templates);

        assert!(union.has_type(&int()));
        assert!(union.has_native(NativeType::Null));
    }

    #[test]
    fn test_display_is_sorted() {
        let union = UnionType::from_types([string(), int()]);
        assert_eq!(union.to_string(), "int|string");
    }
}

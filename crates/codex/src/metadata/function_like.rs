use ahash::HashSet;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

use crate::fqsen::FunctionLikeFqsen;
use crate::metadata::flags::MetadataFlags;
use crate::metadata::flags::Visibility;
use crate::metadata::parameter::ParameterMetadata;
use crate::ttype::union::UnionType;

/// A method, free function, or closure.
///
/// The three share a shape; the FQSEN variant tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionLikeMetadata {
    pub name: Atom,
    pub fqsen: FunctionLikeFqsen,
    /// For inherited methods, the declaration the body comes from.
    pub defining_fqsen: FunctionLikeFqsen,
    /// Meaningful for methods; functions and closures are `Public`.
    pub visibility: Visibility,
    pub flags: MetadataFlags,
    pub file: Atom,
    pub line: u32,
    pub parameters: Vec<ParameterMetadata>,
    pub required_parameter_count: u16,
    pub optional_parameter_count: u16,
    /// The return union: declared type ∪ `@return` type.
    pub union_type: UnionType,
    /// Issue type names suppressed by `@suppress` on this element.
    pub suppressions: Vec<Atom>,
    pub references: HashSet<(Atom, u32)>,
}

impl FunctionLikeMetadata {
    #[must_use]
    pub fn new(fqsen: FunctionLikeFqsen, name: Atom, file: Atom, line: u32) -> Self {
        Self {
            name,
            fqsen,
            defining_fqsen: fqsen,
            visibility: Visibility::Public,
            flags: MetadataFlags::empty(),
            file,
            line,
            parameters: Vec::new(),
            required_parameter_count: 0,
            optional_parameter_count: 0,
            union_type: UnionType::empty(),
            suppressions: Vec::new(),
            references: HashSet::default(),
        }
    }

    /// Recomputes the required/optional counts from the parameter list.
    pub fn recount_parameters(&mut self) {
        self.required_parameter_count = self.parameters.iter().filter(|p| p.is_required()).count() as u16;
        self.optional_parameter_count = (self.parameters.len() as u16) - self.required_parameter_count;
    }

    /// The total number of declared parameters.
    #[inline]
    #[must_use]
    pub fn parameter_count(&self) -> u16 {
        self.parameters.len() as u16
    }

    /// Whether the last declared parameter is variadic.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.flags.is_variadic())
    }

    /// The formal parameter for the actual at `position`, counting the
    /// variadic tail as repeating.
    #[must_use]
    pub fn parameter_at(&self, position: usize) -> Option<&ParameterMetadata> {
        match self.parameters.get(position) {
            Some(parameter) => Some(parameter),
            None => self.parameters.last().filter(|p| p.flags.is_variadic()),
        }
    }

    pub fn add_reference(&mut self, file: Atom, line: u32) {
        self.references.insert((file, line));
    }

    /// The textual signature used by the dump artifact:
    /// `<fqsen>: p1, p2, ... → return`.
    #[must_use]
    pub fn to_signature_string(&self) -> String {
        let parameters: Vec<String> = self.parameters.iter().map(ParameterMetadata::to_signature_string).collect();

        let mut rendered = format!("{}: {}", self.fqsen, parameters.join(", "));
        if !self.union_type.is_empty() {
            rendered.push_str(" \u{2192} ");
            rendered.push_str(&self.union_type.to_string());
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::fqsen::FunctionFqsen;
    use crate::names::NameContext;
    use crate::ttype::union::UnionType;

    use super::*;

    #[test]
    fn test_parameter_counts() {
        let fqsen = FunctionLikeFqsen::Function(FunctionFqsen::from_full_name("\\f"));
        let mut function = FunctionLikeMetadata::new(fqsen, atom("f"), atom("src.php"), 1);

        let mut required = ParameterMetadata::new(atom("a"), 1);
        required.union_type = UnionType::from_string_in_context("int", &NameContext::new(), &Default::default());

        let mut optional = ParameterMetadata::new(atom("b"), 1);
        optional.has_default = true;

        function.parameters = vec![required, optional];
        function.recount_parameters();

        assert_eq!(function.required_parameter_count, 1);
        assert_eq!(function.optional_parameter_count, 1);
    }

    #[test]
    fn test_signature_string_round_trips_doc_types() {
        let fqsen = FunctionLikeFqsen::Function(FunctionFqsen::from_full_name("\\f"));
        let mut function = FunctionLikeMetadata::new(fqsen, atom("f"), atom("src.php"), 1);

        let context = NameContext::new();
        let mut parameter = ParameterMetadata::new(atom("x"), 1);
        parameter.union_type = UnionType::from_string_in_context("int", &context, &Default::default());
        function.parameters = vec![parameter];
        function.union_type = UnionType::from_string_in_context("string", &context, &Default::default());

        assert_eq!(function.to_signature_string(), "\\f: int $x \u{2192} string");
    }
}

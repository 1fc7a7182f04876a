use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

use crate::metadata::flags::MetadataFlags;
use crate::ttype::union::UnionType;

/// A declared parameter of a function-like element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// The parameter name, without the `$` sigil.
    pub name: Atom,
    /// `VARIADIC` and `BY_REFERENCE` are meaningful here.
    pub flags: MetadataFlags,
    /// Declared type ∪ doc-comment type ∪ default value type.
    pub union_type: UnionType,
    pub has_default: bool,
    pub line: u32,
}

impl ParameterMetadata {
    #[must_use]
    pub fn new(name: Atom, line: u32) -> Self {
        Self { name, flags: MetadataFlags::empty(), union_type: UnionType::empty(), has_default: false, line }
    }

    /// A parameter is required when it has neither a default nor variadic form.
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        !self.has_default && !self.flags.is_variadic()
    }

    /// The textual form used in signature dumps, e.g. `int $x`.
    #[must_use]
    pub fn to_signature_string(&self) -> String {
        let mut rendered = String::new();
        if !self.union_type.is_empty() {
            rendered.push_str(&self.union_type.to_string());
            rendered.push(' ');
        }
        if self.flags.is_by_reference() {
            rendered.push('&');
        }
        if self.flags.is_variadic() {
            rendered.push_str("...");
        }
        rendered.push('$');
        rendered.push_str(&self.name);
        rendered
    }
}

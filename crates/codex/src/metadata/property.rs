use ahash::HashSet;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

use crate::fqsen::ClassElementFqsen;
use crate::metadata::flags::MetadataFlags;
use crate::metadata::flags::Visibility;
use crate::ttype::union::UnionType;

/// A declared (or synthesized) class property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub name: Atom,
    /// The FQSEN the property is addressed by on its current class.
    pub fqsen: ClassElementFqsen,
    /// The FQSEN of the declaration the property originates from; differs
    /// from `fqsen` for inherited members.
    pub defining_fqsen: ClassElementFqsen,
    pub visibility: Visibility,
    pub flags: MetadataFlags,
    pub file: Atom,
    pub line: u32,
    /// Declared type ∪ `@var` type ∪ default value type, widened further by
    /// provable writes during analysis.
    pub union_type: UnionType,
    /// Source locations that reference this property.
    pub references: HashSet<(Atom, u32)>,
}

impl PropertyMetadata {
    #[must_use]
    pub fn new(fqsen: ClassElementFqsen, file: Atom, line: u32) -> Self {
        Self {
            name: fqsen.name,
            fqsen,
            defining_fqsen: fqsen,
            visibility: Visibility::Public,
            flags: MetadataFlags::empty(),
            file,
            line,
            union_type: UnionType::empty(),
            references: HashSet::default(),
        }
    }

    pub fn add_reference(&mut self, file: Atom, line: u32) {
        self.references.insert((file, line));
    }
}

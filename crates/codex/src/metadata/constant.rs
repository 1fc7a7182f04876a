use ahash::HashSet;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

use crate::fqsen::ClassElementFqsen;
use crate::fqsen::ConstantFqsen;
use crate::metadata::flags::MetadataFlags;
use crate::ttype::union::UnionType;

/// A class constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConstantMetadata {
    pub name: Atom,
    pub fqsen: ClassElementFqsen,
    pub defining_fqsen: ClassElementFqsen,
    pub flags: MetadataFlags,
    pub file: Atom,
    pub line: u32,
    pub union_type: UnionType,
    pub references: HashSet<(Atom, u32)>,
}

impl ClassConstantMetadata {
    #[must_use]
    pub fn new(fqsen: ClassElementFqsen, file: Atom, line: u32) -> Self {
        Self {
            name: fqsen.name,
            fqsen,
            defining_fqsen: fqsen,
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

/// A global constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantMetadata {
    pub name: Atom,
    pub fqsen: ConstantFqsen,
    pub flags: MetadataFlags,
    pub file: Atom,
    pub line: u32,
    pub union_type: UnionType,
    pub references: HashSet<(Atom, u32)>,
}

impl ConstantMetadata {
    #[must_use]
    pub fn new(fqsen: ConstantFqsen, file: Atom, line: u32) -> Self {
        Self {
            name: fqsen.name,
            fqsen,
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

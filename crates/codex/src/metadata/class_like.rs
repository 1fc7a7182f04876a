use ahash::HashSet;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;
use augur_atom::AtomMap;
use augur_atom::AtomSet;
use augur_atom::ascii_lowercase_atom;

use crate::fqsen::ClassFqsen;
use crate::metadata::constant::ClassConstantMetadata;
use crate::metadata::flags::MetadataFlags;
use crate::metadata::function_like::FunctionLikeMetadata;
use crate::metadata::property::PropertyMetadata;
use crate::ttype::union::UnionType;

/// A class, interface, or trait, together with its members.
///
/// Members live inside their class: properties and constants are keyed by
/// their case-sensitive names, methods by their lowercased names. Ancestors
/// are referenced by FQSEN, never by pointer, so the codebase stays a
/// single coherent data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub name: Atom,
    pub fqsen: ClassFqsen,
    /// `INTERFACE` / `TRAIT` discriminate the class-like kind.
    pub flags: MetadataFlags,
    pub file: Atom,
    pub line: u32,
    pub parent: Option<ClassFqsen>,
    pub interfaces: Vec<ClassFqsen>,
    pub traits: Vec<ClassFqsen>,
    /// Ordered `@template` parameter names.
    pub template_types: Vec<Atom>,
    /// Concrete parameter unions bound through `@inherits Parent<...>`.
    pub parent_template_parameters: Vec<UnionType>,
    pub properties: AtomMap<PropertyMetadata>,
    pub methods: AtomMap<FunctionLikeMetadata>,
    pub constants: AtomMap<ClassConstantMetadata>,
    /// Issue type names suppressed by `@suppress` on the class.
    pub suppressions: Vec<Atom>,
    pub references: HashSet<(Atom, u32)>,
}

impl ClassMetadata {
    #[must_use]
    pub fn new(fqsen: ClassFqsen, file: Atom, line: u32) -> Self {
        Self {
            name: fqsen.name,
            fqsen,
            flags: MetadataFlags::empty(),
            file,
            line,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            template_types: Vec::new(),
            parent_template_parameters: Vec::new(),
            properties: AtomMap::default(),
            methods: AtomMap::default(),
            constants: AtomMap::default(),
            suppressions: Vec::new(),
            references: HashSet::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.is_interface()
    }

    #[inline]
    #[must_use]
    pub fn is_trait(&self) -> bool {
        self.flags.is_trait()
    }

    /// Direct ancestors in hydration order: interfaces, traits, parent.
    #[must_use]
    pub fn direct_ancestors(&self) -> Vec<ClassFqsen> {
        let mut ancestors = Vec::with_capacity(self.interfaces.len() + self.traits.len() + 1);
        ancestors.extend(self.interfaces.iter().copied());
        ancestors.extend(self.traits.iter().copied());
        ancestors.extend(self.parent);
        ancestors
    }

    pub fn add_property(&mut self, property: PropertyMetadata) {
        self.properties.insert(property.name, property);
    }

    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(&augur_atom::atom(name))
    }

    pub fn add_method(&mut self, method: FunctionLikeMetadata) {
        self.methods.insert(ascii_lowercase_atom(&method.name), method);
    }

    /// Method lookup is case-insensitive.
    #[must_use]
    pub fn get_method(&self, name: &str) -> Option<&FunctionLikeMetadata> {
        self.methods.get(&ascii_lowercase_atom(name))
    }

    #[must_use]
    pub fn get_method_mut(&mut self, name: &str) -> Option<&mut FunctionLikeMetadata> {
        self.methods.get_mut(&ascii_lowercase_atom(name))
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(&ascii_lowercase_atom(name))
    }

    pub fn add_constant(&mut self, constant: ClassConstantMetadata) {
        self.constants.insert(constant.name, constant);
    }

    /// The template identifiers in scope inside this class's doc types.
    #[must_use]
    pub fn template_name_set(&self) -> AtomSet {
        self.template_types.iter().copied().collect()
    }

    /// The map binding this class's parent's template names to the
    /// parameters declared through `@inherits`.
    #[must_use]
    pub fn parent_template_map(&self, parent: &ClassMetadata) -> AtomMap<UnionType> {
        let mut map = AtomMap::default();
        for (name, parameter) in parent.template_types.iter().zip(&self.parent_template_parameters) {
            map.insert(*name, parameter.clone());
        }
        map
    }

    pub fn add_reference(&mut self, file: Atom, line: u32) {
        self.references.insert((file, line));
    }

    /// The class's own references plus the sum of its members' references.
    #[must_use]
    pub fn total_reference_count(&self) -> usize {
        self.references.len()
            + self.properties.values().map(|p| p.references.len()).sum::<usize>()
            + self.methods.values().map(|m| m.references.len()).sum::<usize>()
            + self.constants.values().map(|c| c.references.len()).sum::<usize>()
    }
}

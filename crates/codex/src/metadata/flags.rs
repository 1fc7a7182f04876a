use bitflags::bitflags;
use serde::Deserialize;
use serde::Serialize;

bitflags! {
    /// Boolean properties shared across element metadata.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MetadataFlags: u32 {
        const ABSTRACT = 1 << 0;
        const FINAL = 1 << 1;
        const STATIC = 1 << 2;
        const INTERFACE = 1 << 3;
        const TRAIT = 1 << 4;
        const DEPRECATED = 1 << 5;
        /// The element overrides (or is shadowed by) an ancestor's member.
        const OVERRIDE = 1 << 6;
        /// Ancestor hydration has completed for this class.
        const HYDRATED = 1 << 7;
        const VARIADIC = 1 << 8;
        const BY_REFERENCE = 1 << 9;
        /// The function-like body contains a `yield`.
        const HAS_YIELD = 1 << 10;
        const RETURNS_REFERENCE = 1 << 11;
        const CLOSURE = 1 << 12;
        /// Provided by the engine rather than declared in analyzed code.
        const INTERNAL = 1 << 13;
        /// The union type came from a doc-comment rather than a declaration.
        const FROM_DOC = 1 << 14;
        /// Synthesized during analysis (e.g. through `__get` or a dynamic write).
        const DYNAMIC = 1 << 15;
    }
}

impl MetadataFlags {
    #[inline]
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        self.contains(MetadataFlags::ABSTRACT)
    }

    #[inline]
    #[must_use]
    pub const fn is_static(self) -> bool {
        self.contains(MetadataFlags::STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_interface(self) -> bool {
        self.contains(MetadataFlags::INTERFACE)
    }

    #[inline]
    #[must_use]
    pub const fn is_trait(self) -> bool {
        self.contains(MetadataFlags::TRAIT)
    }

    #[inline]
    #[must_use]
    pub const fn is_deprecated(self) -> bool {
        self.contains(MetadataFlags::DEPRECATED)
    }

    #[inline]
    #[must_use]
    pub const fn is_override(self) -> bool {
        self.contains(MetadataFlags::OVERRIDE)
    }

    #[inline]
    #[must_use]
    pub const fn is_hydrated(self) -> bool {
        self.contains(MetadataFlags::HYDRATED)
    }

    #[inline]
    #[must_use]
    pub const fn is_variadic(self) -> bool {
        self.contains(MetadataFlags::VARIADIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_by_reference(self) -> bool {
        self.contains(MetadataFlags::BY_REFERENCE)
    }

    #[inline]
    #[must_use]
    pub const fn has_yield(self) -> bool {
        self.contains(MetadataFlags::HAS_YIELD)
    }

    #[inline]
    #[must_use]
    pub const fn is_closure(self) -> bool {
        self.contains(MetadataFlags::CLOSURE)
    }

    #[inline]
    #[must_use]
    pub const fn is_internal(self) -> bool {
        self.contains(MetadataFlags::INTERNAL)
    }
}

/// Member visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    /// Whether `self` is more restrictive than `other`.
    #[inline]
    #[must_use]
    pub fn is_narrower_than(self, other: Visibility) -> bool {
        self > other
    }
}

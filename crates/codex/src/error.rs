use std::fmt;

use augur_atom::Atom;

/// A requested FQSEN is absent from the codebase.
///
/// This is a recoverable condition: callers usually respond by emitting the
/// appropriate `Undeclared*` diagnostic and continuing with an empty union
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSymbol {
    /// Canonical rendering of the missing FQSEN.
    pub fqsen: Atom,
}

impl MissingSymbol {
    #[must_use]
    pub fn new(fqsen: Atom) -> Self {
        Self { fqsen }
    }
}

impl fmt::Display for MissingSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "symbol `{}` not found in the codebase", self.fqsen)
    }
}

impl std::error::Error for MissingSymbol {}

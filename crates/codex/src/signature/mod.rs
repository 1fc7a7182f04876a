//! The bundled signature map for internal functions.
//!
//! The engine's built-in functions have no declarations in analyzed code,
//! so their parameter and return unions come from a versioned JSON resource
//! compiled into the binary. The map is parsed once at [`CodeBase`]
//! construction and consulted whenever a resolved internal function carries
//! an empty union type.
//!
//! [`CodeBase`]: crate::metadata::CodeBase

use serde::Deserialize;

use augur_atom::Atom;
use augur_atom::AtomMap;
use augur_atom::AtomSet;
use augur_atom::ascii_lowercase_atom;

use crate::names::NameContext;
use crate::ttype::union::UnionType;

/// The raw JSON shape of one bundled signature.
#[derive(Debug, Deserialize)]
struct RawSignature {
    #[serde(rename = "return")]
    return_type: String,
    #[serde(default)]
    params: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    type_string: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    variadic: bool,
    #[serde(default)]
    by_reference: bool,
}

/// A parsed internal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalParameter {
    pub name: Atom,
    pub union_type: UnionType,
    pub optional: bool,
    pub variadic: bool,
    pub by_reference: bool,
}

/// A parsed internal function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalSignature {
    pub parameters: Vec<InternalParameter>,
    pub return_union: UnionType,
}

impl InternalSignature {
    /// Number of parameters without a default.
    #[must_use]
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| !p.optional && !p.variadic).count()
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.variadic)
    }

    /// The formal for the actual at `position`, with the variadic tail
    /// repeating.
    #[must_use]
    pub fn parameter_at(&self, position: usize) -> Option<&InternalParameter> {
        match self.parameters.get(position) {
            Some(parameter) => Some(parameter),
            None => self.parameters.last().filter(|p| p.variadic),
        }
    }
}

/// Parses the bundled resource into the signature map, keyed by lowercased
/// bare function name.
#[must_use]
pub fn builtin_signatures() -> AtomMap<InternalSignature> {
    let raw: std::collections::BTreeMap<String, RawSignature> =
        serde_json::from_str(include_str!("../../resources/signatures.json"))
            .expect("bundled signature resource is well-formed");

    let context = NameContext::new();
    let templates = AtomSet::default();

    let mut signatures = AtomMap::default();
    for (name, signature) in raw {
        let parameters = signature
            .params
            .into_iter()
            .map(|parameter| InternalParameter {
                name: augur_atom::atom(&parameter.name),
                union_type: UnionType::from_string_in_context(&parameter.type_string, &context, &templates),
                optional: parameter.optional,
                variadic: parameter.variadic,
                by_reference: parameter.by_reference,
            })
            .collect();

        signatures.insert(
            ascii_lowercase_atom(&name),
            InternalSignature {
                parameters,
                return_union: UnionType::from_string_in_context(&signature.return_type, &context, &templates),
            },
        );
    }

    signatures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_resource_parses() {
        let signatures = builtin_signatures();

        assert!(signatures.len() >= 40, "bundle unexpectedly small: {}", signatures.len());

        let implode = &signatures[&augur_atom::atom("implode")];
        assert_eq!(implode.return_union.to_string(), "string");
        assert_eq!(implode.required_count(), 1);

        let sprintf = &signatures[&augur_atom::atom("sprintf")];
        assert!(sprintf.is_variadic());
    }
}

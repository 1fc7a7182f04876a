//! Atomic types.
//!
//! A [`Type`] is a tagged variant: one of the twelve native types, a class
//! instance (optionally carrying template parameters), a generic array of
//! an element type, a callable bound to a closure FQSEN, or a template
//! placeholder. Types compare by structural equality of their parts.
//!
//! The set-of-types currency of the analyzer is [`UnionType`], defined in
//! [`union`].

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use augur_ast::Value;
use augur_atom::Atom;
use augur_atom::AtomSet;
use augur_atom::atom;

use crate::fqsen::ClassFqsen;
use crate::fqsen::FunctionFqsen;
use crate::names::NameContext;
use crate::ttype::union::UnionType;

pub mod union;

/// The built-in native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
    Array,
    Bool,
    Callable,
    Float,
    Int,
    Null,
    Object,
    String,
    Mixed,
    Void,
    Resource,
    Static,
}

impl NativeType {
    /// Maps a written type name (including common aliases) to a native type.
    #[must_use]
    pub fn from_name(name: &str) -> Option<NativeType> {
        Some(match name {
            "array" => NativeType::Array,
            "bool" | "boolean" | "true" | "false" => NativeType::Bool,
            "callable" => NativeType::Callable,
            "float" | "double" => NativeType::Float,
            "int" | "integer" => NativeType::Int,
            "null" => NativeType::Null,
            "object" => NativeType::Object,
            "string" => NativeType::String,
            "mixed" => NativeType::Mixed,
            "void" => NativeType::Void,
            "resource" => NativeType::Resource,
            "static" | "self" | "$this" => NativeType::Static,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NativeType::Array => "array",
            NativeType::Bool => "bool",
            NativeType::Callable => "callable",
            NativeType::Float => "float",
            NativeType::Int => "int",
            NativeType::Null => "null",
            NativeType::Object => "object",
            NativeType::String => "string",
            NativeType::Mixed => "mixed",
            NativeType::Void => "void",
            NativeType::Resource => "resource",
            NativeType::Static => "static",
        }
    }

    /// Whether values of this type coerce to `string` in weak mode.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self, NativeType::Bool | NativeType::Float | NativeType::Int | NativeType::String)
    }
}

/// An atomic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// One of the built-in native types.
    Native(NativeType),
    /// An instance of a class, optionally with template parameters bound.
    ClassInstance { fqsen: ClassFqsen, parameters: Vec<UnionType> },
    /// An array whose element type is tracked (`T[]`).
    GenericArray(Box<Type>),
    /// A callable bound to the closure declared at a known location.
    ClosureCallable(FunctionFqsen),
    /// A template placeholder from an `@template` declaration.
    Template(Atom),
}

impl Type {
    #[inline]
    #[must_use]
    pub fn native(native: NativeType) -> Type {
        Type::Native(native)
    }

    #[inline]
    #[must_use]
    pub fn class(fqsen: ClassFqsen) -> Type {
        Type::ClassInstance { fqsen, parameters: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn generic_array(element: Type) -> Type {
        Type::GenericArray(Box::new(element))
    }

    /// Lifts a literal value to its native type.
    #[must_use]
    pub fn from_literal(value: &Value) -> Type {
        match value {
            Value::Null => Type::Native(NativeType::Null),
            Value::Bool(_) => Type::Native(NativeType::Bool),
            Value::Int(_) => Type::Native(NativeType::Int),
            Value::Float(_) => Type::Native(NativeType::Float),
            Value::Str(_) => Type::Native(NativeType::String),
        }
    }

    /// Parses one type expression in a name-resolution context.
    ///
    /// `templates` holds the template identifiers in scope; matching bare
    /// identifiers become [`Type::Template`] instead of class references.
    /// Returns `None` for input that is not a type expression.
    #[must_use]
    pub fn from_string_in_context(source: &str, context: &NameContext, templates: &AtomSet) -> Option<Type> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }

        // `T[]` wraps the element type as a generic array.
        if let Some(element_source) = source.strip_suffix("[]") {
            let element = Type::from_string_in_context(element_source, context, templates)?;
            return Some(Type::generic_array(element));
        }

        if !source.starts_with('\\') {
            if let Some(native) = NativeType::from_name(source) {
                return Some(Type::Native(native));
            }

            if templates.contains(&atom(source)) {
                return Some(Type::Template(atom(source)));
            }
        }

        // `Name<p1, p2>` binds template parameters on a class instance.
        if let Some(open) = source.find('<') {
            let close = source.rfind('>')?;
            let name = &source[..open];
            let fqsen = ClassFqsen::from_full_name(&context.resolve_class(name, false));

            let mut parameters = Vec::new();
            for piece in split_top_level(&source[open + 1..close], ',') {
                parameters.push(UnionType::from_string_in_context(piece, context, templates));
            }

            return Some(Type::ClassInstance { fqsen, parameters });
        }

        if !is_identifier_path(source) {
            return None;
        }

        Some(Type::class(ClassFqsen::from_full_name(&context.resolve_class(source, false))))
    }

    #[inline]
    #[must_use]
    pub fn is_native(&self, native: NativeType) -> bool {
        matches!(self, Type::Native(kind) if *kind == native)
    }

    /// Whether this type is `array` or a generic array.
    #[inline]
    #[must_use]
    pub fn is_array_like(&self) -> bool {
        matches!(self, Type::GenericArray(_)) || self.is_native(NativeType::Array)
    }

    /// Whether this type can be called.
    #[inline]
    #[must_use]
    pub fn is_callable_like(&self) -> bool {
        matches!(self, Type::ClosureCallable(_)) || self.is_native(NativeType::Callable)
    }

    /// The class FQSEN, for class-instance types.
    #[inline]
    #[must_use]
    pub fn class_fqsen(&self) -> Option<ClassFqsen> {
        match self {
            Type::ClassInstance { fqsen, .. } => Some(*fqsen),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Native(native) => f.write_str(native.as_str()),
            Type::ClassInstance { fqsen, parameters } => {
                write!(f, "{fqsen}")?;
                if !parameters.is_empty() {
                    write!(f, "<")?;
                    for (index, parameter) in parameters.iter().enumerate() {
                        if index > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{parameter}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::GenericArray(element) => write!(f, "{element}[]"),
            Type::ClosureCallable(_) => f.write_str("callable"),
            Type::Template(name) => f.write_str(name),
        }
    }
}

/// Splits `source` on `separator` at nesting depth zero with respect to
/// `<>` pairs.
pub(crate) fn split_top_level(source: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (index, c) in source.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                pieces.push(source[start..index].trim());
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(source[start..].trim());

    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn is_identifier_path(source: &str) -> bool {
    let source = source.strip_prefix('\\').unwrap_or(source);

    !source.is_empty()
        && source.split('\\').all(|segment| {
            !segment.is_empty()
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !segment.starts_with(|c: char| c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_literal() {
        assert_eq!(Type::from_literal(&Value::Int(3)), Type::Native(NativeType::Int));
        assert_eq!(Type::from_literal(&Value::Str("x".into())), Type::Native(NativeType::String));
        assert_eq!(Type::from_literal(&Value::Null), Type::Native(NativeType::Null));
    }

    #[test]
    fn test_parse_native_and_generic_array() {
        let context = NameContext::new();
        let templates = AtomSet::default();

        assert_eq!(Type::from_string_in_context("int", &context, &templates), Some(Type::Native(NativeType::Int)));
        assert_eq!(
            Type::from_string_in_context("string[]", &context, &templates),
            Some(Type::generic_array(Type::Native(NativeType::String))),
        );
        assert_eq!(
            Type::from_string_in_context("int[][]", &context, &templates),
            Some(Type::generic_array(Type::generic_array(Type::Native(NativeType::Int)))),
        );
    }

    #[test]
    fn test_parse_class_through_context() {
        let context = NameContext::new().with_namespace(atom("N"));
        let templates = AtomSet::default();

        let parsed = Type::from_string_in_context("Widget", &context, &templates).unwrap();
        assert_eq!(parsed, Type::class(ClassFqsen::from_full_name("\\N\\Widget")));

        let parsed = Type::from_string_in_context("\\Other\\Widget", &context, &templates).unwrap();
        assert_eq!(parsed, Type::class(ClassFqsen::from_full_name("\\Other\\Widget")));
    }

    #[test]
    fn test_parse_template_identifier() {
        let context = NameContext::new();
        let mut templates = AtomSet::default();
        templates.insert(atom("T"));

        assert_eq!(Type::from_string_in_context("T", &context, &templates), Some(Type::Template(atom("T"))));
        assert_eq!(
            Type::from_string_in_context("T[]", &context, &templates),
            Some(Type::generic_array(Type::Template(atom("T")))),
        );
    }

    #[test]
    fn test_parse_parameterized_class() {
        let context = NameContext::new();
        let templates = AtomSet::default();

        let parsed = Type::from_string_in_context("Container<int, string>", &context, &templates).unwrap();
        let Type::ClassInstance { fqsen, parameters } = parsed else {
            panic!("expected a class instance");
        };

        assert_eq!(fqsen, ClassFqsen::from_full_name("\\Container"));
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].to_string(), "int");
        assert_eq!(parameters[1].to_string(), "string");
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!(Type::generic_array(Type::Native(NativeType::Int)).to_string(), "int[]");
        assert_eq!(Type::class(ClassFqsen::from_full_name("\\A\\B")).to_string(), "\\A\\B");
    }
}

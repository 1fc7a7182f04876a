use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// An `@param T $name` tag.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ParameterTag {
    /// The parameter name, without the `$` sigil, `...`, or `&`.
    pub name: String,
    /// The raw union-type expression preceding the variable.
    pub type_string: String,
    /// Whether `...` was present on the variable.
    pub is_variadic: bool,
}

impl ParameterTag {
    /// Parses the body of an `@param` tag (`"T $name description"`).
    ///
    /// Returns `None` when either the type or the variable is absent; a
    /// bare `@param $name` carries no information the analyzer can use.
    #[must_use]
    pub fn parse(content: &str) -> Option<ParameterTag> {
        let mut words = content.split_whitespace();
        let type_string = words.next()?;
        if type_string.starts_with('$') {
            return None;
        }

        let variable = words.next()?;
        let (name, is_variadic) = parse_variable(variable)?;

        Some(ParameterTag { name: name.to_string(), type_string: type_string.to_string(), is_variadic })
    }
}

impl fmt::Display for ParameterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variadic {
            write!(f, "{} ...${}", self.type_string, self.name)
        } else {
            write!(f, "{} ${}", self.type_string, self.name)
        }
    }
}

/// An `@var T [$name]` tag.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct VarTag {
    /// The raw union-type expression.
    pub type_string: String,
    /// The annotated variable name (without `$`), when one follows the type.
    pub name: Option<String>,
}

impl VarTag {
    /// Parses the body of an `@var` tag (`"T [$name] description"`).
    #[must_use]
    pub fn parse(content: &str) -> Option<VarTag> {
        let mut words = content.split_whitespace();
        let type_string = words.next()?;
        if type_string.starts_with('$') {
            return None;
        }

        let name = words.next().and_then(parse_variable).map(|(name, _)| name.to_string());

        Some(VarTag { type_string: type_string.to_string(), name })
    }
}

/// An `@return T` tag.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ReturnTag {
    /// The raw union-type expression.
    pub type_string: String,
}

impl ReturnTag {
    /// Parses the body of an `@return` tag (`"T description"`).
    #[must_use]
    pub fn parse(content: &str) -> Option<ReturnTag> {
        let type_string = content.split_whitespace().next()?;
        if type_string.starts_with('$') {
            return None;
        }

        Some(ReturnTag { type_string: type_string.to_string() })
    }
}

/// An `@template T` declaration.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TemplateTag {
    /// The template parameter identifier.
    pub name: String,
}

impl TemplateTag {
    /// Parses the body of an `@template` tag.
    #[must_use]
    pub fn parse(content: &str) -> Option<TemplateTag> {
        let name = content.split_whitespace().next()?;
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }

        Some(TemplateTag { name: name.to_string() })
    }
}

/// Parses a doc-comment variable token (`$name`, `...$name`, `&$name`).
///
/// Returns the bare name and whether `...` was present; `None` when the
/// token is not a variable.
fn parse_variable(token: &str) -> Option<(&str, bool)> {
    let token = token.strip_prefix('&').unwrap_or(token);
    let (token, is_variadic) = match token.strip_prefix("...") {
        Some(rest) => (rest, true),
        None => (token, false),
    };

    let name = token.strip_prefix('$')?;
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some((name, is_variadic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_tag_display_round_trip() {
        let tag = ParameterTag::parse("int $x counts things").unwrap();
        assert_eq!(tag.to_string(), "int $x");

        let tag = ParameterTag::parse("string ...$parts").unwrap();
        assert_eq!(tag.to_string(), "string ...$parts");
    }

    #[test]
    fn test_variable_token_forms() {
        assert_eq!(parse_variable("$foo"), Some(("foo", false)));
        assert_eq!(parse_variable("&$foo"), Some(("foo", false)));
        assert_eq!(parse_variable("...$ids"), Some(("ids", true)));
        assert_eq!(parse_variable("$"), None);
        assert_eq!(parse_variable("$1x"), None);
        assert_eq!(parse_variable("foo"), None);
    }

    #[test]
    fn test_template_tag_rejects_punctuation() {
        assert!(TemplateTag::parse("T").is_some());
        assert!(TemplateTag::parse("T<U>").is_none());
    }
}

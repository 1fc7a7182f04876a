//! Line-oriented doc-comment parsing.
//!
//! A doc-comment is scanned line by line for the tags the analyzer
//! understands: `@param`, `@var`, `@return`, `@template`, `@inherits`,
//! `@deprecated`, and `@suppress`. Tags carry *raw* type strings; resolving
//! them against a namespace context is the type system's job, not this
//! crate's.
//!
//! Unknown tags and free-form description text are skipped without error:
//! doc-comments are written by humans and a strict grammar would reject
//! most real-world input.

use crate::tag::ParameterTag;
use crate::tag::ReturnTag;
use crate::tag::TemplateTag;
use crate::tag::VarTag;

pub mod tag;

/// The parsed content of a single doc-comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    /// `@param T $name` tags, in source order.
    pub parameters: Vec<ParameterTag>,
    /// `@var T [$name]` tags, in source order.
    pub var_tags: Vec<VarTag>,
    /// The first `@return T` tag, if any.
    pub return_tag: Option<ReturnTag>,
    /// `@template T` declarations, in source order.
    pub templates: Vec<TemplateTag>,
    /// The first `@inherits Parent<...>` tag, if any.
    pub inherits: Option<String>,
    /// Whether an `@deprecated` tag is present.
    pub is_deprecated: bool,
    /// Issue type names listed by `@suppress` tags.
    pub suppressions: Vec<String>,
}

impl Comment {
    /// Parses a doc-comment.
    ///
    /// The input may include the `/** ... */` delimiters and per-line `*`
    /// gutters; both are stripped.
    #[must_use]
    pub fn parse(text: &str) -> Comment {
        let mut comment = Comment::default();

        for line in text.lines() {
            let line = strip_gutter(line);

            let Some(rest) = line.strip_prefix('@') else {
                continue;
            };

            let (tag_name, content) = match rest.find(char::is_whitespace) {
                Some(index) => (&rest[..index], rest[index..].trim_start()),
                None => (rest, ""),
            };

            match tag_name {
                "param" => {
                    if let Some(tag) = ParameterTag::parse(content) {
                        comment.parameters.push(tag);
                    }
                }
                "var" => {
                    if let Some(tag) = VarTag::parse(content) {
                        comment.var_tags.push(tag);
                    }
                }
                "return" | "returns" => {
                    if comment.return_tag.is_none()
                        && let Some(tag) = ReturnTag::parse(content)
                    {
                        comment.return_tag = Some(tag);
                    }
                }
                "template" => {
                    if let Some(tag) = TemplateTag::parse(content) {
                        comment.templates.push(tag);
                    }
                }
                "inherits" | "extends" => {
                    if comment.inherits.is_none() && !content.is_empty() {
                        comment.inherits = Some(first_word(content).to_string());
                    }
                }
                "deprecated" => {
                    comment.is_deprecated = true;
                }
                "suppress" => {
                    if !content.is_empty() {
                        comment.suppressions.push(first_word(content).to_string());
                    }
                }
                _ => {}
            }
        }

        comment
    }

    /// Whether the comment carries nothing the analyzer consumes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.var_tags.is_empty()
            && self.return_tag.is_none()
            && self.templates.is_empty()
            && self.inherits.is_none()
            && !self.is_deprecated
            && self.suppressions.is_empty()
    }

    /// The `@param` tag for the given parameter name (without `$`), if any.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterTag> {
        self.parameters.iter().find(|tag| tag.name == name)
    }
}

/// Strips comment delimiters and the leading `*` gutter from one line.
fn strip_gutter(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix("/**").unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line);
    let line = line.trim_start_matches('*');
    line.trim()
}

/// The first whitespace-delimited word of a tag body.
fn first_word(content: &str) -> &str {
    content.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn test_parse_all_tags() {
        let text = indoc! {r"
            /**
             * Maps each key to a value.
             *
             * @template T
             * @inherits Container<int>
             * @param string $key the lookup key
             * @param T[] $values
             * @var int $count
             * @return T|null
             * @deprecated
             * @suppress UndeclaredProperty
             */
        "};

        let comment = Comment::parse(text);

        assert_eq!(comment.templates.len(), 1);
        assert_eq!(comment.templates[0].name, "T");
        assert_eq!(comment.inherits.as_deref(), Some("Container<int>"));

        assert_eq!(comment.parameters.len(), 2);
        assert_eq!(comment.parameters[0].name, "key");
        assert_eq!(comment.parameters[0].type_string, "string");
        assert_eq!(comment.parameters[1].name, "values");
        assert_eq!(comment.parameters[1].type_string, "T[]");

        assert_eq!(comment.var_tags.len(), 1);
        assert_eq!(comment.var_tags[0].name.as_deref(), Some("count"));
        assert_eq!(comment.var_tags[0].type_string, "int");

        assert_eq!(comment.return_tag.as_ref().map(|t| t.type_string.as_str()), Some("T|null"));
        assert!(comment.is_deprecated);
        assert_eq!(comment.suppressions, vec!["UndeclaredProperty".to_string()]);
    }

    #[test]
    fn test_unknown_tags_are_skipped() {
        let comment = Comment::parse("/** @throws \\Exception when it rains\n * @author nobody */");

        assert!(comment.is_empty());
    }

    #[test]
    fn test_var_tag_without_variable() {
        let comment = Comment::parse("/** @var string[]|null */");

        assert_eq!(comment.var_tags.len(), 1);
        assert_eq!(comment.var_tags[0].type_string, "string[]|null");
        assert!(comment.var_tags[0].name.is_none());
    }

    #[test]
    fn test_param_without_type_is_skipped() {
        let comment = Comment::parse("/** @param $value */");

        assert!(comment.parameters.is_empty());
    }

    #[test]
    fn test_first_return_tag_wins() {
        let comment = Comment::parse("/** @return int\n * @return string */");

        assert_eq!(comment.return_tag.as_ref().map(|t| t.type_string.as_str()), Some("int"));
    }

    #[test]
    fn test_single_line_comment() {
        let comment = Comment::parse("/** @var \\Ns\\Widget $widget */");

        assert_eq!(comment.var_tags.len(), 1);
        assert_eq!(comment.var_tags[0].type_string, "\\Ns\\Widget");
        assert_eq!(comment.var_tags[0].name.as_deref(), Some("widget"));
    }
}

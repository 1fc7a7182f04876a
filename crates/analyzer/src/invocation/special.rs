//! Hand-coded checks for built-ins whose contracts depend on arity or on
//! another argument's type.

use augur_ast::Node;
use augur_atom::Atom;

use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;

impl Analyzer<'_> {
    /// Second-pass checks for the special-cased built-ins, run after the
    /// generic argument validation.
    pub(crate) fn check_special_call(&mut self, context: &Context, name: Atom, arguments: Option<&Node>) {
        let Some(list) = arguments else {
            return;
        };
        let argument_nodes: Vec<&Node> = list.children.iter().collect();

        match name.as_str() {
            // One-argument form takes the pieces array directly.
            "implode" => {
                if argument_nodes.len() == 1 {
                    let actual = self.union_type_or_empty(context, argument_nodes[0]);
                    if !actual.is_empty() && !is_array_castable(&actual) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial2,
                            argument_nodes[0].line,
                            vec![
                                "1".to_string(),
                                "array".to_string(),
                                actual.to_string(),
                                "\\implode".to_string(),
                                "array".to_string(),
                            ],
                        );
                    }
                } else if argument_nodes.len() >= 2 {
                    // Historical argument orders both pass; an array glue
                    // with a non-string pieces argument does not.
                    let first = self.union_type_or_empty(context, argument_nodes[0]);
                    let second = self.union_type_or_empty(context, argument_nodes[1]);
                    if is_array_castable(&first) && !second.is_empty() && !is_string_castable(&second) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial1,
                            argument_nodes[1].line,
                            vec![
                                "2".to_string(),
                                "separator".to_string(),
                                second.to_string(),
                                "\\implode".to_string(),
                                "string".to_string(),
                                "1".to_string(),
                                "array".to_string(),
                            ],
                        );
                    }
                }
            }

            // A single argument must be an array to take the minimum or
            // maximum over.
            "min" | "max" => {
                if argument_nodes.len() == 1 {
                    let actual = self.union_type_or_empty(context, argument_nodes[0]);
                    if !actual.is_empty() && !is_array_castable(&actual) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial2,
                            argument_nodes[0].line,
                            vec![
                                "1".to_string(),
                                "value".to_string(),
                                actual.to_string(),
                                format!("\\{name}"),
                                "array".to_string(),
                            ],
                        );
                    }
                }
            }

            // The trailing argument is the comparison callback.
            "array_udiff" | "array_diff_uassoc" => {
                if let Some(last) = argument_nodes.last() {
                    let actual = self.union_type_or_empty(context, last);
                    if !actual.is_empty() && !is_callable_castable(&actual) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial3,
                            last.line,
                            vec![format!("\\{name}"), "callable".to_string()],
                        );
                    }
                }
            }

            // Both trailing arguments are callbacks.
            "array_udiff_uassoc" => {
                if argument_nodes.len() >= 2 {
                    let second_to_last = argument_nodes[argument_nodes.len() - 2];
                    let actual = self.union_type_or_empty(context, second_to_last);
                    if !actual.is_empty() && !is_callable_castable(&actual) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial4,
                            second_to_last.line,
                            vec![format!("\\{name}"), "callable".to_string()],
                        );
                    }
                }
            }

            // `strtok(string)` continues a prior tokenization; both arities
            // are fine, but the one-argument form still needs a string.
            "strtok" => {
                if argument_nodes.len() == 1 {
                    let actual = self.union_type_or_empty(context, argument_nodes[0]);
                    if !actual.is_empty() && !is_string_castable(&actual) {
                        self.emit(
                            context,
                            IssueKind::ParamSpecial2,
                            argument_nodes[0].line,
                            vec![
                                "1".to_string(),
                                "string".to_string(),
                                actual.to_string(),
                                "\\strtok".to_string(),
                                "string".to_string(),
                            ],
                        );
                    }
                }
            }

            _ => {}
        }
    }
}

fn is_array_castable(union: &UnionType) -> bool {
    union.types().iter().any(|t| t.is_array_like() || t.is_native(NativeType::Mixed))
}

fn is_string_castable(union: &UnionType) -> bool {
    union.types().iter().any(|t| {
        matches!(
            t,
            Type::Native(
                NativeType::String | NativeType::Int | NativeType::Float | NativeType::Bool | NativeType::Mixed
            )
        )
    })
}

fn is_callable_castable(union: &UnionType) -> bool {
    union.types().iter().any(|t| {
        t.is_callable_like() || t.is_native(NativeType::String) || t.is_native(NativeType::Mixed) || t.is_array_like()
    })
}

//! Call-site argument validation.
//!
//! Every call site runs through [`Analyzer::check_argument_list`]: arity
//! checks (skipped under argument unpacking), pass-by-reference shape
//! checks, and expanded actual-to-formal cast checks. A call target with
//! alternate overloads passes a check if **any** overload accepts it.

use augur_ast::Node;
use augur_ast::NodeKind;
use augur_atom::Atom;

use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::metadata::function_like::FunctionLikeMetadata;
use augur_codex::signature::InternalSignature;
use augur_codex::ttype::NativeType;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;

pub mod special;

/// One formal parameter, as seen from a call site.
#[derive(Debug, Clone)]
pub(crate) struct FormalView {
    pub name: Atom,
    pub union_type: UnionType,
    pub by_reference: bool,
}

/// One overload of a call target.
#[derive(Debug, Clone)]
pub(crate) struct OverloadView {
    pub required: usize,
    pub total: usize,
    pub variadic: bool,
    pub formals: Vec<FormalView>,
}

impl OverloadView {
    fn accepts_count(&self, count: usize) -> bool {
        count >= self.required && (self.variadic || count <= self.total)
    }

    fn formal_at(&self, position: usize) -> Option<&FormalView> {
        match self.formals.get(position) {
            Some(formal) => Some(formal),
            None if self.variadic => self.formals.last(),
            None => None,
        }
    }
}

/// A call target detached from the codebase borrow, so argument inference
/// can run while checking.
#[derive(Debug, Clone)]
pub(crate) struct CallableView {
    /// Rendered FQSEN used in messages.
    pub display: String,
    /// Internal targets use the `*Internal` issue variants.
    pub internal: bool,
    pub declared_at: Option<(Atom, u32)>,
    /// Primary signature first, alternates after.
    pub overloads: Vec<OverloadView>,
}

impl CallableView {
    pub(crate) fn from_function_like(function: &FunctionLikeMetadata) -> Self {
        Self::from_function_likes(vec![function])
    }

    pub(crate) fn from_function_likes(functions: Vec<&FunctionLikeMetadata>) -> Self {
        let primary = functions.first().expect("at least one overload");

        let display = match primary.fqsen {
            FunctionLikeFqsen::Method(member) => member.to_atom().to_string(),
            FunctionLikeFqsen::Function(fqsen) | FunctionLikeFqsen::Closure(fqsen) => {
                fqsen.with_alternate(0).to_atom().to_string()
            }
        };

        let overloads = functions
            .iter()
            .map(|function| OverloadView {
                required: function.required_parameter_count as usize,
                total: function.parameter_count() as usize,
                variadic: function.is_variadic(),
                formals: function
                    .parameters
                    .iter()
                    .map(|parameter| FormalView {
                        name: parameter.name,
                        union_type: parameter.union_type.clone(),
                        by_reference: parameter.flags.is_by_reference(),
                    })
                    .collect(),
            })
            .collect();

        Self { display, internal: false, declared_at: Some((primary.file, primary.line)), overloads }
    }

    pub(crate) fn from_internal(name: Atom, signature: &InternalSignature) -> Self {
        let overload = OverloadView {
            required: signature.required_count(),
            total: signature.total_count(),
            variadic: signature.is_variadic(),
            formals: signature
                .parameters
                .iter()
                .map(|parameter| FormalView {
                    name: parameter.name,
                    union_type: parameter.union_type.clone(),
                    by_reference: parameter.by_reference,
                })
                .collect(),
        };

        Self { display: format!("\\{name}"), internal: true, declared_at: None, overloads: vec![overload] }
    }
}

impl Analyzer<'_> {
    /// Validates an argument list against a call target.
    pub(crate) fn check_argument_list(&mut self, context: &Context, view: &CallableView, arguments: Option<&Node>) {
        let empty = Vec::new();
        let (argument_nodes, line) = match arguments {
            Some(list) if list.kind == NodeKind::ArgList => (&list.children, list.line),
            Some(list) => (&empty, list.line),
            None => (&empty, context.line),
        };

        // Unpacking defeats static arity reasoning entirely.
        let has_unpack = argument_nodes.iter().any(|argument| argument.kind == NodeKind::Unpack);
        let count = argument_nodes.len();

        if !has_unpack {
            let minimum_required = view.overloads.iter().map(|overload| overload.required).min().unwrap_or(0);
            let any_accepts = view.overloads.iter().any(|overload| overload.accepts_count(count));

            if count < minimum_required && !any_accepts {
                let (kind, mut message_arguments) = if view.internal {
                    (IssueKind::ParamTooFewInternal, vec![
                        count.to_string(),
                        view.display.clone(),
                        minimum_required.to_string(),
                    ])
                } else {
                    (IssueKind::ParamTooFew, vec![
                        count.to_string(),
                        view.display.clone(),
                        minimum_required.to_string(),
                    ])
                };
                if let Some((file, declared_line)) = view.declared_at
                    && !view.internal
                {
                    message_arguments.push(file.to_string());
                    message_arguments.push(declared_line.to_string());
                }
                self.emit(context, kind, line, message_arguments);
            } else if !any_accepts && count > 0 {
                let maximum_total = view.overloads.iter().map(|overload| overload.total).max().unwrap_or(0);
                if count > maximum_total {
                    let (kind, mut message_arguments) = if view.internal {
                        (IssueKind::ParamTooManyInternal, vec![
                            count.to_string(),
                            view.display.clone(),
                            maximum_total.to_string(),
                        ])
                    } else {
                        (IssueKind::ParamTooMany, vec![
                            count.to_string(),
                            view.display.clone(),
                            maximum_total.to_string(),
                        ])
                    };
                    if let Some((file, declared_line)) = view.declared_at
                        && !view.internal
                    {
                        message_arguments.push(file.to_string());
                        message_arguments.push(declared_line.to_string());
                    }
                    self.emit(context, kind, line, message_arguments);
                }
            }
        }

        let primary = &view.overloads[0];
        for (position, argument) in argument_nodes.iter().enumerate() {
            if argument.kind == NodeKind::Unpack {
                continue;
            }

            let Some(formal) = primary.formal_at(position) else {
                continue;
            };

            // Pass-by-reference needs an assignable place.
            if formal.by_reference && !is_reference_assignable(argument) {
                self.emit(
                    context,
                    IssueKind::TypeNonVarPassByRef,
                    argument.line,
                    vec![(position + 1).to_string(), view.display.clone()],
                );
                continue;
            }

            let actual = self.union_type_or_empty(context, argument);
            if actual.is_empty() || formal.union_type.is_empty() {
                continue;
            }
            // Template-typed formals resolve per instantiation, not here.
            if formal.union_type.has_template_type() {
                continue;
            }

            let expanded = actual.as_expanded_types(self.codebase);
            let accepted = view.overloads.iter().any(|overload| {
                overload
                    .formal_at(position)
                    .is_none_or(|candidate| expanded.can_cast_to_union(&candidate.union_type, self.codebase))
            });
            if accepted {
                continue;
            }

            // Weak mode accepts a stringable object where a string is
            // expected.
            if !context.strict_types
                && formal.union_type.has_native(NativeType::String)
                && self.has_to_string_method(&actual)
            {
                continue;
            }

            let (kind, mut message_arguments) = if view.internal {
                (IssueKind::TypeMismatchArgumentInternal, vec![
                    (position + 1).to_string(),
                    formal.name.to_string(),
                    actual.to_string(),
                    view.display.clone(),
                    formal.union_type.to_string(),
                ])
            } else {
                (IssueKind::TypeMismatchArgument, vec![
                    (position + 1).to_string(),
                    formal.name.to_string(),
                    actual.to_string(),
                    view.display.clone(),
                    formal.union_type.to_string(),
                ])
            };
            if let Some((file, declared_line)) = view.declared_at
                && !view.internal
            {
                message_arguments.push(file.to_string());
                message_arguments.push(declared_line.to_string());
            }
            self.emit(context, kind, argument.line, message_arguments);
        }
    }

    /// Whether any class in the union declares `__toString`.
    fn has_to_string_method(&self, union: &UnionType) -> bool {
        union.class_fqsens().into_iter().any(|fqsen| {
            self.codebase
                .get_class_by_fqsen(fqsen)
                .is_ok_and(|class| class.has_method("__toString"))
        })
    }
}

/// Whether an argument expression can back a by-reference parameter.
fn is_reference_assignable(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Var | NodeKind::Dim | NodeKind::Prop | NodeKind::StaticProp)
}

//! Scope joins at branching constructs.
//!
//! `if`/`elseif`/`else` chains and `try`/`catch`/`finally` produce one
//! scope per control-flow path; these functions merge them back into the
//! single scope analysis continues with.

use ahash::HashMap;
use ahash::HashSet;

use augur_atom::Atom;

use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;

use crate::context::scope::Scope;
use crate::context::scope::Variable;

/// Joins the sibling scopes of an `if` chain.
///
/// A variable defined on **all** branches keeps the union of its per-branch
/// types. A variable defined on only some branches gets the element-wise
/// union plus `null` in weak mode, and is dropped entirely in strict mode.
/// The caller includes the fall-through scope as a branch when no `else`
/// covers it.
#[must_use]
pub(crate) fn merge_branch_scopes(base: &Scope, branches: &[Scope], strict: bool) -> Scope {
    if branches.is_empty() {
        return base.clone();
    }

    let mut names: HashSet<Atom> = HashSet::default();
    for branch in branches {
        names.extend(branch.variable_names());
    }

    let mut merged = base.clone();
    for name in names {
        let mut present_in_all = true;
        let mut union = None;

        for branch in branches {
            match branch.get_variable(name) {
                Some(variable) => match &mut union {
                    None => union = Some(variable.union_type.clone()),
                    Some(existing) => existing.add_union(&variable.union_type),
                },
                None => present_in_all = false,
            }
        }

        let Some(mut union) = union else {
            continue;
        };

        if !present_in_all {
            if strict {
                // Strict mode refuses to propagate possibly-undefined
                // variables past the join.
                if !base.has_variable(name) {
                    merged.unset_variable(name);
                }
                continue;
            }
            union.add_type(Type::Native(NativeType::Null));
        }

        merged.set_variable(Variable::new(name, union));
    }

    merged
}

/// Joins the scopes of a `try`/`catch`/`finally` statement.
///
/// Starts from the try scope; a variable also present in a catch widens
/// with the catch's type, a variable present only in catches enters with
/// `null` added (it may never have been assigned), and a `finally` scope's
/// final types overwrite everything.
#[must_use]
pub(crate) fn merge_try_scopes(try_scope: Scope, catch_scopes: &[Scope], finally_scope: Option<Scope>) -> Scope {
    let mut merged = try_scope;

    let mut catch_variables: HashMap<Atom, Variable> = HashMap::default();
    for catch_scope in catch_scopes {
        for (name, variable) in catch_scope.variables() {
            match catch_variables.get_mut(name) {
                Some(existing) => existing.union_type.add_union(&variable.union_type),
                None => {
                    catch_variables.insert(*name, variable.clone());
                }
            }
        }
    }

    for (name, variable) in catch_variables {
        match merged.get_variable(name).cloned() {
            Some(mut existing) => {
                existing.union_type.add_union(&variable.union_type);
                merged.set_variable(existing);
            }
            None => {
                let mut added = variable;
                added.union_type.add_type(Type::Native(NativeType::Null));
                merged.set_variable(added);
            }
        }
    }

    if let Some(finally_scope) = finally_scope {
        for (_, variable) in finally_scope.variables() {
            merged.set_variable(variable.clone());
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use augur_codex::ttype::union::UnionType;

    use super::*;

    fn scope_with(pairs: &[(&str, &str)]) -> Scope {
        let context = augur_codex::names::NameContext::new();
        let templates = augur_atom::AtomSet::default();

        let mut scope = Scope::for_function_like();
        for (name, type_string) in pairs {
            scope.set_variable(Variable::new(
                atom(name),
                UnionType::from_string_in_context(type_string, &context, &templates),
            ));
        }
        scope
    }

    #[test]
    fn test_variable_on_all_branches_unions_types() {
        let base = Scope::for_function_like();
        let branches = [scope_with(&[("x", "int")]), scope_with(&[("x", "string")])];

        let merged = merge_branch_scopes(&base, &branches, false);

        assert_eq!(merged.get_variable(atom("x")).unwrap().union_type.to_string(), "int|string");
    }

    #[test]
    fn test_variable_on_some_branches_gains_null() {
        let base = Scope::for_function_like();
        let branches = [scope_with(&[("x", "int")]), scope_with(&[])];

        let merged = merge_branch_scopes(&base, &branches, false);

        assert_eq!(merged.get_variable(atom("x")).unwrap().union_type.to_string(), "int|null");
    }

    #[test]
    fn test_strict_mode_drops_partial_variables() {
        let base = Scope::for_function_like();
        let branches = [scope_with(&[("x", "int")]), scope_with(&[])];

        let merged = merge_branch_scopes(&base, &branches, true);

        assert!(!merged.has_variable(atom("x")));
    }

    #[test]
    fn test_base_variables_survive_merge() {
        let base = scope_with(&[("kept", "string")]);
        let branches = [base.branch_clone(), base.branch_clone()];

        let merged = merge_branch_scopes(&base, &branches, false);

        assert_eq!(merged.get_variable(atom("kept")).unwrap().union_type.to_string(), "string");
    }

    #[test]
    fn test_try_catch_union_and_catch_only_null() {
        let try_scope = scope_with(&[("a", "int")]);
        let catches = [scope_with(&[("a", "string"), ("b", "int")])];

        let merged = merge_try_scopes(try_scope, &catches, None);

        assert_eq!(merged.get_variable(atom("a")).unwrap().union_type.to_string(), "int|string");
        assert_eq!(merged.get_variable(atom("b")).unwrap().union_type.to_string(), "int|null");
    }

    #[test]
    fn test_finally_overwrites() {
        let try_scope = scope_with(&[("a", "int")]);
        let finally_scope = scope_with(&[("a", "string")]);

        let merged = merge_try_scopes(try_scope, &[], Some(finally_scope));

        assert_eq!(merged.get_variable(atom("a")).unwrap().union_type.to_string(), "string");
    }
}

//! Per-class (and per-function) analyzers.
//!
//! These run after the statement walk, over the populated codebase:
//! duplicate definitions, ancestor existence, required parent-constructor
//! calls, declared-type validity, override-signature compatibility, and
//! reference-count based dead-code detection.

use augur_atom::Atom;
use augur_atom::AtomSet;
use augur_atom::ascii_lowercase_atom;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::metadata::RedefinitionKind;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;

pub mod signature;

impl Analyzer<'_> {
    /// Runs every per-class analyzer.
    ///
    /// With `owned_files` set (partitioned workers), only symbols declared
    /// in those files are checked, so each class is reported exactly once
    /// across workers.
    pub fn analyze_classes(&mut self, owned_files: Option<&AtomSet>) {
        let owns = |file: Atom| owned_files.is_none_or(|files| files.contains(&file));

        for redefinition in self.codebase.redefinitions().to_vec() {
            if !owns(redefinition.file) {
                continue;
            }
            match redefinition.kind {
                RedefinitionKind::Class => self.emit_for_element(
                    &[],
                    IssueKind::RedefineClass,
                    redefinition.file,
                    redefinition.line,
                    vec![
                        redefinition.name.to_string(),
                        redefinition.file.to_string(),
                        redefinition.line.to_string(),
                        redefinition.name.to_string(),
                        redefinition.previous_file.to_string(),
                        redefinition.previous_line.to_string(),
                    ],
                ),
                RedefinitionKind::Function => self.emit_for_element(
                    &[],
                    IssueKind::RedefineFunction,
                    redefinition.file,
                    redefinition.line,
                    vec![
                        redefinition.name.to_string(),
                        redefinition.file.to_string(),
                        redefinition.line.to_string(),
                        redefinition.previous_file.to_string(),
                        redefinition.previous_line.to_string(),
                    ],
                ),
            }
        }

        for fqsen in self.codebase.class_fqsens() {
            let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
                continue;
            };
            if !owns(class.file) {
                continue;
            }

            self.check_ancestors_exist(fqsen);
            self.check_parent_constructor_called(fqsen);
            self.check_property_types(fqsen);
            self.check_method_types(fqsen);
            if self.settings.analyze_signature_compatibility {
                self.check_override_signatures(fqsen);
            }
        }

        let function_fqsens: Vec<_> = self
            .codebase
            .functions()
            .filter(|function| owns(function.file))
            .map(|function| function.fqsen)
            .collect();
        for fqsen in function_fqsens {
            self.check_function_types(fqsen);
        }

        if self.settings.dead_code_detection {
            self.check_unreferenced_elements(&owns);
        }
    }

    /// Every direct ancestor FQSEN must be parse-registered by now.
    fn check_ancestors_exist(&mut self, fqsen: ClassFqsen) {
        let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
            return;
        };
        let (file, line) = (class.file, class.line);
        let suppressions = class.suppressions.clone();

        let mut missing: Vec<(IssueKind, Atom)> = Vec::new();
        if let Some(parent) = class.parent
            && !self.codebase.has_class_with_fqsen(parent)
            && !is_internal_class(parent)
        {
            missing.push((IssueKind::UndeclaredExtendedClass, parent.to_atom()));
        }
        for interface in &class.interfaces {
            if !self.codebase.has_class_with_fqsen(*interface) && !is_internal_class(*interface) {
                missing.push((IssueKind::UndeclaredInterface, interface.to_atom()));
            }
        }
        for used_trait in &class.traits {
            if !self.codebase.has_class_with_fqsen(*used_trait) && !is_internal_class(*used_trait) {
                missing.push((IssueKind::UndeclaredTrait, used_trait.to_atom()));
            }
        }

        for (kind, name) in missing {
            self.emit_for_element(&suppressions, kind, file, line, vec![name.to_string()]);
        }
    }

    /// Children of configured classes must call `parent::__construct()`
    /// from their own constructor.
    fn check_parent_constructor_called(&mut self, fqsen: ClassFqsen) {
        if self.settings.parent_constructor_required.is_empty() {
            return;
        }
        let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
            return;
        };
        let Some(parent) = class.parent else {
            return;
        };

        let required = self
            .settings
            .parent_constructor_required
            .iter()
            .any(|entry| fqsen_matches_name(parent, entry));
        if !required {
            return;
        }

        // Only classes that declare their own constructor are on the hook;
        // an inherited constructor is the parent's own.
        let Some(constructor) = class.get_method("__construct") else {
            return;
        };
        let declares_own = matches!(
            constructor.defining_fqsen,
            FunctionLikeFqsen::Method(member) if member.class.names_same_class(fqsen)
        );
        if !declares_own {
            return;
        }

        let parent_has_constructor = self
            .codebase
            .get_class_by_fqsen(parent)
            .is_ok_and(|parent_class| parent_class.has_method("__construct"));
        if !parent_has_constructor {
            return;
        }

        if self.parent_constructor_calls.contains(&fqsen.key()) {
            return;
        }

        let (file, line) = (class.file, class.line);
        let suppressions = class.suppressions.clone();
        self.emit_for_element(
            &suppressions,
            IssueKind::TypeParentConstructorCalled,
            file,
            line,
            vec![fqsen.to_atom().to_string(), parent.with_alternate(0).to_atom().to_string()],
        );
    }

    /// Property declared types must name known classes.
    fn check_property_types(&mut self, fqsen: ClassFqsen) {
        let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
            return;
        };
        let suppressions = class.suppressions.clone();

        let mut findings: Vec<(Atom, u32, Atom)> = Vec::new();
        for property in class.properties.values() {
            if !property.defining_fqsen.class.names_same_class(fqsen) {
                continue;
            }
            for unknown in self.unknown_classes_in(&property.union_type) {
                findings.push((property.file, property.line, unknown));
            }
        }

        for (file, line, unknown) in findings {
            self.emit_for_element(
                &suppressions,
                IssueKind::UndeclaredTypeProperty,
                file,
                line,
                vec![unknown.to_string()],
            );
        }
    }

    /// Method parameter and return types must name known classes.
    fn check_method_types(&mut self, fqsen: ClassFqsen) {
        let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
            return;
        };

        let mut findings: Vec<(Vec<Atom>, IssueKind, Atom, u32, Atom)> = Vec::new();
        for method in class.methods.values() {
            let defines_here = matches!(
                method.defining_fqsen,
                FunctionLikeFqsen::Method(member) if member.class.names_same_class(fqsen)
            );
            if !defines_here {
                continue;
            }

            for parameter in &method.parameters {
                for unknown in self.unknown_classes_in(&parameter.union_type) {
                    findings.push((
                        method.suppressions.clone(),
                        IssueKind::UndeclaredTypeParameter,
                        method.file,
                        parameter.line,
                        unknown,
                    ));
                }
            }
            for unknown in self.unknown_classes_in(&method.union_type) {
                findings.push((
                    method.suppressions.clone(),
                    IssueKind::UndeclaredTypeReturn,
                    method.file,
                    method.line,
                    unknown,
                ));
            }
        }

        for (suppressions, kind, file, line, unknown) in findings {
            self.emit_for_element(&suppressions, kind, file, line, vec![unknown.to_string()]);
        }
    }

    fn check_function_types(&mut self, fqsen: FunctionLikeFqsen) {
        let (FunctionLikeFqsen::Function(function_fqsen) | FunctionLikeFqsen::Closure(function_fqsen)) = fqsen else {
            return;
        };
        let Ok(function) = self.codebase.get_function_by_fqsen(function_fqsen) else {
            return;
        };

        let suppressions = function.suppressions.clone();
        let mut findings: Vec<(IssueKind, Atom, u32, Atom)> = Vec::new();
        for parameter in &function.parameters {
            for unknown in self.unknown_classes_in(&parameter.union_type) {
                findings.push((IssueKind::UndeclaredTypeParameter, function.file, parameter.line, unknown));
            }
        }
        for unknown in self.unknown_classes_in(&function.union_type) {
            findings.push((IssueKind::UndeclaredTypeReturn, function.file, function.line, unknown));
        }

        for (kind, file, line, unknown) in findings {
            self.emit_for_element(&suppressions, kind, file, line, vec![unknown.to_string()]);
        }
    }

    /// Consults reference counts accumulated through the analysis pass.
    fn check_unreferenced_elements(&mut self, owns: &dyn Fn(Atom) -> bool) {
        let mut findings: Vec<(Vec<Atom>, IssueKind, Atom, u32, String)> = Vec::new();

        for class in self.codebase.classes() {
            if !owns(class.file) {
                continue;
            }

            if class.total_reference_count() == 0 {
                findings.push((
                    class.suppressions.clone(),
                    IssueKind::UnreferencedClass,
                    class.file,
                    class.line,
                    class.fqsen.to_atom().to_string(),
                ));
                continue;
            }

            for method in class.methods.values() {
                let defines_here = matches!(
                    method.defining_fqsen,
                    FunctionLikeFqsen::Method(member) if member.class.names_same_class(class.fqsen)
                );
                if !defines_here || method.name.as_str().starts_with("__") {
                    continue;
                }
                if method.references.is_empty() {
                    findings.push((
                        method.suppressions.clone(),
                        IssueKind::UnreferencedMethod,
                        method.file,
                        method.line,
                        format!("{}::{}", class.fqsen.to_atom(), method.name),
                    ));
                }
            }

            for property in class.properties.values() {
                let defines_here = property.defining_fqsen.class.names_same_class(class.fqsen);
                if !defines_here || property.flags.contains(augur_codex::metadata::flags::MetadataFlags::DYNAMIC) {
                    continue;
                }
                if property.references.is_empty() {
                    findings.push((
                        class.suppressions.clone(),
                        IssueKind::UnreferencedProperty,
                        property.file,
                        property.line,
                        format!("{}::{}", class.fqsen.to_atom(), property.name),
                    ));
                }
            }

            for constant in class.constants.values() {
                if constant.flags.is_internal() || !constant.defining_fqsen.class.names_same_class(class.fqsen) {
                    continue;
                }
                if constant.references.is_empty() {
                    findings.push((
                        class.suppressions.clone(),
                        IssueKind::UnreferencedConstant,
                        constant.file,
                        constant.line,
                        format!("{}::{}", class.fqsen.to_atom(), constant.name),
                    ));
                }
            }
        }

        for function in self.codebase.functions() {
            if !owns(function.file) || function.flags.is_closure() {
                continue;
            }
            if function.references.is_empty() {
                findings.push((
                    function.suppressions.clone(),
                    IssueKind::UnreferencedFunction,
                    function.file,
                    function.line,
                    function.fqsen.to_atom().to_string(),
                ));
            }
        }

        for constant in self.codebase.constants() {
            if !owns(constant.file) {
                continue;
            }
            if constant.references.is_empty() {
                findings.push((
                    Vec::new(),
                    IssueKind::UnreferencedConstant,
                    constant.file,
                    constant.line,
                    constant.fqsen.to_atom().to_string(),
                ));
            }
        }

        for (suppressions, kind, file, line, name) in findings {
            self.emit_for_element(&suppressions, kind, file, line, vec![name]);
        }
    }

    /// Class types in a union that no declaration backs.
    fn unknown_classes_in(&self, union: &UnionType) -> Vec<Atom> {
        union
            .class_fqsens()
            .into_iter()
            .filter(|fqsen| !self.codebase.has_class_with_fqsen(*fqsen) && !is_internal_class(*fqsen))
            .map(|fqsen| fqsen.to_atom())
            .collect()
    }
}

/// Classes the engine itself provides; they have no declarations in
/// analyzed code and are never "undeclared".
fn is_internal_class(fqsen: ClassFqsen) -> bool {
    matches!(
        ascii_lowercase_atom(&fqsen.with_alternate(0).to_atom()).as_str(),
        "\\stdclass"
            | "\\generator"
            | "\\closure"
            | "\\exception"
            | "\\error"
            | "\\throwable"
            | "\\traversable"
            | "\\iterator"
            | "\\iteratoraggregate"
            | "\\arrayaccess"
            | "\\countable"
            | "\\stringable"
    )
}

/// Whether a configured class name (with or without a leading `\`) names
/// the given FQSEN.
fn fqsen_matches_name(fqsen: ClassFqsen, name: &str) -> bool {
    let canonical = ascii_lowercase_atom(&fqsen.with_alternate(0).to_atom());
    let normalized = ascii_lowercase_atom(&format!("\\{}", name.trim_start_matches('\\')));
    canonical == normalized
}

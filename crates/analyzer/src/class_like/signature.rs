//! Override-signature compatibility.
//!
//! When a method overrides an ancestor's method (traits and constructors
//! excepted): the required parameter count must not increase, the total
//! count must not decrease, shared parameters keep by-ref-ness and stay
//! castable toward the ancestor's types, the return stays covariant,
//! static-ness and returns-ref-ness match, and visibility never narrows.

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::metadata::function_like::FunctionLikeMetadata;
use augur_reporting::IssueKind;

use crate::Analyzer;

impl Analyzer<'_> {
    pub(crate) fn check_override_signatures(&mut self, fqsen: ClassFqsen) {
        let Ok(class) = self.codebase.get_class_by_fqsen(fqsen) else {
            return;
        };

        let mut pairs: Vec<(FunctionLikeMetadata, FunctionLikeMetadata)> = Vec::new();
        for method in class.methods.values() {
            if !method.flags.is_override() || method.name.as_str() == "__construct" {
                continue;
            }
            let defines_here = matches!(
                method.defining_fqsen,
                FunctionLikeFqsen::Method(member) if member.class.names_same_class(fqsen)
            );
            if !defines_here {
                continue;
            }

            if let Some(ancestor_method) = self.find_overridden_method(fqsen, method.name.as_str()) {
                pairs.push((method.clone(), ancestor_method));
            }
        }

        for (method, ancestor) in pairs {
            self.check_override_pair(&method, &ancestor);
        }
    }

    /// The nearest non-trait ancestor declaring the method.
    fn find_overridden_method(&self, fqsen: ClassFqsen, method_name: &str) -> Option<FunctionLikeMetadata> {
        for ancestor_fqsen in self.codebase.ancestor_fqsens(fqsen) {
            let Ok(ancestor) = self.codebase.get_class_by_fqsen(ancestor_fqsen) else {
                continue;
            };
            if ancestor.is_trait() {
                continue;
            }

            if let Some(method) = ancestor.get_method(method_name) {
                let declares = matches!(
                    method.defining_fqsen,
                    FunctionLikeFqsen::Method(member) if member.class.names_same_class(ancestor_fqsen)
                );
                if declares {
                    return Some(method.clone());
                }
            }
        }

        None
    }

    fn check_override_pair(&mut self, method: &FunctionLikeMetadata, ancestor: &FunctionLikeMetadata) {
        let suppressions = method.suppressions.clone();
        let descriptor = method.fqsen.to_atom().to_string();
        let ancestor_descriptor = ancestor.fqsen.to_atom().to_string();
        let location = vec![ancestor.file.to_string(), ancestor.line.to_string()];

        let mut signature_mismatch = false;

        // LSP-ish arity rules.
        if method.required_parameter_count > ancestor.required_parameter_count {
            signature_mismatch = true;
        }
        if method.parameter_count() < ancestor.parameter_count() {
            signature_mismatch = true;
        }

        for (position, ancestor_parameter) in ancestor.parameters.iter().enumerate() {
            let Some(parameter) = method.parameters.get(position) else {
                continue;
            };

            if parameter.flags.is_by_reference() != ancestor_parameter.flags.is_by_reference() {
                signature_mismatch = true;
                continue;
            }

            // An empty or mixed ancestor parameter tolerates anything.
            if ancestor_parameter.union_type.is_empty()
                || ancestor_parameter.union_type.has_native(augur_codex::ttype::NativeType::Mixed)
            {
                continue;
            }
            if parameter.union_type.is_empty() {
                continue;
            }

            if !parameter.union_type.can_cast_to_union(&ancestor_parameter.union_type, self.codebase) {
                signature_mismatch = true;
            }
        }

        // Covariant return.
        if !ancestor.union_type.is_empty()
            && !method.union_type.is_empty()
            && !method.union_type.as_expanded_types(self.codebase).can_cast_to_union(&ancestor.union_type, self.codebase)
        {
            signature_mismatch = true;
        }

        if method.flags.is_static() != ancestor.flags.is_static() {
            let kind = if ancestor.flags.is_static() {
                IssueKind::AccessStaticToNonStatic
            } else {
                IssueKind::AccessNonStaticToStatic
            };
            self.emit_for_element(&suppressions, kind, method.file, method.line, vec![descriptor.clone()]);
        }

        if method.flags.contains(augur_codex::metadata::flags::MetadataFlags::RETURNS_REFERENCE)
            != ancestor.flags.contains(augur_codex::metadata::flags::MetadataFlags::RETURNS_REFERENCE)
        {
            signature_mismatch = true;
        }

        if method.visibility.is_narrower_than(ancestor.visibility) {
            let mut arguments = vec![descriptor.clone(), ancestor_descriptor.clone()];
            arguments.extend(location.iter().cloned());
            self.emit_for_element(
                &suppressions,
                IssueKind::AccessSignatureMismatch,
                method.file,
                method.line,
                arguments,
            );
        }

        if signature_mismatch {
            let mut arguments = vec![descriptor, ancestor_descriptor];
            arguments.extend(location);
            self.emit_for_element(
                &suppressions,
                IssueKind::ParamSignatureMismatch,
                method.file,
                method.line,
                arguments,
            );
        }
    }
}

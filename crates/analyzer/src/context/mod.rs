//! The immutable analysis context.
//!
//! A [`Context`] is the complete record of the analysis state at a point in
//! the AST: current file and line, namespace and use map, scope, enclosing
//! class and function-like FQSENs, template identifiers in scope, the
//! strict-types flag, and the suppressed-issue set. Contexts are produced
//! through `with_…` copy-and-update methods and never mutated in place,
//! which is what makes scope merging able to duplicate and compose them
//! freely.

use augur_atom::Atom;
use augur_atom::AtomSet;

use augur_codex::fqsen::ClassFqsen;
use augur_codex::fqsen::FunctionLikeFqsen;
use augur_codex::names::NameContext;

use crate::context::scope::Scope;

pub mod scope;

#[derive(Debug, Clone)]
pub struct Context {
    pub file: Atom,
    pub line: u32,
    pub names: NameContext,
    pub scope: Scope,
    pub class_fqsen: Option<ClassFqsen>,
    pub function_fqsen: Option<FunctionLikeFqsen>,
    /// Template identifiers usable in doc types at this point.
    pub template_names: AtomSet,
    pub strict_types: bool,
    /// Issue type names suppressed by the enclosing class/function-like.
    pub suppressions: Vec<Atom>,
}

impl Context {
    #[must_use]
    pub fn new(file: Atom) -> Self {
        Self {
            file,
            line: 0,
            names: NameContext::new(),
            scope: Scope::global(),
            class_fqsen: None,
            function_fqsen: None,
            template_names: AtomSet::default(),
            strict_types: false,
            suppressions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_line(&self, line: u32) -> Self {
        let mut context = self.clone();
        context.line = line;
        context
    }

    #[must_use]
    pub fn with_names(&self, names: NameContext) -> Self {
        let mut context = self.clone();
        context.names = names;
        context
    }

    #[must_use]
    pub fn with_scope(&self, scope: Scope) -> Self {
        let mut context = self.clone();
        context.scope = scope;
        context
    }

    #[must_use]
    pub fn with_class(&self, fqsen: ClassFqsen) -> Self {
        let mut context = self.clone();
        context.class_fqsen = Some(fqsen);
        context
    }

    #[must_use]
    pub fn with_function(&self, fqsen: FunctionLikeFqsen) -> Self {
        let mut context = self.clone();
        context.function_fqsen = Some(fqsen);
        context
    }

    #[must_use]
    pub fn with_template_names(&self, template_names: AtomSet) -> Self {
        let mut context = self.clone();
        context.template_names = template_names;
        context
    }

    #[must_use]
    pub fn with_strict_types(&self, strict_types: bool) -> Self {
        let mut context = self.clone();
        context.strict_types = strict_types;
        context
    }

    /// Extends the suppressed-issue set with another element's list.
    #[must_use]
    pub fn with_suppressions(&self, additional: &[Atom]) -> Self {
        let mut context = self.clone();
        context.suppressions.extend_from_slice(additional);
        context
    }

    #[inline]
    #[must_use]
    pub fn is_in_class_scope(&self) -> bool {
        self.class_fqsen.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_in_function_like_scope(&self) -> bool {
        self.function_fqsen.is_some()
    }

    #[inline]
    #[must_use]
    pub fn is_in_global_scope(&self) -> bool {
        !self.is_in_function_like_scope()
    }

    #[must_use]
    pub fn is_suppressed(&self, issue_name: &str) -> bool {
        self.suppressions.iter().any(|name| name.as_str() == issue_name)
    }
}

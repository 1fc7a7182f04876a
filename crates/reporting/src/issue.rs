use std::fmt;

use bitflags::bitflags;
use serde::Deserialize;
use serde::Serialize;

use augur_atom::Atom;

bitflags! {
    /// Category bitmask for issue types.
    ///
    /// Filters select issues by intersecting this mask, so one issue type
    /// may in principle belong to several categories.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Category: u32 {
        const UNDEFINED = 1 << 0;
        const TYPE = 1 << 1;
        const PARAMETER = 1 << 2;
        const ANALYSIS = 1 << 3;
        const ACCESS = 1 << 4;
        const NOOP = 1 << 5;
        const REDEFINE = 1 << 6;
        const STATIC = 1 << 7;
        const DEPRECATED = 1 << 8;
        const COMPATIBLE = 1 << 9;
        const CONTEXT = 1 << 10;
    }
}

/// Issue severity.
///
/// The numeric values are part of the configuration surface: a minimum
/// severity of `5` passes `Normal` and `Critical` issues only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Normal,
    Critical,
}

impl Severity {
    /// The configuration-facing numeric value of this severity.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Normal => 5,
            Severity::Critical => 10,
        }
    }

    /// Maps a configuration value back to a severity, rounding down.
    #[inline]
    #[must_use]
    pub const fn from_value(value: u8) -> Severity {
        match value {
            0..=4 => Severity::Low,
            5..=9 => Severity::Normal,
            _ => Severity::Critical,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Normal => "normal",
            Severity::Critical => "critical",
        }
    }
}

/// Coarse estimate of the effort required to fix an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationEffort {
    Trivial,
    Medium,
    Major,
}

impl RemediationEffort {
    /// Minutes, roughly.
    #[inline]
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            RemediationEffort::Trivial => 5,
            RemediationEffort::Medium => 30,
            RemediationEffort::Major => 120,
        }
    }
}

/// Declares the issue catalog: the `IssueKind` enum plus accessors for the
/// per-type constants.
macro_rules! issue_catalog {
    ( $( $variant:ident => {
        id: $id:literal,
        category: $category:ident,
        severity: $severity:ident,
        effort: $effort:ident,
        template: $template:literal $(,)?
    } ),+ $(,)? ) => {
        /// Every diagnostic the analyzer can emit.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum IssueKind {
            $( $variant, )+
        }

        impl IssueKind {
            /// The user-facing issue type name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( IssueKind::$variant => stringify!($variant), )+
                }
            }

            /// The stable numeric id of this issue type.
            #[must_use]
            pub const fn id(self) -> u32 {
                match self {
                    $( IssueKind::$variant => $id, )+
                }
            }

            #[must_use]
            pub const fn category(self) -> Category {
                match self {
                    $( IssueKind::$variant => Category::$category, )+
                }
            }

            #[must_use]
            pub const fn severity(self) -> Severity {
                match self {
                    $( IssueKind::$variant => Severity::$severity, )+
                }
            }

            #[must_use]
            pub const fn remediation_effort(self) -> RemediationEffort {
                match self {
                    $( IssueKind::$variant => RemediationEffort::$effort, )+
                }
            }

            /// The printf-style message template; each `{}` consumes one
            /// argument of the instance.
            #[must_use]
            pub const fn template(self) -> &'static str {
                match self {
                    $( IssueKind::$variant => $template, )+
                }
            }

            /// Looks an issue type up by its user-facing name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<IssueKind> {
                match name {
                    $( stringify!($variant) => Some(IssueKind::$variant), )+
                    _ => None,
                }
            }

            /// Every issue type in the catalog, in id order.
            #[must_use]
            pub const fn all() -> &'static [IssueKind] {
                &[ $( IssueKind::$variant, )+ ]
            }
        }
    };
}

issue_catalog! {
    // Undefined symbols.
    SyntaxError => {
        id: 1000, category: ANALYSIS, severity: Critical, effort: Trivial,
        template: "{}",
    },
    ParentlessClass => {
        id: 1001, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Reference to parent of class {} which does not extend anything",
    },
    TraitParentReference => {
        id: 1002, category: UNDEFINED, severity: Low, effort: Trivial,
        template: "Reference to parent from trait {}",
    },
    UndeclaredClass => {
        id: 1003, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Reference to undeclared class {}",
    },
    UndeclaredClassConstant => {
        id: 1004, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Reference to undeclared class constant {}::{}",
    },
    UndeclaredClassMethod => {
        id: 1005, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Call to undeclared method {}::{}",
    },
    UndeclaredStaticMethod => {
        id: 1006, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Static call to undeclared method {}::{}",
    },
    UndeclaredConstant => {
        id: 1007, category: UNDEFINED, severity: Critical, effort: Trivial,
        template: "Reference to undeclared constant {}",
    },
    UndeclaredExtendedClass => {
        id: 1008, category: UNDEFINED, severity: Critical, effort: Major,
        template: "Class extends undeclared class {}",
    },
    UndeclaredFunction => {
        id: 1009, category: UNDEFINED, severity: Critical, effort: Medium,
        template: "Call to undeclared function {}",
    },
    UndeclaredInterface => {
        id: 1010, category: UNDEFINED, severity: Critical, effort: Major,
        template: "Class implements undeclared interface {}",
    },
    UndeclaredTrait => {
        id: 1011, category: UNDEFINED, severity: Critical, effort: Major,
        template: "Class uses undeclared trait {}",
    },
    UndeclaredProperty => {
        id: 1012, category: UNDEFINED, severity: Normal, effort: Trivial,
        template: "Reference to undeclared property {}",
    },
    UndeclaredStaticProperty => {
        id: 1013, category: UNDEFINED, severity: Critical, effort: Trivial,
        template: "Static property {} on {} is undeclared",
    },
    UndeclaredTypeParameter => {
        id: 1014, category: UNDEFINED, severity: Normal, effort: Medium,
        template: "Parameter of undeclared type {}",
    },
    UndeclaredTypeProperty => {
        id: 1015, category: UNDEFINED, severity: Normal, effort: Medium,
        template: "Property of undeclared type {}",
    },
    UndeclaredTypeReturn => {
        id: 1016, category: UNDEFINED, severity: Normal, effort: Medium,
        template: "Return type of undeclared type {}",
    },
    UndeclaredVariable => {
        id: 1017, category: UNDEFINED, severity: Normal, effort: Trivial,
        template: "Variable ${} is undeclared",
    },

    // Type errors.
    TypeArrayOperator => {
        id: 2000, category: TYPE, severity: Normal, effort: Medium,
        template: "Invalid array operator between types {} and {}",
    },
    TypeArraySuspicious => {
        id: 2001, category: TYPE, severity: Normal, effort: Trivial,
        template: "Suspicious array access to {}",
    },
    TypeComparisonFromArray => {
        id: 2002, category: TYPE, severity: Low, effort: Trivial,
        template: "array to {} comparison",
    },
    TypeComparisonToArray => {
        id: 2003, category: TYPE, severity: Low, effort: Trivial,
        template: "{} to array comparison",
    },
    TypeConversionFromArray => {
        id: 2004, category: TYPE, severity: Low, effort: Trivial,
        template: "array to {} conversion",
    },
    TypeInstantiateAbstract => {
        id: 2005, category: TYPE, severity: Critical, effort: Medium,
        template: "Instantiation of abstract class {}",
    },
    TypeInstantiateInterface => {
        id: 2006, category: TYPE, severity: Critical, effort: Medium,
        template: "Instantiation of interface {}",
    },
    TypeInvalidLeftOperand => {
        id: 2007, category: TYPE, severity: Normal, effort: Trivial,
        template: "Invalid operator: left operand is array and right is not",
    },
    TypeInvalidRightOperand => {
        id: 2008, category: TYPE, severity: Normal, effort: Trivial,
        template: "Invalid operator: right operand is array and left is not",
    },
    TypeMismatchArgument => {
        id: 2009, category: TYPE, severity: Normal, effort: Medium,
        template: "Argument {} ({}) is {} but {}() takes {} defined at {}:{}",
    },
    TypeMismatchArgumentInternal => {
        id: 2010, category: TYPE, severity: Normal, effort: Medium,
        template: "Argument {} ({}) is {} but {}() takes {}",
    },
    TypeMismatchDefault => {
        id: 2011, category: TYPE, severity: Normal, effort: Trivial,
        template: "Default value for {} ${} can't be {}",
    },
    TypeMismatchForeach => {
        id: 2012, category: TYPE, severity: Normal, effort: Medium,
        template: "{} passed to foreach instead of array",
    },
    TypeMismatchProperty => {
        id: 2013, category: TYPE, severity: Normal, effort: Medium,
        template: "Assigning {} to property but {} is {}",
    },
    TypeMismatchReturn => {
        id: 2014, category: TYPE, severity: Normal, effort: Medium,
        template: "Returning type {} but {}() is declared to return {}",
    },
    TypeMissingReturn => {
        id: 2015, category: TYPE, severity: Normal, effort: Medium,
        template: "Method {} is declared to return {} but has no return value",
    },
    TypeNonVarPassByRef => {
        id: 2016, category: TYPE, severity: Normal, effort: Trivial,
        template: "Only variables can be passed by reference at argument {} of {}()",
    },
    TypeParentConstructorCalled => {
        id: 2017, category: TYPE, severity: Normal, effort: Medium,
        template: "Must call parent::__construct() from {} which extends {}",
    },
    TypeVoidAssignment => {
        id: 2018, category: TYPE, severity: Low, effort: Trivial,
        template: "Cannot assign void return value",
    },

    // Analyzability.
    Unanalyzable => {
        id: 3000, category: ANALYSIS, severity: Low, effort: Trivial,
        template: "Expression is unanalyzable or feature is unimplemented",
    },

    // Call-site parameter errors.
    ParamReqAfterOpt => {
        id: 4000, category: PARAMETER, severity: Low, effort: Trivial,
        template: "Required argument follows optional",
    },
    ParamSpecial1 => {
        id: 4001, category: PARAMETER, severity: Normal, effort: Medium,
        template: "Argument {} ({}) is {} but {}() takes {} when argument {} is {}",
    },
    ParamSpecial2 => {
        id: 4002, category: PARAMETER, severity: Normal, effort: Medium,
        template: "Argument {} ({}) is {} but {}() takes {} when passed only one argument",
    },
    ParamSpecial3 => {
        id: 4003, category: PARAMETER, severity: Normal, effort: Medium,
        template: "The last argument to {} must be of type {}",
    },
    ParamSpecial4 => {
        id: 4004, category: PARAMETER, severity: Normal, effort: Medium,
        template: "The second to last argument to {} must be of type {}",
    },
    ParamTooFew => {
        id: 4005, category: PARAMETER, severity: Normal, effort: Medium,
        template: "Call with {} arg(s) to {}() which requires {} arg(s) defined at {}:{}",
    },
    ParamTooFewInternal => {
        id: 4006, category: PARAMETER, severity: Normal, effort: Medium,
        template: "Call with {} arg(s) to {}() which requires {} arg(s)",
    },
    ParamTooMany => {
        id: 4007, category: PARAMETER, severity: Low, effort: Trivial,
        template: "Call with {} arg(s) to {}() which only takes {} arg(s) defined at {}:{}",
    },
    ParamTooManyInternal => {
        id: 4008, category: PARAMETER, severity: Low, effort: Trivial,
        template: "Call with {} arg(s) to {}() which only takes {} arg(s)",
    },
    ParamRedefined => {
        id: 4009, category: PARAMETER, severity: Normal, effort: Trivial,
        template: "Redefinition of parameter ${}",
    },
    ParamSignatureMismatch => {
        id: 4010, category: PARAMETER, severity: Normal, effort: Medium,
        template: "Declaration of {} should be compatible with {} defined at {}:{}",
    },

    // Dead code.
    NoopArray => {
        id: 5000, category: NOOP, severity: Low, effort: Trivial,
        template: "Unused array",
    },
    NoopClosure => {
        id: 5001, category: NOOP, severity: Low, effort: Trivial,
        template: "Unused closure",
    },
    NoopConstant => {
        id: 5002, category: NOOP, severity: Low, effort: Trivial,
        template: "Unused constant",
    },
    NoopProperty => {
        id: 5003, category: NOOP, severity: Low, effort: Trivial,
        template: "Unused property",
    },
    NoopVariable => {
        id: 5004, category: NOOP, severity: Low, effort: Trivial,
        template: "Unused variable",
    },
    UnreferencedClass => {
        id: 5005, category: NOOP, severity: Normal, effort: Medium,
        template: "Possibly zero references to class {}",
    },
    UnreferencedMethod => {
        id: 5006, category: NOOP, severity: Normal, effort: Medium,
        template: "Possibly zero references to method {}",
    },
    UnreferencedProperty => {
        id: 5007, category: NOOP, severity: Normal, effort: Medium,
        template: "Possibly zero references to property {}",
    },
    UnreferencedConstant => {
        id: 5008, category: NOOP, severity: Normal, effort: Medium,
        template: "Possibly zero references to constant {}",
    },
    UnreferencedFunction => {
        id: 5009, category: NOOP, severity: Normal, effort: Medium,
        template: "Possibly zero references to function {}",
    },

    // Redefinitions.
    RedefineClass => {
        id: 6000, category: REDEFINE, severity: Normal, effort: Major,
        template: "{} defined at {}:{} was previously defined as {} at {}:{}",
    },
    RedefineFunction => {
        id: 6001, category: REDEFINE, severity: Normal, effort: Major,
        template: "Function {} defined at {}:{} was previously defined at {}:{}",
    },
    IncompatibleCompositionProp => {
        id: 6002, category: REDEFINE, severity: Normal, effort: Major,
        template: "{} and {} define property {} differently",
    },
    IncompatibleCompositionMethod => {
        id: 6003, category: REDEFINE, severity: Normal, effort: Major,
        template: "{} and {} define method {} differently",
    },

    // Access control.
    AccessPropertyPrivate => {
        id: 7000, category: ACCESS, severity: Critical, effort: Medium,
        template: "Cannot access private property {}",
    },
    AccessPropertyProtected => {
        id: 7001, category: ACCESS, severity: Critical, effort: Medium,
        template: "Cannot access protected property {}",
    },
    AccessMethodPrivate => {
        id: 7002, category: ACCESS, severity: Critical, effort: Medium,
        template: "Cannot access private method {} defined at {}:{}",
    },
    AccessMethodProtected => {
        id: 7003, category: ACCESS, severity: Critical, effort: Medium,
        template: "Cannot access protected method {} defined at {}:{}",
    },
    AccessSignatureMismatch => {
        id: 7004, category: ACCESS, severity: Normal, effort: Medium,
        template: "Access level to {} must be compatible with {} defined at {}:{}",
    },
    AccessStaticToNonStatic => {
        id: 7005, category: ACCESS, severity: Critical, effort: Medium,
        template: "Making static method {}() non static",
    },
    AccessNonStaticToStatic => {
        id: 7006, category: ACCESS, severity: Critical, effort: Medium,
        template: "Making non static method {}() static",
    },

    // Static correctness.
    StaticCallToNonStatic => {
        id: 8000, category: STATIC, severity: Normal, effort: Medium,
        template: "Static call to non-static method {} defined at {}:{}",
    },
    ContextNotObject => {
        id: 8001, category: CONTEXT, severity: Critical, effort: Medium,
        template: "Cannot access {} when not in object context",
    },

    // Deprecation.
    DeprecatedClass => {
        id: 9000, category: DEPRECATED, severity: Normal, effort: Medium,
        template: "Using a deprecated class {} defined at {}:{}",
    },
    DeprecatedFunction => {
        id: 9001, category: DEPRECATED, severity: Normal, effort: Medium,
        template: "Call to deprecated function {}() defined at {}:{}",
    },

    // Backward compatibility.
    CompatiblePHP7 => {
        id: 9500, category: COMPATIBLE, severity: Normal, effort: Medium,
        template: "Expression may not be PHP 7 compatible",
    },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An issue type bound to a source location and message arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueInstance {
    pub kind: IssueKind,
    pub file: Atom,
    pub line: u32,
    pub arguments: Vec<String>,
}

impl IssueInstance {
    #[must_use]
    pub fn new(kind: IssueKind, file: Atom, line: u32, arguments: Vec<String>) -> Self {
        Self { kind, file, line, arguments }
    }

    /// Renders the message template with this instance's arguments.
    ///
    /// Each `{}` placeholder consumes one argument; surplus placeholders
    /// render empty, surplus arguments are ignored.
    #[must_use]
    pub fn message(&self) -> String {
        let template = self.kind.template();
        let mut message = String::with_capacity(template.len() + 32);
        let mut arguments = self.arguments.iter();
        let mut rest = template;

        while let Some(index) = rest.find("{}") {
            message.push_str(&rest[..index]);
            if let Some(argument) = arguments.next() {
                message.push_str(argument);
            }
            rest = &rest[index + 2..];
        }
        message.push_str(rest);

        message
    }
}

impl fmt::Display for IssueInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} {}", self.file, self.line, self.kind.name(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in IssueKind::all() {
            assert!(seen.insert(kind.id()), "duplicate id for {}", kind.name());
        }
    }

    #[test]
    fn test_message_rendering() {
        let instance = IssueInstance::new(
            IssueKind::UndeclaredExtendedClass,
            atom("src.php"),
            1,
            vec!["\\C".to_string()],
        );

        assert_eq!(instance.message(), "Class extends undeclared class \\C");
        assert_eq!(instance.to_string(), "src.php:1 UndeclaredExtendedClass Class extends undeclared class \\C");
    }

    #[test]
    fn test_message_with_multiple_arguments() {
        let instance = IssueInstance::new(
            IssueKind::TypeMismatchArgumentInternal,
            atom("src.php"),
            1,
            vec!["1".into(), "x".into(), "string".into(), "\\f".into(), "int".into()],
        );

        assert_eq!(instance.message(), "Argument 1 (x) is string but \\f() takes int");
    }

    #[test]
    fn test_severity_values() {
        assert_eq!(Severity::Low.value(), 0);
        assert_eq!(Severity::Normal.value(), 5);
        assert_eq!(Severity::Critical.value(), 10);
        assert_eq!(Severity::from_value(7), Severity::Normal);
    }

    #[test]
    fn test_from_name_round_trip() {
        for kind in IssueKind::all() {
            assert_eq!(IssueKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(IssueKind::from_name("NoSuchIssue"), None);
    }
}

//! The codex: everything the analyzer knows about a codebase.
//!
//! This crate holds the three bottom layers of the analysis pipeline:
//!
//! - **FQSEN**s ([`fqsen`]) — interned fully qualified structural element
//!   names for classes, functions, constants, and class members.
//! - **The type system** ([`ttype`]) — atomic [`ttype::Type`]s and
//!   [`ttype::UnionType`]s with the can-cast-to relation, template
//!   substitution, and doc-comment type parsing.
//! - **The CodeBase** ([`metadata::CodeBase`]) — the authoritative mutable
//!   registry of every declared symbol, populated by the declaration
//!   [`scanner`] and completed by ancestor hydration in [`populator`].
//!
//! The [`signature`] module bundles the signature map for internal (engine
//! provided) functions, consumed at `CodeBase` construction.

pub mod error;
pub mod fqsen;
pub mod metadata;
pub mod names;
pub mod populator;
pub mod scanner;
pub mod signature;
pub mod ttype;

pub use error::MissingSymbol;
pub use metadata::CodeBase;

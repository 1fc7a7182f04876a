//! The abstract syntax tree consumed by the Augur analyzer.
//!
//! Augur does not parse source text itself; an external front-end produces
//! a tree of [`Node`]s (typically as a JSON dump) and the analyzer walks it.
//! Every node carries a [`NodeKind`], a `flags` bitfield, a one-based line
//! number, an ordered list of children, and optional payloads: an
//! identifier (`name`), a literal value (`value`), and a doc-comment.
//!
//! Declaration nodes address their children by fixed positions; the slot
//! conventions are documented on each [`NodeKind`] variant. A positional
//! slot with nothing in it holds a [`NodeKind::Missing`] node.

pub mod flags;
pub mod node;

pub use node::Node;
pub use node::NodeKind;
pub use node::Value;

//! Flag constants for the `flags` bitfield of a [`Node`](crate::Node).
//!
//! Flags are grouped per node family; groups never share a node kind, so
//! their bit ranges may overlap.

// Class-like declarations.
pub const CLASS_ABSTRACT: u32 = 1 << 0;
pub const CLASS_FINAL: u32 = 1 << 1;
pub const CLASS_INTERFACE: u32 = 1 << 2;
pub const CLASS_TRAIT: u32 = 1 << 3;

// Member and function-like modifiers.
pub const MODIFIER_PUBLIC: u32 = 1 << 0;
pub const MODIFIER_PROTECTED: u32 = 1 << 1;
pub const MODIFIER_PRIVATE: u32 = 1 << 2;
pub const MODIFIER_STATIC: u32 = 1 << 3;
pub const MODIFIER_ABSTRACT: u32 = 1 << 4;
pub const MODIFIER_FINAL: u32 = 1 << 5;
pub const RETURNS_REFERENCE: u32 = 1 << 6;

// Parameters and closure captures.
pub const PARAM_REFERENCE: u32 = 1 << 0;
pub const PARAM_VARIADIC: u32 = 1 << 1;
pub const CLOSURE_USE_REFERENCE: u32 = 1 << 0;

// `use` declarations.
pub const USE_NORMAL: u32 = 1 << 0;
pub const USE_FUNCTION: u32 = 1 << 1;
pub const USE_CONST: u32 = 1 << 2;

// Names.
pub const NAME_FULLY_QUALIFIED: u32 = 1 << 0;

// Binary operators (`BinaryOp` / `AssignOp`).
pub const BINARY_ADD: u32 = 1;
pub const BINARY_SUB: u32 = 2;
pub const BINARY_MUL: u32 = 3;
pub const BINARY_DIV: u32 = 4;
pub const BINARY_MOD: u32 = 5;
pub const BINARY_POW: u32 = 6;
pub const BINARY_CONCAT: u32 = 7;
pub const BINARY_BITWISE_AND: u32 = 8;
pub const BINARY_BITWISE_OR: u32 = 9;
pub const BINARY_BITWISE_XOR: u32 = 10;
pub const BINARY_SHIFT_LEFT: u32 = 11;
pub const BINARY_SHIFT_RIGHT: u32 = 12;
pub const BINARY_BOOL_AND: u32 = 13;
pub const BINARY_BOOL_OR: u32 = 14;
pub const BINARY_BOOL_XOR: u32 = 15;
pub const BINARY_IS_EQUAL: u32 = 16;
pub const BINARY_IS_NOT_EQUAL: u32 = 17;
pub const BINARY_IS_IDENTICAL: u32 = 18;
pub const BINARY_IS_NOT_IDENTICAL: u32 = 19;
pub const BINARY_IS_SMALLER: u32 = 20;
pub const BINARY_IS_SMALLER_OR_EQUAL: u32 = 21;
pub const BINARY_IS_GREATER: u32 = 22;
pub const BINARY_IS_GREATER_OR_EQUAL: u32 = 23;
pub const BINARY_SPACESHIP: u32 = 24;
pub const BINARY_COALESCE: u32 = 25;

// Unary operators.
pub const UNARY_MINUS: u32 = 1;
pub const UNARY_PLUS: u32 = 2;
pub const UNARY_BOOL_NOT: u32 = 3;
pub const UNARY_BITWISE_NOT: u32 = 4;
pub const UNARY_SILENCE: u32 = 5;

// Cast targets.
pub const CAST_ARRAY: u32 = 1;
pub const CAST_BOOL: u32 = 2;
pub const CAST_FLOAT: u32 = 3;
pub const CAST_INT: u32 = 4;
pub const CAST_OBJECT: u32 = 5;
pub const CAST_STRING: u32 = 6;
pub const CAST_UNSET: u32 = 7;

// Magic constants.
pub const MAGIC_LINE: u32 = 1;
pub const MAGIC_FILE: u32 = 2;
pub const MAGIC_DIR: u32 = 3;
pub const MAGIC_CLASS: u32 = 4;
pub const MAGIC_FUNCTION: u32 = 5;
pub const MAGIC_METHOD: u32 = 6;
pub const MAGIC_NAMESPACE: u32 = 7;

//! The binary-operator flag visitor.
//!
//! Dispatches on the operator flag of a `BinaryOp` node and returns the
//! operator's result type (`int`, `float`, `string`, `bool`, or `array`)
//! given the operand types, recording array-misuse diagnostics along the
//! way.

use augur_ast::Node;
use augur_ast::flags;

use augur_codex::ttype::NativeType;
use augur_codex::ttype::Type;
use augur_codex::ttype::union::UnionType;
use augur_reporting::IssueKind;

use crate::Analyzer;
use crate::context::Context;
use crate::error::AnalysisResult;

impl Analyzer<'_> {
    pub(crate) fn visit_binary_operator(&mut self, context: &Context, node: &Node) -> AnalysisResult<UnionType> {
        let left = node.child(0).map(|child| self.union_type_or_empty(context, child)).unwrap_or_default();
        let right = node.child(1).map(|child| self.union_type_or_empty(context, child)).unwrap_or_default();

        Ok(self.binary_operator_result(context, node, &left, &right))
    }

    /// The result type of one binary operator application.
    pub(crate) fn binary_operator_result(
        &mut self,
        context: &Context,
        node: &Node,
        left: &UnionType,
        right: &UnionType,
    ) -> UnionType {
        match node.flags {
            flags::BINARY_ADD => self.visit_addition(context, node, left, right),

            flags::BINARY_SUB | flags::BINARY_MUL | flags::BINARY_DIV | flags::BINARY_POW | flags::BINARY_MOD => {
                if is_exclusively_array(left) || is_exclusively_array(right) {
                    self.emit(
                        context,
                        IssueKind::TypeArrayOperator,
                        node.line,
                        vec![left.to_string(), right.to_string()],
                    );
                    return UnionType::empty();
                }
                if node.flags == flags::BINARY_MOD {
                    return UnionType::of_native(NativeType::Int);
                }
                arithmetic_result(left, right)
            }

            flags::BINARY_CONCAT => {
                for operand in [left, right] {
                    if operand.types().iter().any(Type::is_array_like) {
                        self.emit(context, IssueKind::TypeConversionFromArray, node.line, vec!["string".to_string()]);
                    }
                }
                UnionType::of_native(NativeType::String)
            }

            flags::BINARY_BITWISE_AND
            | flags::BINARY_BITWISE_OR
            | flags::BINARY_BITWISE_XOR
            | flags::BINARY_SHIFT_LEFT
            | flags::BINARY_SHIFT_RIGHT => UnionType::of_native(NativeType::Int),

            flags::BINARY_BOOL_AND | flags::BINARY_BOOL_OR | flags::BINARY_BOOL_XOR => {
                UnionType::of_native(NativeType::Bool)
            }

            flags::BINARY_IS_EQUAL
            | flags::BINARY_IS_NOT_EQUAL
            | flags::BINARY_IS_IDENTICAL
            | flags::BINARY_IS_NOT_IDENTICAL
            | flags::BINARY_IS_SMALLER
            | flags::BINARY_IS_SMALLER_OR_EQUAL
            | flags::BINARY_IS_GREATER
            | flags::BINARY_IS_GREATER_OR_EQUAL => {
                self.check_array_comparison(context, node, left, right);
                UnionType::of_native(NativeType::Bool)
            }

            flags::BINARY_SPACESHIP => {
                self.check_array_comparison(context, node, left, right);
                UnionType::of_native(NativeType::Int)
            }

            flags::BINARY_COALESCE => {
                let mut union = left.clone();
                union.add_union(right);
                union
            }

            _ => UnionType::empty(),
        }
    }

    /// `+` unions arrays; mixing an array with a non-array is invalid.
    fn visit_addition(&mut self, context: &Context, node: &Node, left: &UnionType, right: &UnionType) -> UnionType {
        let left_array = is_exclusively_array(left);
        let right_array = is_exclusively_array(right);

        if left_array && right_array {
            return UnionType::of_native(NativeType::Array);
        }
        if left_array && !right.is_empty() {
            self.emit(context, IssueKind::TypeInvalidRightOperand, node.line, vec![]);
            return UnionType::empty();
        }
        if right_array && !left.is_empty() {
            self.emit(context, IssueKind::TypeInvalidLeftOperand, node.line, vec![]);
            return UnionType::empty();
        }

        arithmetic_result(left, right)
    }

    fn check_array_comparison(&mut self, context: &Context, node: &Node, left: &UnionType, right: &UnionType) {
        let left_array = is_exclusively_array(left);
        let right_array = is_exclusively_array(right);

        if left_array && !right_array && !right.is_empty() {
            self.emit(context, IssueKind::TypeComparisonFromArray, node.line, vec![right.to_string()]);
        } else if right_array && !left_array && !left.is_empty() {
            self.emit(context, IssueKind::TypeComparisonToArray, node.line, vec![left.to_string()]);
        }
    }
}

/// Every type in the union is an array.
fn is_exclusively_array(union: &UnionType) -> bool {
    !union.is_empty() && union.types().iter().all(Type::is_array_like)
}

/// `int` unless a `float` is involved; unknown operands stay `int|float`.
fn arithmetic_result(left: &UnionType, right: &UnionType) -> UnionType {
    let int_only =
        |union: &UnionType| !union.is_empty() && union.types().iter().all(|t| t.is_native(NativeType::Int));

    if left.has_native(NativeType::Float) || right.has_native(NativeType::Float) {
        UnionType::of_native(NativeType::Float)
    } else if int_only(left) && int_only(right) {
        UnionType::of_native(NativeType::Int)
    } else {
        UnionType::from_types([Type::Native(NativeType::Int), Type::Native(NativeType::Float)])
    }
}

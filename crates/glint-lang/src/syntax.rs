//! Grammar bindings and untyped expression trees
//!
//! The pest grammar yields flat operator/operand sequences for expressions;
//! the Pratt parser here folds them into [`RawExpr`] trees. Name
//! resolution and validation happen later, when the parser lowers them into
//! the typed [`Node`](crate::ast::Node) tree.

use crate::parser::ParseError;
use glint_core::{ConstantValue, Operator};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub(crate) struct GrammarParser;

/// Expression before name resolution
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawExpr {
    pub kind: RawKind,
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RawKind {
    Literal(ConstantValue),
    Ident(String),
    Call {
        callee: String,
        args: Vec<RawExpr>,
    },
    ArrayCtor {
        type_name: String,
        size: Option<u32>,
        elements: Vec<RawExpr>,
    },
    Prefix {
        op: Operator,
        operand: Box<RawExpr>,
    },
    Postfix {
        op: Operator,
        operand: Box<RawExpr>,
    },
    Index {
        base: Box<RawExpr>,
        index: Box<RawExpr>,
    },
    Member {
        base: Box<RawExpr>,
        name: String,
    },
    MethodCall {
        base: Box<RawExpr>,
        name: String,
        args: Vec<RawExpr>,
    },
    Binary {
        op: Operator,
        lhs: Box<RawExpr>,
        rhs: Box<RawExpr>,
    },
    Ternary {
        condition: Box<RawExpr>,
        then_expr: Box<RawExpr>,
        else_expr: Box<RawExpr>,
    },
}

type ExprResult = Result<RawExpr, ParseError>;

pub(crate) fn line_of(pair: &Pair<Rule>) -> usize {
    pair.line_col().0
}

/// Folds expression pairs into [`RawExpr`] trees with GLSL precedence
pub(crate) struct ExprParser {
    pratt: PrattParser<Rule>,
}

impl ExprParser {
    pub fn new() -> Self {
        // lowest precedence first
        let pratt = PrattParser::new()
            .op(Op::infix(Rule::assign, Assoc::Right)
                | Op::infix(Rule::assign_add, Assoc::Right)
                | Op::infix(Rule::assign_sub, Assoc::Right)
                | Op::infix(Rule::assign_mul, Assoc::Right)
                | Op::infix(Rule::assign_div, Assoc::Right)
                | Op::infix(Rule::assign_mod, Assoc::Right)
                | Op::infix(Rule::assign_shl, Assoc::Right)
                | Op::infix(Rule::assign_shr, Assoc::Right)
                | Op::infix(Rule::assign_and, Assoc::Right)
                | Op::infix(Rule::assign_or, Assoc::Right)
                | Op::infix(Rule::assign_xor, Assoc::Right))
            .op(Op::infix(Rule::ternary, Assoc::Right))
            .op(Op::infix(Rule::log_or, Assoc::Left))
            .op(Op::infix(Rule::log_and, Assoc::Left))
            .op(Op::infix(Rule::bit_or, Assoc::Left))
            .op(Op::infix(Rule::bit_xor, Assoc::Left))
            .op(Op::infix(Rule::bit_and, Assoc::Left))
            .op(Op::infix(Rule::eq, Assoc::Left) | Op::infix(Rule::ne, Assoc::Left))
            .op(Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::le, Assoc::Left)
                | Op::infix(Rule::ge, Assoc::Left))
            .op(Op::infix(Rule::shl, Assoc::Left) | Op::infix(Rule::shr, Assoc::Left))
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::rem, Assoc::Left))
            .op(Op::prefix(Rule::negate)
                | Op::prefix(Rule::not)
                | Op::prefix(Rule::bit_not)
                | Op::prefix(Rule::pre_inc)
                | Op::prefix(Rule::pre_dec))
            .op(Op::postfix(Rule::post_inc)
                | Op::postfix(Rule::post_dec)
                | Op::postfix(Rule::index)
                | Op::postfix(Rule::method_call)
                | Op::postfix(Rule::member));

        Self { pratt }
    }

    /// Parse a `Rule::expression` pair
    pub fn parse(&self, pair: Pair<Rule>) -> ExprResult {
        self.parse_pairs(pair.into_inner())
    }

    fn parse_pairs(&self, pairs: Pairs<Rule>) -> ExprResult {
        self.pratt
            .map_primary(|primary| self.primary(primary))
            .map_prefix(|op, operand| {
                let operand = operand?;
                let line = line_of(&op);
                let op = match op.as_rule() {
                    Rule::negate => Operator::Negate,
                    Rule::not => Operator::Not,
                    Rule::bit_not => Operator::BitInvert,
                    Rule::pre_inc => Operator::Increment,
                    _ => Operator::Decrement,
                };
                Ok(RawExpr {
                    kind: RawKind::Prefix {
                        op,
                        operand: Box::new(operand),
                    },
                    line,
                })
            })
            .map_postfix(|base, op| {
                let base = base?;
                let line = line_of(&op);
                let kind = match op.as_rule() {
                    Rule::post_inc => RawKind::Postfix {
                        op: Operator::PostIncrement,
                        operand: Box::new(base),
                    },
                    Rule::post_dec => RawKind::Postfix {
                        op: Operator::PostDecrement,
                        operand: Box::new(base),
                    },
                    Rule::index => {
                        let inner = first_inner(op)?;
                        RawKind::Index {
                            base: Box::new(base),
                            index: Box::new(self.parse(inner)?),
                        }
                    }
                    Rule::method_call => {
                        let mut inner = op.into_inner();
                        let name = next_str(&mut inner, line)?;
                        let args = inner.map(|p| self.parse(p)).collect::<Result<_, _>>()?;
                        RawKind::MethodCall {
                            base: Box::new(base),
                            name,
                            args,
                        }
                    }
                    _ => {
                        let mut inner = op.into_inner();
                        RawKind::Member {
                            base: Box::new(base),
                            name: next_str(&mut inner, line)?,
                        }
                    }
                };
                Ok(RawExpr { kind, line })
            })
            .map_infix(|lhs, op, rhs| {
                let lhs = lhs?;
                let rhs = rhs?;
                let line = line_of(&op);
                if op.as_rule() == Rule::ternary {
                    let then_expr = self.parse(first_inner(op)?)?;
                    return Ok(RawExpr {
                        kind: RawKind::Ternary {
                            condition: Box::new(lhs),
                            then_expr: Box::new(then_expr),
                            else_expr: Box::new(rhs),
                        },
                        line,
                    });
                }
                Ok(RawExpr {
                    kind: RawKind::Binary {
                        op: infix_operator(op.as_rule()),
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    line,
                })
            })
            .parse(pairs)
    }

    fn primary(&self, pair: Pair<Rule>) -> ExprResult {
        let line = line_of(&pair);
        let kind = match pair.as_rule() {
            Rule::paren => return self.parse(first_inner(pair)?),
            Rule::identifier => RawKind::Ident(pair.as_str().to_string()),
            Rule::bool_literal => RawKind::Literal(ConstantValue::Bool(pair.as_str() == "true")),
            Rule::int_literal => RawKind::Literal(ConstantValue::Int(parse_int(pair.as_str(), line)?)),
            Rule::uint_literal => {
                let digits = pair.as_str().trim_end_matches(['u', 'U']);
                RawKind::Literal(ConstantValue::UInt(parse_uint(digits, line)?))
            }
            Rule::float_literal => {
                RawKind::Literal(ConstantValue::Float(parse_float(pair.as_str(), line)?))
            }
            Rule::call => {
                let mut inner = pair.into_inner();
                let callee = next_str(&mut inner, line)?;
                let args = inner.map(|p| self.parse(p)).collect::<Result<_, _>>()?;
                RawKind::Call { callee, args }
            }
            Rule::array_ctor => {
                let mut inner = pair.into_inner().peekable();
                let type_name = next_str(&mut inner, line)?;
                let size = match inner.peek() {
                    Some(p) if p.as_rule() == Rule::int_literal => {
                        let size = parse_size(p.as_str(), line)?;
                        inner.next();
                        Some(size)
                    }
                    _ => None,
                };
                let elements = inner.map(|p| self.parse(p)).collect::<Result<_, _>>()?;
                RawKind::ArrayCtor {
                    type_name,
                    size,
                    elements,
                }
            }
            rule => {
                return Err(ParseError::new(
                    line,
                    format!("Unexpected token in expression: {:?}", rule),
                ))
            }
        };
        Ok(RawExpr { kind, line })
    }
}

fn infix_operator(rule: Rule) -> Operator {
    match rule {
        Rule::assign => Operator::Assign,
        Rule::assign_add => Operator::AssignAdd,
        Rule::assign_sub => Operator::AssignSub,
        Rule::assign_mul => Operator::AssignMul,
        Rule::assign_div => Operator::AssignDiv,
        Rule::assign_mod => Operator::AssignMod,
        Rule::assign_shl => Operator::AssignShiftLeft,
        Rule::assign_shr => Operator::AssignShiftRight,
        Rule::assign_and => Operator::AssignBitAnd,
        Rule::assign_or => Operator::AssignBitOr,
        Rule::assign_xor => Operator::AssignBitXor,
        Rule::log_or => Operator::Or,
        Rule::log_and => Operator::And,
        Rule::bit_or => Operator::BitOr,
        Rule::bit_xor => Operator::BitXor,
        Rule::bit_and => Operator::BitAnd,
        Rule::eq => Operator::Equal,
        Rule::ne => Operator::NotEqual,
        Rule::lt => Operator::Less,
        Rule::gt => Operator::Greater,
        Rule::le => Operator::LessEqual,
        Rule::ge => Operator::GreaterEqual,
        Rule::shl => Operator::ShiftLeft,
        Rule::shr => Operator::ShiftRight,
        Rule::add => Operator::Add,
        Rule::sub => Operator::Sub,
        Rule::mul => Operator::Mul,
        Rule::div => Operator::Div,
        _ => Operator::Mod,
    }
}

/// First child of a pair that the grammar guarantees to have one
pub(crate) fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, ParseError> {
    let line = line_of(&pair);
    pair.into_inner()
        .next()
        .ok_or_else(|| ParseError::new(line, "Unexpected end of expression"))
}

pub(crate) fn next_str<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    line: usize,
) -> Result<String, ParseError> {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParseError::new(line, "Expected identifier"))
}

fn parse_radix(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse::<u64>().ok(),
    }
}

pub(crate) fn parse_int(text: &str, line: usize) -> Result<i32, ParseError> {
    let is_hex = text.starts_with("0x") || text.starts_with("0X");
    match parse_radix(text) {
        // hex literals may spell the full 32-bit pattern
        Some(v) if is_hex && v <= u32::MAX as u64 => Ok(v as u32 as i32),
        Some(v) if v <= i32::MAX as u64 => Ok(v as i32),
        _ => Err(ParseError::new(
            line,
            format!("Integer constant out of range: {}", text),
        )),
    }
}

/// Float literal, which must be finite as an f32
pub(crate) fn parse_float(text: &str, line: usize) -> Result<f32, ParseError> {
    let value = text
        .parse::<f32>()
        .map_err(|_| ParseError::new(line, format!("Invalid float constant: {}", text)))?;
    if !value.is_finite() {
        return Err(ParseError::new(
            line,
            format!("Float constant out of range: {}", text),
        ));
    }
    Ok(value)
}

pub(crate) fn parse_uint(text: &str, line: usize) -> Result<u32, ParseError> {
    parse_radix(text)
        .filter(|v| *v <= u32::MAX as u64)
        .map(|v| v as u32)
        .ok_or_else(|| {
            ParseError::new(
                line,
                format!("Unsigned integer constant out of range: {}", text),
            )
        })
}

pub(crate) fn parse_size(text: &str, line: usize) -> Result<u32, ParseError> {
    match parse_radix(text) {
        Some(v) if v > 0 && v <= u32::MAX as u64 => Ok(v as u32),
        _ => Err(ParseError::new(line, format!("Invalid array size: {}", text))),
    }
}

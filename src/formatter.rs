//! Pretty-printer that serializes a `Program` back into canonical
//! connection description source.
//!
//! Produces tab-indented output with one statement per line and the
//! minimum parentheses needed to preserve the tree.

use std::fmt::Write as _;

use crate::ast::{Assignment, Expr, Program, Return, Statement, Tag};
use crate::token::Reserved;

/// Precedence of prefix operators, above every binary operator.
const UNARY_PRECEDENCE: u8 = 3;
/// Precedence of member access, calls, and atoms.
const POSTFIX_PRECEDENCE: u8 = 4;

/// Format a `Program` into source text that parses back to the same
/// tree.
#[must_use]
pub fn format(program: &Program) -> String {
    let mut out = String::new();
    format_statements(&mut out, &program.statements, 0);
    out
}

fn format_statements(out: &mut String, statements: &[Statement], indent: usize) {
    for statement in statements {
        format_statement(out, statement, indent);
    }
}

fn format_statement(out: &mut String, statement: &Statement, indent: usize) {
    let prefix = "\t".repeat(indent);
    out.push_str(&prefix);

    match statement {
        Statement::Block(block) => {
            out.push_str(Reserved::Begin.lexeme());
            out.push('\n');
            format_statements(out, &block.statements, indent + 1);
            out.push_str(&prefix);
            out.push_str(Reserved::End.lexeme());
        }
        Statement::Name(name) => {
            let _ = write!(out, "{} {};", Reserved::Name.lexeme(), name.ident);
        }
        Statement::Assign(Assignment { target, value, tag }) => {
            match tag {
                Some(Tag::Magic) => {
                    out.push_str(Reserved::Magic.lexeme());
                    out.push(' ');
                }
                Some(Tag::KeyProtected) => {
                    out.push_str(Reserved::KeyProtected.lexeme());
                    out.push(' ');
                }
                None => {}
            }
            let _ = write!(out, "{target} := ");
            format_expr(out, value);
            out.push(';');
        }
        Statement::Return(Return { value }) => {
            out.push_str(Reserved::Return.lexeme());
            if let Some(value) = value {
                out.push(' ');
                format_expr(out, value);
            }
            out.push(';');
        }
    }

    out.push('\n');
}

const fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => UNARY_PRECEDENCE,
        Expr::Literal(_) | Expr::Identifier(_) | Expr::Member { .. } | Expr::Call { .. } => {
            POSTFIX_PRECEDENCE
        }
    }
}

fn format_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(literal) => {
            let _ = write!(out, "{literal}");
        }
        Expr::Identifier(ident) => out.push_str(ident),
        Expr::Member { base, field } => {
            format_operand(out, base, precedence(base) < POSTFIX_PRECEDENCE);
            out.push('.');
            out.push_str(field);
        }
        Expr::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.symbol());
            format_operand(out, operand, precedence(operand) < UNARY_PRECEDENCE);
        }
        Expr::Binary { op, lhs, rhs } => {
            // left-associative: an equal-precedence right operand needs brackets
            format_operand(out, lhs, precedence(lhs) < op.precedence());
            let _ = write!(out, " {} ", op.symbol());
            format_operand(out, rhs, precedence(rhs) <= op.precedence());
        }
    }
}

fn format_operand(out: &mut String, expr: &Expr, bracket: bool) {
    if bracket {
        out.push('(');
        format_expr(out, expr);
        out.push(')');
    } else {
        format_expr(out, expr);
    }
}

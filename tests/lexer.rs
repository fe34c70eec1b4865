//! Lexer edge cases and error tests.

mod common;

use common::{lex_kinds, shape};
use connection_compiler::token::{
    BinaryOperation, Lang, NumberKind, Reserved, Special, UnaryOperation,
};
use connection_compiler::{LexErrorKind, Literal, Source, Span, TokenKind, tokenize, tokenize_source};

// -----------------------------------------------------------
// Basic lexer behaviour.
// -----------------------------------------------------------

#[test]
fn lex_empty_input() {
    let tokens = tokenize(Vec::<&str>::new()).expect("tokenize");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Special(Special::Eof));
}

#[test]
fn lex_only_whitespace_line() {
    let tokens = tokenize(["   \t  "]).expect("tokenize");
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_eof());
}

#[test]
fn eof_appears_exactly_once_and_last() {
    let tokens = tokenize(["NAME a;", "BEGIN", "END"]).expect("tokenize");
    let eofs = tokens.iter().filter(|t| t.is_eof()).count();
    assert_eq!(eofs, 1);
    assert!(tokens.last().is_some_and(|t| t.is_eof()));
}

#[test]
fn lex_scenario_assignment_block() {
    assert_eq!(
        lex_kinds("BEGIN x := 1 + 2; END"),
        vec![
            TokenKind::Reserved(Reserved::Begin),
            TokenKind::Word,
            TokenKind::Lang(Lang::Assign),
            TokenKind::Number(NumberKind::Integer),
            TokenKind::BinaryOperation(BinaryOperation::Plus),
            TokenKind::Number(NumberKind::Integer),
            TokenKind::Lang(Lang::Semicolon),
            TokenKind::Reserved(Reserved::End),
            TokenKind::Special(Special::Eof),
        ]
    );
}

#[test]
fn lex_all_reserved_words() {
    assert_eq!(
        lex_kinds("BEGIN END RETURN NAME MAGIC KEYPROTECTED"),
        vec![
            TokenKind::Reserved(Reserved::Begin),
            TokenKind::Reserved(Reserved::End),
            TokenKind::Reserved(Reserved::Return),
            TokenKind::Reserved(Reserved::Name),
            TokenKind::Reserved(Reserved::Magic),
            TokenKind::Reserved(Reserved::KeyProtected),
            TokenKind::Special(Special::Eof),
        ]
    );
}

#[test]
fn reserved_prefix_stays_a_word() {
    let tokens = tokenize(["BEGINNER NAMES _END"]).expect("tokenize");
    assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Word));
    assert_eq!(tokens[0].text, "BEGINNER");
}

#[test]
fn lex_all_punctuation_and_operators() {
    assert_eq!(
        lex_kinds("( ) ; . , : := + - * / ! ~"),
        vec![
            TokenKind::Lang(Lang::LeftBracket),
            TokenKind::Lang(Lang::RightBracket),
            TokenKind::Lang(Lang::Semicolon),
            TokenKind::Lang(Lang::Dot),
            TokenKind::Lang(Lang::Comma),
            TokenKind::Lang(Lang::Colon),
            TokenKind::Lang(Lang::Assign),
            TokenKind::BinaryOperation(BinaryOperation::Plus),
            TokenKind::BinaryOperation(BinaryOperation::Minus),
            TokenKind::BinaryOperation(BinaryOperation::Mul),
            TokenKind::BinaryOperation(BinaryOperation::Div),
            TokenKind::UnaryOperation(UnaryOperation::Not),
            TokenKind::UnaryOperation(UnaryOperation::Fill),
            TokenKind::Special(Special::Eof),
        ]
    );
}

#[test]
fn operators_need_no_whitespace() {
    let tokens = tokenize(["x:=-a*(b+1);"]).expect("tokenize");
    let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["x", ":=", "-", "a", "*", "(", "b", "+", "1", ")", ";", ""]
    );
}

#[test]
fn numbers_carry_values() {
    let tokens = tokenize(["0 42 3.5 10.25 true false"]).expect("tokenize");
    let values: Vec<_> = tokens.iter().filter_map(|t| t.value).collect();
    assert_eq!(
        values,
        vec![
            Literal::Integer(0),
            Literal::Integer(42),
            Literal::Real(3.5),
            Literal::Real(10.25),
            Literal::Boolean(true),
            Literal::Boolean(false),
        ]
    );
}

#[test]
fn non_numeric_tokens_carry_no_value() {
    let tokens = tokenize(["a := b;"]).expect("tokenize");
    assert!(tokens.iter().all(|t| t.value.is_none()));
}

#[test]
fn number_then_word_splits() {
    let tokens = tokenize(["12abc"]).expect("tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Number(NumberKind::Integer));
    assert_eq!(tokens[1].kind, TokenKind::Word);
    assert_eq!(tokens[1].text, "abc");
}

#[test]
fn i64_max_fits() {
    let tokens = tokenize(["9223372036854775807"]).expect("tokenize");
    assert_eq!(tokens[0].value, Some(Literal::Integer(i64::MAX)));
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn lex_error_unknown_character() {
    let err = tokenize(["BEGIN", "  x := 1 @ 2;", "END"]).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
    assert_eq!(err.span, Span { line: 2, column: 10 });
    let msg = err.to_string();
    assert!(msg.contains("unexpected character: @"));
    assert!(msg.contains("line 2, column 10"));
}

#[test]
fn lone_equals_is_rejected() {
    let err = tokenize(["x = 1;"]).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('='));
}

#[test]
fn lex_error_stops_at_first_failure() {
    let err = tokenize(["a # b $ c"]).unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('#'));
}

#[test]
fn integer_overflow_is_invalid_number() {
    let err = tokenize(["x := 9223372036854775808;"]).unwrap_err();
    assert_eq!(
        err.kind,
        LexErrorKind::InvalidNumber("9223372036854775808".to_string())
    );
    assert_eq!(err.span.column, 6);
}

// -----------------------------------------------------------
// Line handling.
// -----------------------------------------------------------

#[test]
fn joined_lines_lex_like_separate_lines() {
    let separate = tokenize(["NAME a;", "BEGIN x := 1 + 2; END"]).expect("tokenize");
    let joined = tokenize(["NAME a; BEGIN x := 1 + 2; END"]).expect("tokenize");
    assert_eq!(shape(&separate), shape(&joined));
}

#[test]
fn trailing_slashes_do_not_swallow_the_next_line() {
    let separate = tokenize(["x := 1; // signature", "y := 2;"]).expect("tokenize");
    let joined = tokenize(["x := 1; // signature y := 2;"]).expect("tokenize");
    assert_eq!(shape(&separate), shape(&joined));
    assert_eq!(separate.len(), 12);
}

#[test]
fn words_do_not_span_lines() {
    let tokens = tokenize(["ab", "cd"]).expect("tokenize");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].text, "ab");
    assert_eq!(tokens[1].text, "cd");
}

#[test]
fn tokenize_source_uses_file_line_numbers() {
    let source = Source::from_text("\n\nNAME a;\n\nBEGIN\nEND\n");
    let tokens = tokenize_source(&source).expect("tokenize");
    assert_eq!(tokens[0].span, Span { line: 3, column: 1 });
    assert_eq!(tokens[3].span, Span { line: 5, column: 1 });
}

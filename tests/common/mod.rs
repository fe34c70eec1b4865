#![allow(dead_code)]

use connection_compiler::{Program, Token, TokenKind, format, parse_str, tokenize};

pub const WINDOW_SERVER: &str = include_str!("../fixtures/window_server.conn");
pub const WINDOW_SERVER_OUT: &str = include_str!("../fixtures/window_server.out");

/// Kinds and lexemes of a token stream, ignoring spans.
pub fn shape(tokens: &[Token]) -> Vec<(TokenKind, String)> {
    tokens.iter().map(|t| (t.kind, t.text.clone())).collect()
}

pub fn lex_kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input.lines())
        .expect("tokenize failed")
        .iter()
        .map(|t| t.kind)
        .collect()
}

/// Helper: format an AST, parse it back, assert structural equality.
pub fn assert_ast_roundtrip(original: &Program) {
    let formatted = format(original);
    let parsed = parse_str(&formatted).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{formatted}"
        )
    });

    assert_eq!(
        original, &parsed,
        "statement mismatch\n--- formatted ---\n{formatted}"
    );
}

pub const WINDOW_SERVER_DECODER: &str = include_str!("../fixtures/window_server_decoder.conn");
pub const WINDOW_SERVER_DECODER_OUT: &str = include_str!("../fixtures/window_server_decoder.h");

//! Parser round-trip property: valid source, run through
//! parse → pretty-print → parse again, settles on an identical printed
//! form (source locations aside, since the pretty-printer discards them).

use loks_lexer::Lexer;
use loks_parser::pretty::print_program;
use loks_parser::Parser;
use loks_util::span::FileId;

fn print_twice(src: &str) -> (String, String) {
    let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
    assert!(lex_errors.is_empty(), "{lex_errors:?}");
    let (program, errors) = Parser::new(tokens).parse();
    assert!(errors.is_empty(), "{errors:?}");
    let once = print_program(&program);

    let (tokens_again, lex_errors) = Lexer::new(&once, FileId::DUMMY).tokenize();
    assert!(lex_errors.is_empty(), "{lex_errors:?}");
    let (program_again, errors) = Parser::new(tokens_again).parse();
    assert!(errors.is_empty(), "{errors:?}");
    let twice = print_program(&program_again);

    (once, twice)
}

#[test]
fn a_var_decl_round_trips() {
    let (once, twice) = print_twice("var x = 2 + 3 * 4;");
    assert_eq!(once, twice);
}

#[test]
fn a_function_with_control_flow_round_trips() {
    let (once, twice) = print_twice(
        "fun f(n) { if (n < 2) { return n; } elsif (n == 2) { return 1; } else { return f(n-1)+f(n-2); } }",
    );
    assert_eq!(once, twice);
}

#[test]
fn a_for_loop_round_trips() {
    let (once, twice) = print_twice("for (var i=0; i<3; i=i+1) { print(i); }");
    assert_eq!(once, twice);
}

#[test]
fn arrays_and_subscript_assignment_round_trip() {
    let (once, twice) = print_twice("var a = [1, 2, 3]; a[1] = 99;");
    assert_eq!(once, twice);
}

#[test]
fn short_circuit_and_or_round_trip() {
    let (once, twice) = print_twice("var x = true and false or nil;");
    assert_eq!(once, twice);
}

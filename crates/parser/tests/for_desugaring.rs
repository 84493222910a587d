use loks_lexer::Lexer;
use loks_parser::ast::{Decl, Stmt};
use loks_parser::Parser;
use loks_util::span::FileId;

fn parse(src: &str) -> Vec<Decl> {
    let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
    assert!(lex_errors.is_empty());
    let (decls, errors) = Parser::new(tokens).parse();
    assert!(errors.is_empty(), "{errors:?}");
    decls
}

// `for(var i=0; i<N; i=i+1) body` is structurally equivalent to
// `{ var i=0; while(i<N){ body; i=i+1; } }`.
#[test]
fn for_loop_matches_hand_desugared_while() {
    let for_decls = parse("for (var i=0; i<3; i=i+1) { print(i); }");
    let hand_decls = parse("{ var i=0; while(i<3){ print(i); i=i+1; } }");

    let Decl::Stmt(Stmt::BlockStmt(for_block)) = &for_decls[0] else {
        panic!("expected a block statement from the for loop");
    };
    let Decl::Stmt(Stmt::BlockStmt(hand_block)) = &hand_decls[0] else {
        panic!("expected a block statement from the hand-written version");
    };

    assert_eq!(for_block.decls.len(), hand_block.decls.len());

    let (Decl::Var(for_init), Decl::Var(hand_init)) = (&for_block.decls[0], &hand_block.decls[0])
    else {
        panic!("expected both to start with a var decl");
    };
    assert_eq!(for_init.name, hand_init.name);

    let (Decl::Stmt(Stmt::While { body: for_body, .. }), Decl::Stmt(Stmt::While { body: hand_body, .. })) =
        (&for_block.decls[1], &hand_block.decls[1])
    else {
        panic!("expected both to continue with a while");
    };
    assert_eq!(for_body.decls.len(), hand_body.decls.len());
}

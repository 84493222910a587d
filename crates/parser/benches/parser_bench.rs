use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loks_lexer::Lexer;
use loks_parser::Parser;
use loks_util::span::FileId;

fn parse(source: &str) -> usize {
    let (tokens, _) = Lexer::new(source, FileId::DUMMY).tokenize();
    let (decls, _) = Parser::new(tokens).parse();
    decls.len()
}

fn bench_parser(c: &mut Criterion) {
    let fib = "fun fib(n) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); } println(fib(10));";
    c.bench_function("parse_recursive_fn", |b| b.iter(|| parse(black_box(fib))));

    let loop_src = "var i = 0; while (i < 100) { print(i); i = i + 1; }";
    c.bench_function("parse_while_loop", |b| b.iter(|| parse(black_box(loop_src))));
}

criterion_group!(benches, bench_parser);
criterion_main!(benches);

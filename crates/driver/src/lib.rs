//! Wires the pipeline stages together end to end: source text in, either a
//! VM run or a tree-walking interpreter run out.
//!
//! Orchestration is phase-by-phase: it stops early once a requested
//! `--emit-*` stage is reached and aggregates every stage's diagnostics into
//! one report. The pipeline is short enough (no HIR/MIR/LIR/codegen/linking
//! phases) that there is no incremental cache: a single source file compiles
//! in well under the time such a cache would ever pay for itself.

use loks_bytecode::CodeObject;
use loks_compiler::compile as lower_to_bytecode;
use loks_lexer::Lexer;
use loks_parser::{ast::Program, Parser};
use loks_runtime::{HostIo, Interpreter};
use loks_sem::Analyzer;
use loks_util::diagnostic::Diagnostic;
use loks_util::error::LoksError;
use loks_util::span::{FileId, Span};
use loks_vm::Vm;

/// Which engine runs a successfully analyzed program, and whether the VM
/// traces its opcodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverConfig {
    /// Run the tree-walking interpreter instead of compiling to bytecode
    /// and running it on the VM (CLI `--tree-walk`).
    pub tree_walk: bool,
    /// Trace every VM opcode via `tracing::trace!` (CLI `-d`/`--debug`).
    /// Ignored when `tree_walk` is set: the interpreter has no equivalent
    /// per-opcode trace point.
    pub debug: bool,
}

/// Lexes, parses, and analyzes `source`, stopping at the first stage that
/// reports any diagnostic. Unlike the later runtime stages, each of these
/// three keeps going after a recoverable error, so a rejected program can
/// come back with more than one diagnostic at once.
fn front_end(source: &str, file_id: FileId) -> Result<Program, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, file_id).tokenize();
    if !lex_errors.is_empty() {
        return Err(to_diagnostics(&lex_errors));
    }

    let (program, parse_errors) = Parser::new(tokens).parse();
    if !parse_errors.is_empty() {
        return Err(to_diagnostics(&parse_errors));
    }

    let analysis_errors = Analyzer::analyze(&program);
    if !analysis_errors.is_empty() {
        return Err(to_diagnostics(&analysis_errors));
    }

    Ok(program)
}

fn to_diagnostics(errors: &[LoksError]) -> Vec<Diagnostic> {
    errors.iter().map(Diagnostic::from_error).collect()
}

/// Lexes, parses, and analyzes `source`, then compiles it to a
/// [`CodeObject`] without running it — the `loksc dump-bytecode`
/// subcommand's entry point.
pub fn compile(source: &str, file_id: FileId) -> Result<CodeObject, Vec<Diagnostic>> {
    let program = front_end(source, file_id)?;
    lower_to_bytecode(&program).map_err(|err| vec![Diagnostic::from_error(&err)])
}

/// Lexes, parses, analyzes, and runs `source` to completion, via the VM or
/// the tree-walking interpreter per `config.tree_walk` — the `loksc run`
/// subcommand's entry point.
///
/// A runtime failure is always reported as exactly one diagnostic, since
/// both engines abort at the first runtime error rather than
/// accumulating like the front end does. Bytecode carries no source spans,
/// so a VM error is attached to [`Span::DUMMY`]; the interpreter, which
/// walks the AST directly, reports the offending expression's real span.
pub fn run(
    source: &str,
    file_id: FileId,
    config: &DriverConfig,
    io: &mut dyn HostIo,
) -> Result<(), Vec<Diagnostic>> {
    let program = front_end(source, file_id)?;

    if config.tree_walk {
        let mut interpreter = Interpreter::new(io);
        interpreter.run(&program).map_err(|err| vec![Diagnostic::from_error(&err)])
    } else {
        let code = lower_to_bytecode(&program).map_err(|err| vec![Diagnostic::from_error(&err)])?;
        let mut vm = Vm::new(&code, io).with_debug(config.debug);
        vm.run().map_err(|kind| {
            let err = LoksError::new(kind, Span::DUMMY);
            vec![Diagnostic::from_error(&err)]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeIo {
        out: String,
    }

    impl HostIo for FakeIo {
        fn write_str(&mut self, s: &str) {
            self.out.push_str(s);
        }
        fn read_line(&mut self) -> String {
            String::new()
        }
    }

    #[test]
    fn run_via_the_vm_executes_the_program() {
        let mut io = FakeIo::default();
        let result = run("println(1+2);", FileId::DUMMY, &DriverConfig::default(), &mut io);
        assert!(result.is_ok());
        assert_eq!(io.out, "3\n");
    }

    #[test]
    fn run_via_the_tree_walker_agrees_with_the_vm() {
        let mut io = FakeIo::default();
        let config = DriverConfig { tree_walk: true, debug: false };
        let result = run("println(1+2);", FileId::DUMMY, &config, &mut io);
        assert!(result.is_ok());
        assert_eq!(io.out, "3\n");
    }

    #[test]
    fn a_syntax_error_is_reported_without_running_anything() {
        let mut io = FakeIo::default();
        let result = run("var x = ;", FileId::DUMMY, &DriverConfig::default(), &mut io);
        let diagnostics = result.unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert!(io.out.is_empty());
    }

    #[test]
    fn an_undeclared_name_is_caught_by_analysis_before_running() {
        let mut io = FakeIo::default();
        let result = run("println(nope);", FileId::DUMMY, &DriverConfig::default(), &mut io);
        assert!(result.is_err());
        assert!(io.out.is_empty());
    }

    #[test]
    fn a_runtime_error_surfaces_as_exactly_one_diagnostic() {
        let mut io = FakeIo::default();
        let result = run("println(1/0);", FileId::DUMMY, &DriverConfig::default(), &mut io);
        let diagnostics = result.unwrap_err();
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn compile_produces_a_code_object_without_running_it() {
        let code = compile("println(1);", FileId::DUMMY).unwrap();
        assert!(!code.functions.is_empty());
    }

    /// Accepted by analysis (a nested function reading an enclosing local is
    /// a legal lexical closure there) but this flat-frame VM compiler cannot
    /// address it, so `run` must report it as a normal diagnostic rather
    /// than abort the process compiling it.
    #[test]
    fn compiling_a_captured_enclosing_local_reports_a_diagnostic_not_a_panic() {
        let mut io = FakeIo::default();
        let src = "fun outer(){ var x=1; fun inner(){ return x; } return inner(); } println(outer());";
        let result = run(src, FileId::DUMMY, &DriverConfig::default(), &mut io);
        assert!(result.is_err());
        assert!(io.out.is_empty());
    }
}

//! The seven built-in functions, callable by index from both the
//! tree-walking interpreter and the VM's `CALL_NATIVE` opcode. Grounded on
//! `stdlib.py`, with I/O routed through [`HostIo`] so tests can swap in an
//! in-memory host instead of the real terminal.

use loks_util::error::ErrorKind;
use loks_util::symbol::BUILTIN_NAMES;

use crate::value::{display_value, Number, Value};

/// Injectable stdin/stdout, letting callers (CLI, tests) choose where a
/// built-in's bytes go without the runtime depending on the real terminal.
pub trait HostIo {
    fn write_str(&mut self, s: &str);
    fn read_line(&mut self) -> String;
}

/// The default host: the process's real stdout/stdin.
pub struct StdIo;

impl HostIo for StdIo {
    fn write_str(&mut self, s: &str) {
        use std::io::Write;
        print!("{s}");
        let _ = std::io::stdout().flush();
    }

    fn read_line(&mut self) -> String {
        use std::io::BufRead;
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        line
    }
}

/// Resolves a built-in's name to its pool index, pre-interned as
/// [`BUILTIN_NAMES`].
pub fn builtin_index(name: &str) -> Option<u8> {
    BUILTIN_NAMES.iter().position(|n| *n == name).map(|i| i as u8)
}

/// Invokes the built-in at `index` with `args`. Every built-in takes
/// exactly one argument.
pub fn call_builtin(index: u8, args: &[Value], io: &mut dyn HostIo) -> Result<Value, ErrorKind> {
    let arg = args.first().ok_or_else(|| {
        ErrorKind::TypeError(format!("{} expects exactly one argument", builtin_name(index)))
    })?;
    match index {
        0 => print_impl(arg, io),
        1 => println_impl(arg, io),
        2 => input_impl(arg, io),
        3 => len_impl(arg),
        4 => int_impl(arg),
        5 => str_impl(arg),
        6 => isinteger_impl(arg),
        _ => Err(ErrorKind::NameError(format!("no built-in at index {index}"))),
    }
}

fn builtin_name(index: u8) -> &'static str {
    BUILTIN_NAMES.get(index as usize).copied().unwrap_or("<unknown builtin>")
}

/// Writes its argument to stdout with no trailing newline. A `String`
/// argument is written unquoted; everything else uses its printable form.
fn print_impl(arg: &Value, io: &mut dyn HostIo) -> Result<Value, ErrorKind> {
    write_printed(arg, io);
    Ok(Value::Nil)
}

fn println_impl(arg: &Value, io: &mut dyn HostIo) -> Result<Value, ErrorKind> {
    write_printed(arg, io);
    io.write_str("\n");
    Ok(Value::Nil)
}

fn write_printed(arg: &Value, io: &mut dyn HostIo) {
    match arg {
        Value::String(s) => io.write_str(s),
        other => io.write_str(&display_value(other)),
    }
}

/// Writes its argument as a prompt, then reads one line from stdin and
/// returns it as a `String`. The prompt must itself be a `String`.
fn input_impl(arg: &Value, io: &mut dyn HostIo) -> Result<Value, ErrorKind> {
    let Value::String(prompt) = arg else {
        return Err(ErrorKind::TypeError(format!(
            "input() prompt must be a String, got {}",
            arg.kind_name()
        )));
    };
    io.write_str(prompt);
    Ok(Value::string(io.read_line()))
}

/// Length of a `String` (byte length) or `Array`.
fn len_impl(arg: &Value) -> Result<Value, ErrorKind> {
    let len = match arg {
        Value::String(s) => s.len(),
        Value::Array(a) => a.borrow().len(),
        other => {
            return Err(ErrorKind::TypeError(format!(
                "len() expects a String or Array, got {}",
                other.kind_name()
            )))
        }
    };
    Ok(Value::Number(Number::Integer(len as i64)))
}

/// Converts a `String` or `Boolean` to an integer `Number`.
fn int_impl(arg: &Value) -> Result<Value, ErrorKind> {
    match arg {
        Value::Boolean(b) => Ok(Value::Number(Number::Integer(if *b { 1 } else { 0 }))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|n| Value::Number(Number::Integer(n)))
            .map_err(|_| ErrorKind::ValueError(format!("invalid literal for int(): {s:?}"))),
        other => Err(ErrorKind::TypeError(format!(
            "int() expects a String or Boolean, got {}",
            other.kind_name()
        ))),
    }
}

/// Returns the printable form of any value as a `String`. Re-quotes an
/// already-`String` argument rather than returning it unchanged: `str(x)`
/// always routes through the same display form as array elements do.
fn str_impl(arg: &Value) -> Result<Value, ErrorKind> {
    Ok(Value::string(display_value(arg)))
}

/// Reports whether a `String` is a valid integer literal (optional leading
/// sign, then at least one digit, nothing else).
fn isinteger_impl(arg: &Value) -> Result<Value, ErrorKind> {
    let Value::String(s) = arg else {
        return Err(ErrorKind::TypeError(format!(
            "isinteger() expects a String, got {}",
            arg.kind_name()
        )));
    };
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let is_int = !body.is_empty() && body.chars().all(|c| c.is_ascii_digit());
    Ok(Value::Boolean(is_int))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeIo {
        out: String,
        input_lines: Vec<String>,
    }

    impl HostIo for FakeIo {
        fn write_str(&mut self, s: &str) {
            self.out.push_str(s);
        }
        fn read_line(&mut self) -> String {
            self.input_lines.pop().unwrap_or_default()
        }
    }

    #[test]
    fn print_does_not_quote_a_top_level_string() {
        let mut io = FakeIo::default();
        print_impl(&Value::string("hi"), &mut io).unwrap();
        assert_eq!(io.out, "hi");
    }

    #[test]
    fn println_appends_a_newline() {
        let mut io = FakeIo::default();
        println_impl(&Value::Number(Number::Integer(5)), &mut io).unwrap();
        assert_eq!(io.out, "5\n");
    }

    #[test]
    fn len_of_array_counts_elements() {
        let arr = Value::array(vec![Value::Nil, Value::Nil]);
        let result = len_impl(&arr).unwrap();
        assert!(matches!(result, Value::Number(Number::Integer(2))));
    }

    #[test]
    fn len_of_nil_is_a_type_error() {
        assert!(matches!(len_impl(&Value::Nil), Err(ErrorKind::TypeError(_))));
    }

    #[test]
    fn int_parses_a_numeric_string() {
        let result = int_impl(&Value::string("42")).unwrap();
        assert!(matches!(result, Value::Number(Number::Integer(42))));
    }

    #[test]
    fn int_rejects_a_non_numeric_string() {
        assert!(matches!(int_impl(&Value::string("nope")), Err(ErrorKind::ValueError(_))));
    }

    #[test]
    fn isinteger_accepts_a_signed_digit_string() {
        let result = isinteger_impl(&Value::string("-12")).unwrap();
        assert!(matches!(result, Value::Boolean(true)));
    }

    #[test]
    fn isinteger_rejects_a_float_looking_string() {
        let result = isinteger_impl(&Value::string("1.5")).unwrap();
        assert!(matches!(result, Value::Boolean(false)));
    }

    #[test]
    fn builtin_index_matches_the_canonical_order() {
        assert_eq!(builtin_index("print"), Some(0));
        assert_eq!(builtin_index("println"), Some(1));
        assert_eq!(builtin_index("isinteger"), Some(6));
        assert_eq!(builtin_index("nope"), None);
    }
}

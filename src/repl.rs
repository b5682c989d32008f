//! Interactive REPL (§6.6 `repl`): each line is a whitespace-separated
//! sequence of opset names and decimal literals, evaluated against a
//! session stack that persists across lines. `:load <name>` pulls in a
//! module by name and prints its artifact; `:quit` ends the session.

use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::config::LoaderConfig;
use crate::effects::NullHandler;
use crate::eval::{Stack, eval};
use crate::loader::source::ModuleSource;
use crate::loader::{CompileG0, Loader};
use crate::program::{Op, Program};
use crate::value::Value;

pub struct Repl {
    stack: Stack,
    loader: Loader,
}

impl Repl {
    pub fn new(source: Rc<dyn ModuleSource>, config: LoaderConfig) -> Self {
        Repl { stack: Vec::new(), loader: Loader::new(config, source, CompileG0::Native(crate::bootstrap::compile_g0_native)) }
    }

    /// Parse one line into a `Program`: `add`/`sub`/... resolve to `Op`
    /// names (§6.2), anything else must be a decimal natural literal.
    fn parse_line(line: &str) -> Result<Program, String> {
        let mut items = Vec::new();
        for token in line.split_whitespace() {
            if let Some(op) = Op::from_name(token) {
                items.push(Program::Op(op));
            } else if let Ok(n) = token.parse::<u64>() {
                items.push(Program::Data(Value::nat(n)));
            } else {
                return Err(format!("unrecognized token `{token}` (not an opset name or a decimal literal)"));
            }
        }
        Ok(Program::Seq(items))
    }

    fn print_stack(&self) {
        print!("[");
        for (i, v) in self.stack.iter().enumerate() {
            if i > 0 {
                print!(", ");
            }
            print!("{v:?}");
        }
        println!("]");
    }

    fn handle_load(&mut self, name: &str) {
        match self.loader.load_by_name(name) {
            Some(v) => println!("{v:?}"),
            None => println!("load failed for `{name}` (see log output)"),
        }
    }

    /// Run the REPL loop over `input`, writing prompts and results to
    /// `output`. Split out from `run` so it can be driven by a fixed
    /// transcript in tests without touching real stdio.
    pub fn run_over(&mut self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        writeln!(output, "glas-rt repl -- `:load <name>`, `:quit` to exit")?;
        for line in input.lines() {
            let line = line?;
            write!(output, "> ")?;
            output.flush()?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == ":quit" {
                break;
            }
            if let Some(name) = line.strip_prefix(":load ") {
                self.handle_load(name.trim());
                continue;
            }
            match Self::parse_line(line) {
                Ok(program) => match eval(&program, &mut NullHandler, std::mem::take(&mut self.stack)) {
                    Some(next) => {
                        self.stack = next;
                        self.print_stack();
                    }
                    None => {
                        writeln!(output, "evaluation failed, stack unchanged")?;
                    }
                },
                Err(e) => writeln!(output, "{e}")?,
            }
        }
        Ok(())
    }

    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        self.run_over(stdin.lock(), io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::source::MemorySource;

    fn repl() -> Repl {
        Repl::new(Rc::new(MemorySource::new()), LoaderConfig::default())
    }

    #[test]
    fn arithmetic_line_updates_the_session_stack() {
        let mut r = repl();
        let input = b"3 4 add\n" as &[u8];
        let mut out = Vec::new();
        r.run_over(input, &mut out).unwrap();
        assert_eq!(r.stack, vec![Value::nat(7)]);
    }

    #[test]
    fn unrecognized_token_reports_an_error_without_panicking() {
        let mut r = repl();
        let input = b"nonsense\n" as &[u8];
        let mut out = Vec::new();
        r.run_over(input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("unrecognized token"));
        assert!(r.stack.is_empty());
    }

    #[test]
    fn quit_stops_the_loop_before_later_lines_run() {
        let mut r = repl();
        let input = b":quit\n3 4 add\n" as &[u8];
        let mut out = Vec::new();
        r.run_over(input, &mut out).unwrap();
        assert!(r.stack.is_empty());
    }
}

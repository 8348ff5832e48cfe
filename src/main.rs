// ABOUTME: CLI entry point and REPL for the HexScript interpreter

mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod lexer;
mod parser;
mod realm;
mod token;
mod value;

use ast::{Program, StmtKind};
use clap::Parser as CliParser;
use error::HexError;
use eval::Interpreter;
use lexer::Lexer;
use parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::exit;
use value::Value;

/// HexScript interpreter
#[derive(CliParser, Debug)]
#[command(name = "hexscript")]
#[command(about = "An interpreter for the HexScript language")]
struct CliArgs {
    /// Source file to execute (optional - if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Run the given source string, then exit
    #[arg(short = 'c', long = "command", value_name = "STRING")]
    command: Option<String>,

    /// Dump the token stream and the AST before executing
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Print the interpreter version and exit
    #[arg(short = 'v', long = "version")]
    version: bool,
}

fn main() {
    let args = CliArgs::parse();

    if args.version {
        println!("HexScript {}", config::VERSION);
        return;
    }

    if let Some(source) = &args.command {
        run_source(source, args.debug);
        return;
    }

    if let Some(path) = &args.script {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("Scroll not found: {}: {}", path.display(), e);
                exit(1);
            }
        };
        run_source(&source, args.debug);
        return;
    }

    repl();
}

/// Run one source string through the full pipeline; exit non-zero on any
/// surfaced error.
fn run_source(source: &str, debug: bool) {
    let mut interpreter = Interpreter::new();
    match compile(source, debug) {
        Ok(program) => {
            if let Err(e) = interpreter.interpret(&program) {
                eprintln!("{}", e);
                exit(1);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    }
}

/// Lex and parse, optionally dumping tokens and the AST.
fn compile(source: &str, debug: bool) -> Result<Program, HexError> {
    let tokens = Lexer::new(source).tokenize()?;

    if debug {
        println!("=== Tokens ===");
        for token in &tokens {
            println!("  {}", token);
        }
        println!();
    }

    let program = Parser::new(tokens).parse()?;

    if debug {
        println!("=== AST ===");
        println!("{:#?}", program);
        println!();
    }

    Ok(program)
}

// ============ REPL ============

fn repl() {
    println!("{} v{}", config::WELCOME_MESSAGE, config::VERSION);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    let mut interpreter = Interpreter::new();

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = match Editor::<(), FileHistory>::with_config(rl_config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize REPL: {}", e);
            exit(1);
        }
    };
    let _ = rl.load_history(config::HISTORY_FILE);

    // Buffered multi-line input: a line ending in '{' opens a unit that
    // runs once the braces balance again
    let mut buffer: Vec<String> = Vec::new();
    let mut balance: i64 = 0;

    loop {
        let prompt = if buffer.is_empty() {
            config::PROMPT
        } else {
            config::CONTINUATION_PROMPT
        };

        match rl.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() && matches!(line.trim(), "exit" | "quit") {
                    println!("{}", config::FAREWELL);
                    break;
                }

                if line.trim().is_empty() {
                    // An empty line submits the buffer once braces balance
                    if !buffer.is_empty() && balance <= 0 {
                        let source = buffer.join("\n");
                        buffer.clear();
                        balance = 0;
                        execute_unit(&mut interpreter, &source);
                    }
                    continue;
                }

                let delta = brace_delta(&line);

                if buffer.is_empty() {
                    if line.trim_end().ends_with('{') {
                        balance = delta;
                        buffer.push(line);
                        continue;
                    }
                    execute_unit(&mut interpreter, &line);
                } else {
                    balance += delta;
                    let closes_at_left_margin = line.starts_with('}');
                    buffer.push(line);
                    if closes_at_left_margin && balance <= 0 {
                        let source = buffer.join("\n");
                        buffer.clear();
                        balance = 0;
                        execute_unit(&mut interpreter, &source);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                buffer.clear();
                balance = 0;
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\n{}", config::FAREWELL);
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
}

/// Run one REPL unit; echo the value of a lone expression statement.
fn execute_unit(interpreter: &mut Interpreter, source: &str) {
    let program = match compile(source, false) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    match interpreter.interpret(&program) {
        Ok(value) => {
            let lone_expression = program.statements.len() == 1
                && matches!(program.statements[0].kind, StmtKind::Expr(_));
            if lone_expression && !matches!(value, Value::Void) {
                println!("{}", value);
            }
        }
        Err(e) => eprintln!("{}", e),
    }
}

/// Net change in brace nesting across a line, ignoring braces inside string
/// literals and after a comment marker.
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut in_string: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match in_string {
            Some(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => in_string = Some(c),
                '~' => break,
                '{' => delta += 1,
                '}' => delta -= 1,
                _ => {}
            },
        }
    }
    delta
}

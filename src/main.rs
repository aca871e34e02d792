use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use climavl::logger::initialize_logger;
use climavl::shell::{Response, Session, ShellResult, render};

mod args;

const PROMPT: &str = "climavl> ";
const CONTINUATION_PROMPT: &str = "      -> ";

fn main() -> ExitCode {
    initialize_logger();
    let options = args::Options::parse();

    let config = match options.session_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = match Session::open(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &options.execute {
        Some(statements) => execute(&mut session, statements, options.json),
        None => repl(&mut session, options.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_response(response: &Response, json: bool) -> ShellResult<()> {
    let text = if json {
        render::to_json(response)?
    } else {
        render::to_text(response)
    };
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

fn execute(session: &mut Session, statements: &str, json: bool) -> ShellResult<()> {
    session.run_each(statements, |response| print_response(&response, json))
}

/// A buffer is complete once it ends with ';', or with comment lines
/// that follow nothing but complete statements
fn is_complete(buffer: &str) -> bool {
    let mut lines: Vec<&str> = buffer
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(last) = lines.last() else {
        return false;
    };
    if last.ends_with(';') {
        return true;
    }
    if !last.starts_with("--") {
        return false;
    }

    while lines.last().is_some_and(|line| line.starts_with("--")) {
        lines.pop();
    }
    lines.last().is_none_or(|line| line.ends_with(';'))
}

fn repl(session: &mut Session, json: bool) -> ShellResult<()> {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            error!("Cannot start line editor: {e}");
            return Ok(());
        }
    };

    println!(
        "{} countries loaded. Statements end with ';'. Ctrl-D to quit.",
        session.tree().len()
    );

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };

        match editor.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() && matches!(line.trim(), "exit" | "quit") {
                    break;
                }
                buffer.push_str(&line);
                buffer.push('\n');
                if !is_complete(&buffer) {
                    continue;
                }

                if let Err(e) = editor.add_history_entry(buffer.trim_end()) {
                    debug!("History not updated: {e}");
                }
                if let Err(e) = execute(session, &buffer, json) {
                    eprintln!("{e}");
                }
                buffer.clear();
            }
            // Ctrl-C drops the pending statement
            Err(ReadlineError::Interrupted) => buffer.clear(),
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Read error: {e}");
                break;
            }
        }
    }
    Ok(())
}

//! Line mode with rustyline.
//!
//! Interactive mode: prompt, history, meta commands.
//! Pipe mode: read lines from stdin, execute each.
//!
//! Both modes tokenize with shlex, so quoted names keep their spaces.
//! Blank lines and `#` comments are skipped; `quit` / `exit` stop early and
//! `help` prints the command list.

use std::io::{self, BufRead, Write};

use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};

use crate::commands::build_line_cmd;
use crate::format::{format_error, format_output, OutputMode};
use crate::parse::{check_meta_command, matches_to_action, MetaCommand};
use crate::state::SessionState;

const PROMPT: &str = "skudb> ";

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    Ok,
    Failed,
    Quit,
}

/// Run the interactive prompt until EOF or `quit`.
///
/// Returns the process exit code: 1 if any command failed, else 0.
pub fn run_repl(state: &SessionState, mode: OutputMode) -> i32 {
    let config = Config::builder().history_ignore_space(true).build();
    let mut rl = match DefaultEditor::with_config(config) {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("(error) {}", e);
            return 1;
        }
    };

    let history_path = history_file();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    let stdout = io::stdout();
    let mut exit_code = 0;
    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.trim());
                }
                match run_line(state, mode, &line, &mut stdout.lock()) {
                    LineOutcome::Ok => {}
                    LineOutcome::Failed => exit_code = 1,
                    LineOutcome::Quit => break,
                }
            }
            // Ctrl-C abandons the current line only
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("(error) {}", err);
                exit_code = 1;
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
    exit_code
}

/// Run commands from `input` until EOF or `quit`, without prompting.
///
/// Returns the process exit code: 1 if any command failed, else 0.
pub fn run_lines<R: BufRead, W: Write>(
    state: &SessionState,
    mode: OutputMode,
    input: R,
    out: &mut W,
) -> i32 {
    let mut exit_code = 0;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("(error) {}", e);
                return 1;
            }
        };
        match run_line(state, mode, &line, out) {
            LineOutcome::Ok => {}
            LineOutcome::Failed => exit_code = 1,
            LineOutcome::Quit => break,
        }
    }
    exit_code
}

/// Run line mode on the process's stdin/stdout.
pub fn run_pipe(state: &SessionState, mode: OutputMode) -> i32 {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_lines(state, mode, stdin.lock(), &mut out)
}

fn run_line<W: Write>(
    state: &SessionState,
    mode: OutputMode,
    line: &str,
    out: &mut W,
) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return LineOutcome::Ok;
    }

    match check_meta_command(trimmed) {
        Some(MetaCommand::Quit) => return LineOutcome::Quit,
        Some(MetaCommand::Help) => {
            let _ = writeln!(out, "{}", build_line_cmd().render_help());
            return LineOutcome::Ok;
        }
        None => {}
    }

    let tokens = match shlex::split(trimmed) {
        Some(tokens) => tokens,
        None => {
            eprintln!("(error) Invalid quoting: {}", trimmed);
            return LineOutcome::Failed;
        }
    };
    if tokens.is_empty() {
        return LineOutcome::Ok;
    }

    let matches = match build_line_cmd().try_get_matches_from(tokens) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            return LineOutcome::Failed;
        }
    };

    let action = match matches_to_action(&matches) {
        Ok(Some(action)) => action,
        Ok(None) => return LineOutcome::Ok,
        Err(e) => {
            eprintln!("(error) {}", e);
            return LineOutcome::Failed;
        }
    };

    match state.execute(action) {
        Ok(output) => {
            let _ = writeln!(out, "{}", format_output(&output, mode));
            LineOutcome::Ok
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            LineOutcome::Failed
        }
    }
}

fn history_file() -> Option<String> {
    std::env::var("HOME")
        .ok()
        .map(|h| format!("{}/.skudb_history", h))
}

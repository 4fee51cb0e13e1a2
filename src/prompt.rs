//! Line-oriented prompts over any reader/writer pair.
//!
//! Sessions take their input and output streams as parameters so the
//! interactive flows can be driven from tests with in-memory buffers.

use std::io::{BufRead, Write};

use crate::error::Result;

/// Answers accepted by the demo confirmation
pub const DEMO_ACCEPT: &[&str] = &["y", "yes", "是"];

/// Answers accepted by the end-to-end workflow confirmation
pub const WORKFLOW_ACCEPT: &[&str] = &["y"];

fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<Option<String>> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        // EOF: keep the terminal tidy
        writeln!(output)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask a yes/no question. EOF counts as "no".
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    accepted: &[&str],
) -> Result<bool> {
    let answer = match read_answer(input, output, question)? {
        Some(answer) => answer.to_lowercase(),
        None => return Ok(false),
    };
    Ok(accepted.contains(&answer.as_str()))
}

/// Ask for free text, falling back to `default` on an empty answer
pub fn ask_with_default<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: &str,
) -> Result<String> {
    match read_answer(input, output, question)? {
        Some(answer) if !answer.is_empty() => Ok(answer),
        _ => Ok(default.to_string()),
    }
}

/// Print a numbered list and return the chosen index.
/// Blank or unrecognised input selects the first option.
pub fn choose<R: BufRead, W: Write, S: AsRef<str>>(
    input: &mut R,
    output: &mut W,
    question: &str,
    options: &[S],
) -> Result<usize> {
    for (i, option) in options.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, option.as_ref())?;
    }

    let answer = read_answer(input, output, question)?.unwrap_or_default();
    let index = answer
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=options.len()).contains(n))
        .map(|n| n - 1)
        .unwrap_or(0);
    Ok(index)
}

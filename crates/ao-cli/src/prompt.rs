//! Terminal yes/no/cancel prompt used by the delete commands.

use std::io::{BufRead, Write};

use ao_core::{AoError, AoResult};

/// Ask on stderr, read the answer from stdin until it is one of Y/N/C.
///
/// End of input counts as cancel so a closed stdin never deletes anything.
pub fn yes_no_cancel(text: &str) -> AoResult<String> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stderr = std::io::stderr();
    loop {
        write!(stderr, "{text}? [y]es/[n]o/[c]ancel: ")
            .and_then(|_| stderr.flush())
            .map_err(|e| AoError::Prompt(e.to_string()))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| AoError::Prompt(e.to_string()))?;
        if read == 0 {
            return Ok("C".to_string());
        }
        match normalize(&line) {
            Some(answer) => return Ok(answer.to_string()),
            None => {
                let _ = writeln!(stderr, "please answer y, n or c");
            }
        }
    }
}

fn normalize(line: &str) -> Option<&'static str> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some("Y"),
        "n" | "no" => Some("N"),
        "c" | "cancel" => Some("C"),
        _ => None,
    }
}

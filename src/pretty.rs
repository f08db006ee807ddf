// src/pretty.rs
use std::io::{BufRead, Write};

use crate::error::Result;
use crate::logging::{LogRecord, PrettyFormatter};

/// Re-renders newline-delimited JSON records through `formatter`. Lines that
/// are not records pass through unchanged; suppressed records are dropped.
/// Returns the number of lines written.
pub fn run<R: BufRead, W: Write>(formatter: &PrettyFormatter, input: R, mut output: W) -> Result<usize> {
    let mut written = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let rendered = match serde_json::from_str::<LogRecord>(&line) {
            Ok(record) => formatter.format(&record),
            Err(_) => Some(line),
        };
        if let Some(rendered) = rendered {
            writeln!(output, "{}", rendered)?;
            written += 1;
        }
    }
    output.flush()?;
    Ok(written)
}

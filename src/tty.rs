//! Terminal I/O utilities for CLI.
//!
//! Prompts and candidate tables go to stderr so stdout stays pure JSON.

use std::io::{self, BufRead, IsTerminal, Write};

use sweep::confirm::{ConfirmationRequest, Confirmer};
use sweep::record::ResourceRecord;

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

/// Print `message` and read one raw line, terminator included.
///
/// Returns `None` on end of input.
pub fn read_answer(message: &str) -> sweep::Result<Option<String>> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).map_err(|e| {
        sweep::Error::internal_io(format!("Failed to read input: {}", e), Some("read stdin".to_string()))
    })?;

    if read == 0 {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}

/// Print `message` and read a trimmed line; end of input reads as empty.
pub fn prompt(message: &str) -> sweep::Result<String> {
    Ok(read_answer(message)?
        .map(|line| line.trim().to_string())
        .unwrap_or_default())
}

/// Like [`prompt`] but strips only the line terminator, keeping spaces.
pub fn prompt_line(message: &str) -> sweep::Result<String> {
    Ok(read_answer(message)?
        .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
        .unwrap_or_default())
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message);
    }
}

/// Asks the operator on the controlling terminal.
#[derive(Debug, Default)]
pub struct TtyConfirmer;

impl Confirmer for TtyConfirmer {
    fn ask(&mut self, request: &ConfirmationRequest<'_>) -> sweep::Result<Option<String>> {
        match request {
            ConfirmationRequest::Candidates {
                target_kind,
                group,
                candidates,
            } => {
                match group {
                    Some(group) => eprintln!(
                        "The following {} {} in {} will be deleted:",
                        candidates.len(),
                        target_kind,
                        group
                    ),
                    None => eprintln!("The following {} {} will be deleted:", candidates.len(), target_kind),
                }
                eprintln!("{}", render_table(candidates));
            }
            ConfirmationRequest::Operation { description } => {
                eprintln!("{}", description);
            }
        }

        read_answer("Proceed? [y/N]: ")
    }
}

/// Left-aligned columns: id, then attribute values.
fn render_table(records: &[ResourceRecord]) -> String {
    let rows: Vec<Vec<&str>> = records
        .iter()
        .map(|r| {
            std::iter::once(r.id.as_str())
                .chain(r.attributes.iter().map(|a| a.value.as_str()))
                .collect()
        })
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| rows.iter().filter_map(|row| row.get(i)).map(|v| v.len()).max().unwrap_or(0))
        .collect();

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, value)| format!("{:<width$}", value, width = widths[i]))
                .collect();
            format!("  {}", cells.join("  ").trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

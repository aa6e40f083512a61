//! Terminal output for the CLI: colored status lines and result tables.

use comfy_table::{presets, Attribute, Cell, Table};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::models::{value_text, FileDescriptor, Record, SearchResults};

/// Columns shown for search results when the records have them
const PREFERRED_COLUMNS: &[&str] = &["referenceId", "referenceType", "dateOfIssue", "title"];

/// Longest cell text before truncation
const MAX_CELL_WIDTH: usize = 60;

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Download,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Download => "↓",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, message: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), message),
        Status::Error => eprintln!("{} {}", icon.red().bold(), message),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), message),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), message),
        Status::Download => eprintln!("{} {}", icon.magenta(), message),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Truncate text to `max_chars`, appending an ellipsis when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Table of search results
pub fn search_table(results: &SearchResults) -> Table {
    let columns = display_columns(results);

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(columns.clone());

    for record in &results.items {
        let cells = columns.iter().enumerate().map(|(index, column)| {
            let text = truncate_with_ellipsis(&cell_text(record, column), MAX_CELL_WIDTH);
            if index == 0 {
                Cell::new(text).add_attribute(Attribute::Bold)
            } else {
                Cell::new(text)
            }
        });
        table.add_row(cells);
    }

    table
}

/// Table of digital files
pub fn files_table(files: &[FileDescriptor]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_header(vec!["File", "Download link"]);

    for file in files {
        table.add_row(vec![
            Cell::new(&file.file_name).add_attribute(Attribute::Bold),
            Cell::new(&file.download_link),
        ]);
    }

    table
}

/// Plain text lines for search results, one record per block
pub fn search_plain(results: &SearchResults) -> String {
    let mut out = String::new();
    for record in &results.items {
        for (key, value) in record {
            out.push_str(&format!("{}: {}\n", key, value_text(value)));
        }
        out.push('\n');
    }
    out
}

fn display_columns(results: &SearchResults) -> Vec<String> {
    let Some(first) = results.items.first() else {
        return Vec::new();
    };

    let preferred: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|column| first.contains_key(**column))
        .map(|column| column.to_string())
        .collect();

    if preferred.is_empty() {
        first.keys().take(PREFERRED_COLUMNS.len()).cloned().collect()
    } else {
        preferred
    }
}

fn cell_text(record: &Record, column: &str) -> String {
    record.get(column).map(value_text).unwrap_or_default()
}

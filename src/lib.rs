#![allow(clippy::module_inception)]

use crate::errors::errors::{ErrorTip, ParserError};

pub mod ast;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;

extern crate regex;

/// A location in the source text. Lines and columns are 1-based, offsets are byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(offset: u32, line: u32, column: u32) -> Self {
        Position { offset, line, column }
    }

    pub fn null() -> Self {
        Position { offset: 0, line: 1, column: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// Covers everything from the start of `first` to the end of `last`.
    pub fn merge(first: &Span, last: &Span) -> Span {
        Span { start: first.start, end: last.end }
    }

    pub fn len(&self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns the 1-based line number, the text of that line and the byte offset within it.
pub fn get_line_at_position(source: &str, offset: u32) -> Option<(usize, String, usize)> {
    let pos = offset as usize;

    if pos > source.len() {
        return None;
    }

    let mut start = 0;
    let mut line_number = 1;

    for line in source.split_inclusive('\n') {
        let end = start + line.len();

        if (start..end).contains(&pos) {
            return Some((line_number, line.to_string(), pos - start));
        }

        start = end;
        line_number += 1;
    }

    // Offset at the very end of the input (e.g. the EOF token).
    if source.is_empty() || source.ends_with('\n') {
        return Some((line_number, String::new(), 0));
    }

    let last = source.rsplit('\n').next().unwrap_or("");
    Some((line_number - 1, last.to_string(), last.len()))
}


/// Prints a parse error in the form `file:line:column: message` followed by the offending line.
pub fn display_error(error: &ParserError, file: &str, source: &str) {
    /*
        test.fluid:2:9: Expected expression, got 'end'
           |
         2 | local a = end
           | ----------^
    */

    let position = error.get_position();
    eprintln!("{}:{}:{}: {}", file, position.line, position.column, error);

    if let ErrorTip::Suggestion(tip) = error.get_tip() {
        eprintln!("  = {} ({})", error.get_error_name(), tip);
    }

    let Some((line, line_text, line_pos)) = get_line_at_position(source, position.offset) else {
        return;
    };

    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(&line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = caret_column(&line_text, line_pos).saturating_sub(removed_whitespace) + 1;

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

/// Character column of the byte offset `line_pos` within `line_text`.
fn caret_column(line_text: &str, line_pos: usize) -> usize {
    line_text
        .get(..line_pos)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(line_pos)
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let mut start = 0;
    for c in string.chars() {
        if c == ' ' || c == '\t' {
            start += 1;
        } else {
            break;
        }
    }

    (String::from(&string[start..]), start)
}

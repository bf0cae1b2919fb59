use crate::types::Clause;
use std::iter::FusedIterator;

/// Lazily splits meeting text into clauses.
///
/// Boundaries are `.`, `!`, `?` and newlines; a `.` between two digits
/// (`1.5`, `15.03.2025`) is not a boundary. Whitespace-only pieces are
/// skipped and surviving clauses are trimmed while keeping their offsets
/// into the original text. Clone the iterator (or call `segment` again) to
/// restart it.
pub fn segment(text: &str) -> Clauses<'_> {
    Clauses {
        text,
        pos: 0,
        index: 0,
    }
}

#[derive(Debug, Clone)]
pub struct Clauses<'a> {
    text: &'a str,
    pos: usize,
    index: usize,
}

impl<'a> Iterator for Clauses<'a> {
    type Item = Clause<'a>;

    fn next(&mut self) -> Option<Clause<'a>> {
        while self.pos < self.text.len() {
            let piece_start = self.pos;
            let piece_end = next_boundary(self.text, piece_start).unwrap_or(self.text.len());
            // Boundary chars are all single-byte.
            self.pos = (piece_end + 1).min(self.text.len());

            let piece = &self.text[piece_start..piece_end];
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }

            let start = piece_start + (piece.len() - piece.trim_start().len());
            let clause = Clause {
                text: trimmed,
                start,
                end: start + trimmed.len(),
                index: self.index,
            };
            self.index += 1;
            return Some(clause);
        }
        None
    }
}

impl FusedIterator for Clauses<'_> {}

fn next_boundary(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    text[from..]
        .char_indices()
        .map(|(offset, ch)| (from + offset, ch))
        .find(|&(at, ch)| match ch {
            '!' | '?' | '\n' => true,
            '.' => !is_decimal_point(bytes, at),
            _ => false,
        })
        .map(|(at, _)| at)
}

fn is_decimal_point(bytes: &[u8], at: usize) -> bool {
    at > 0
        && bytes[at - 1].is_ascii_digit()
        && bytes.get(at + 1).is_some_and(|next| next.is_ascii_digit())
}

/// Character-index <-> byte-offset table for one text.
///
/// Entity spans count characters (Unicode scalar values); slicing and
/// clause bounds need bytes. `boundaries[i]` is the byte offset of character
/// `i`, with one extra entry for the end of the text.
#[derive(Debug, Clone)]
pub(crate) struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    pub(crate) fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(at, _)| at).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    pub(crate) fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Byte offset of character index `index`; `index == char_len()` maps to the end.
    pub(crate) fn to_byte(&self, index: usize) -> Option<usize> {
        self.boundaries.get(index).copied()
    }

    /// Character index of the char starting at (or containing) byte `offset`.
    pub(crate) fn to_char(&self, offset: usize) -> usize {
        match self.boundaries.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        }
    }
}

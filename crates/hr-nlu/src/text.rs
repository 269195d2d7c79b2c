//! Case and accent folding with a way back to the original text.
//!
//! Matching runs on the folded form (`"Más de"` -> `"mas de"`), but extracted
//! values are sliced from the caller's original text so names and codes keep
//! their case and accents.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case, strip diacritics. Used for vocabulary phrases at load time.
pub fn fold(text: &str) -> String {
    FoldedText::new(text).folded
}

/// Folded view of a text plus the byte offset in the original of every folded byte.
#[derive(Debug, Clone)]
pub struct FoldedText<'a> {
    original: &'a str,
    folded: String,
    origin: Vec<usize>,
}

impl<'a> FoldedText<'a> {
    pub fn new(original: &'a str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut origin = Vec::with_capacity(original.len());

        for (idx, c) in original.char_indices() {
            for lower in c.to_lowercase() {
                for decomposed in std::iter::once(lower).nfd() {
                    if is_combining_mark(decomposed) {
                        continue;
                    }
                    folded.push(decomposed);
                    origin.extend(std::iter::repeat(idx).take(decomposed.len_utf8()));
                }
            }
        }

        Self {
            original,
            folded,
            origin,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Original text covering the folded byte range `start..end`
    pub fn original_slice(&self, start: usize, end: usize) -> &'a str {
        let from = self.to_original(start);
        let to = self.to_original(end).max(from);
        &self.original[from..to]
    }

    fn to_original(&self, folded_idx: usize) -> usize {
        self.origin
            .get(folded_idx)
            .copied()
            .unwrap_or(self.original.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("Más de"), "mas de");
        assert_eq!(fold("UBICACIÓN"), "ubicacion");
        assert_eq!(fold("Países"), "paises");
        assert_eq!(fold("año"), "ano");
    }

    #[test]
    fn test_original_slice_maps_back() {
        let text = FoldedText::new("apellido es Núñez ya");
        let folded = text.as_str();
        let start = folded.find("nunez").unwrap();
        let end = start + "nunez".len();
        assert_eq!(text.original_slice(start, end), "Núñez");
        assert_eq!(text.original_slice(0, 8), "apellido");
    }

    #[test]
    fn test_original_slice_to_end() {
        let text = FoldedText::new("salario a 5000");
        let len = text.as_str().len();
        assert_eq!(text.original_slice(10, len), "5000");
        assert_eq!(text.original_slice(len, len), "");
    }
}

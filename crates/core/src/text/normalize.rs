//! Character-level normalization adaptors.
//!
//! Both adaptors are lazy: they pull one `char` at a time from the source
//! iterator and NFKC-normalize only the characters they target.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const ALEF: char = '\u{0627}';
const ALEF_ISOLATED: char = '\u{FE8D}';
const ALLAH_LIGATURE: char = '\u{FDF2}';

/// NFKC form of `c` with surrounding whitespace removed.
fn trimmed_nfkc(c: char) -> Vec<char> {
    let normalized: String = std::iter::once(c).nfkc().collect();
    normalized.trim().chars().collect()
}

/// Alphabetic and Arabic presentation forms.
fn is_presentation_form(c: char) -> bool {
    matches!(c, '\u{FB00}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}')
}

/// Combining marks, modifier letters and modifier symbols.
pub fn is_diacritic(c: char) -> bool {
    is_combining_mark(c)
        || matches!(
            c,
            '^' | '`'
                | '\u{00A8}'
                | '\u{00AF}'
                | '\u{00B4}'
                | '\u{00B8}'
                | '\u{02B0}'..='\u{02FF}'
                | '\u{0374}'..='\u{0375}'
                | '\u{0384}'..='\u{0385}'
                | '\u{1D2C}'..='\u{1D6A}'
                | '\u{1FBD}'
                | '\u{1FBF}'..='\u{1FC1}'
                | '\u{1FCD}'..='\u{1FCF}'
                | '\u{1FDD}'..='\u{1FDF}'
                | '\u{1FED}'..='\u{1FEF}'
                | '\u{1FFD}'..='\u{1FFE}'
                | '\u{309B}'..='\u{309E}'
                | '\u{A700}'..='\u{A721}'
                | '\u{FF3E}'
                | '\u{FF40}'
                | '\u{FFE3}'
        )
}

/// Iterator returned by [`presentation_forms`].
#[derive(Debug, Clone)]
pub struct PresentationForms<I> {
    source: I,
    prev: Option<char>,
    pending: std::vec::IntoIter<char>,
}

impl<I: Iterator<Item = char>> Iterator for PresentationForms<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.pending.next() {
                return Some(c);
            }
            let c = self.source.next()?;
            let prev = self.prev.replace(c);
            if !is_presentation_form(c) {
                return Some(c);
            }
            // Some fonts add an alef before U+FDF2 that the ligature already holds.
            self.pending = if c == ALLAH_LIGATURE && matches!(prev, Some(ALEF | ALEF_ISOLATED)) {
                vec!['\u{0644}', '\u{0644}', '\u{0647}'].into_iter()
            } else {
                trimmed_nfkc(c).into_iter()
            };
        }
    }
}

/// Split presentation-form ligatures into their component characters.
pub fn presentation_forms<I: IntoIterator<Item = char>>(source: I) -> PresentationForms<I::IntoIter> {
    PresentationForms {
        source: source.into_iter(),
        prev: None,
        pending: Vec::new().into_iter(),
    }
}

/// Iterator returned by [`diacritics`].
#[derive(Debug, Clone)]
pub struct Diacritics<I> {
    source: I,
    pending: std::vec::IntoIter<char>,
}

impl<I: Iterator<Item = char>> Iterator for Diacritics<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.pending.next() {
                return Some(c);
            }
            let c = self.source.next()?;
            if !is_diacritic(c) {
                return Some(c);
            }
            self.pending = trimmed_nfkc(c).into_iter();
        }
    }
}

/// Replace spacing diacritics with their combining forms.
pub fn diacritics<I: IntoIterator<Item = char>>(source: I) -> Diacritics<I::IntoIter> {
    Diacritics {
        source: source.into_iter(),
        pending: Vec::new().into_iter(),
    }
}

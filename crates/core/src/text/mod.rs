//! Text normalization capability for layers that render text on top of the
//! interpreter.
//!
//! - `bidi` - UAX#9 reordering
//! - `normalize` - presentation-form and diacritic normalization adaptors

pub mod bidi;
pub mod normalize;

pub use normalize::{Diacritics, PresentationForms, diacritics, presentation_forms};

/// Bidi reordering and character normalization.
pub trait TextNormalizer: Send + Sync {
    /// Convert a line from visual to logical order.
    fn reorder_logical(&self, text: &str, rtl_dominant: bool) -> String;

    /// Split presentation-form ligatures into their component characters.
    fn normalize_presentation_forms(&self, text: &str) -> String;

    /// Replace spacing diacritics with their combining forms.
    fn normalize_diacritics(&self, text: &str) -> String;
}

/// [`TextNormalizer`] backed by `unicode-bidi` and `unicode-normalization`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTextNormalizer;

impl TextNormalizer for UnicodeTextNormalizer {
    fn reorder_logical(&self, text: &str, rtl_dominant: bool) -> String {
        bidi::reorder_text_per_line(text, rtl_dominant)
    }

    fn normalize_presentation_forms(&self, text: &str) -> String {
        presentation_forms(text.chars()).collect()
    }

    fn normalize_diacritics(&self, text: &str) -> String {
        diacritics(text.chars()).collect()
    }
}

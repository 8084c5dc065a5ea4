//! Bidirectional text helpers.
//!
//! UAX#9 reordering of a text line from visual to logical order.

use unicode_bidi::{BidiInfo, Level};

/// Reorder text per line (split on `\n`) using UAX#9.
///
/// `rtl_dominant` sets the paragraph direction; newline structure is kept
/// as is.
pub fn reorder_text_per_line(text: &str, rtl_dominant: bool) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(text.len());
    for chunk in text.split_inclusive('\n') {
        let (line, has_newline) = match chunk.strip_suffix('\n') {
            Some(prefix) => (prefix, true),
            None => (chunk, false),
        };

        if !line.is_empty() {
            out.push_str(&reorder_single_line(line, rtl_dominant));
        }
        if has_newline {
            out.push('\n');
        }
    }
    out
}

fn reorder_single_line(line: &str, rtl_dominant: bool) -> String {
    let level = if rtl_dominant { Level::rtl() } else { Level::ltr() };
    let info = BidiInfo::new(line, Some(level));
    if info.paragraphs.is_empty() {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len());
    for para in &info.paragraphs {
        out.push_str(&info.reorder_line(para, para.range.clone()));
    }
    out
}

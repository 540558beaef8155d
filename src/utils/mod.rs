//! Utility functions and helpers.

pub mod dates;
pub mod http;

use unicode_segmentation::UnicodeSegmentation;

/// Cut `text` to at most `width` graphemes, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(1);
    let mut out: String = graphemes[..keep].concat();
    out.push('…');
    out
}

/// Pad `text` with spaces to `width` graphemes.
pub fn pad(text: &str, width: usize) -> String {
    let len = text.graphemes(true).count();
    let mut out = text.to_string();
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(len)));
    out
}

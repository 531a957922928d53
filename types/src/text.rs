//! Small pure text helpers.

/// Characters that render as nothing (or reorder surrounding text) but still
/// change the meaning of a path or command.
///
/// Covers bidi controls, zero-width characters, the BOM, soft hyphen,
/// variation selectors, and Unicode tag characters.
#[must_use]
pub fn is_invisible_char(c: char) -> bool {
    matches!(
        c,
        '\u{00ad}'
            | '\u{034f}'
            | '\u{061c}'
            | '\u{115f}'
            | '\u{1160}'
            | '\u{180e}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{3164}'
            | '\u{fe00}'..='\u{fe0f}'
            | '\u{feff}'
            | '\u{e0000}'..='\u{e007f}'
            | '\u{e0100}'..='\u{e01ef}'
    )
}

/// Expand each tab into two spaces, the width used by rendered diffs.
#[must_use]
pub fn expand_tabs(line: &str) -> String {
    line.replace('\t', "  ")
}

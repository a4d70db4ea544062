//! Log sanitization for free-text user input.
//!
//! Item names arrive verbatim from chat and may contain newlines or other
//! control characters; everything logged goes through [`escape_log`] so each
//! log entry stays a single line.

/// Item names are short; anything longer is truncated with an ellipsis.
const MAX_PREVIEW: usize = 120;

/// Render a string safe for single-line logging. Control characters become
/// visible escapes (`\n`, `\r`, `\t`, `\xNN`) and backslashes are doubled.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_PREVIEW) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
